//! Versioned cache generations for the hx edge request router.
//!
//! This crate provides:
//! - `CacheStorage` - Persisted, named cache generations (the platform seam)
//! - `StoredResponse` - A response as it sits in a generation
//! - `CacheManifest` - Resources cached at install time
//! - `CacheManager` - Install, activate (prune), lookup and priming
//!
//! # Example
//!
//! ```rust,ignore
//! let manager = CacheManager::new(storage, network, scope, "cs-htmx");
//!
//! // Install: fetch and store the whole manifest, all or nothing
//! manager.install(&manifest).await?;
//!
//! // Activate: drop every generation except the current one
//! let pruned = manager.activate().await?;
//! ```

mod entry;
mod error;
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod kv;
mod manager;
mod manifest;
mod storage;

#[cfg(target_arch = "wasm32")]
mod spin_kv;

pub use entry::*;
pub use error::*;
pub use manager::*;
pub use manifest::*;
pub use storage::*;

#[cfg(target_arch = "wasm32")]
pub use spin_kv::SpinKvCacheStorage;
