//! Core abstractions for the hx edge request router.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `WorkerConfig` - Deployment configuration (TOML or JSON)
//! - `WorkerScope` - Origin + base path used to resolve relative resources
//! - `RequestId` / `RequestKind` - Per-request context
//! - `WorkerPhase` / `TimingContext` - Lifecycle and timing tracking

mod config;
mod context;
mod lifecycle;
mod scope;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
pub use scope::*;
