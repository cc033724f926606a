//! Observability infrastructure for the hx edge request router.
//!
//! This crate provides:
//! - `StructuredLogger` - Request-scoped structured logging over `tracing`
//! - `init_tracing` - Subscriber setup for binaries and components

mod logging;
mod subscriber;

pub use logging::*;
pub use subscriber::*;

// Re-export RequestId from hx-core for convenience
pub use hx_core::RequestId;
