//! JSON-RPC 1.1 for the hx edge request router.
//!
//! - `RpcRequest` / `RpcResponse` - The wire envelope
//! - `RpcClient` - Calls a procedure and folds transport and protocol
//!   failures into [`RpcError`]
//! - `RpcDispatcher` - Backend side: resolves methods through the same route
//!   manifest and calls handlers registered at startup
//!
//! A `null` result is a valid answer, not an error.

mod client;
mod envelope;
mod error;
mod server;

pub use client::*;
pub use envelope::*;
pub use error::*;
pub use server::*;
