//! The hx request interceptor.
//!
//! One [`Interceptor`] is built per worker instance. It receives the host's
//! lifecycle and fetch events:
//!
//! - `Install` stores the cache manifest in the current generation
//! - `Activate` deletes every other generation
//! - `Fetch` with `HX-Request: true` goes through the route table, the RPC
//!   client and the template engine
//! - any other `Fetch` is served from the cache, falling back to the network
//!
//! Nothing learned while handling requests is written back to the cache.

mod error;
mod interceptor;
mod params;
mod response;

pub use error::*;
pub use interceptor::*;
pub use params::*;
pub use response::*;
