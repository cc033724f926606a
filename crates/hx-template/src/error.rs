//! Template error types.

use thiserror::Error;

/// Errors that can occur while loading or rendering templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The source could not be read from the cache or the network.
    #[error("failed to load {path}: {reason}")]
    Fetch { path: String, reason: String },

    /// The network answered with a non-success status.
    #[error("{path} answered with status {status}")]
    Status { path: String, status: u16 },

    #[error("failed to compile {name}: {reason}")]
    Compile { name: String, reason: String },

    #[error("failed to render {name}: {reason}")]
    Render { name: String, reason: String },

    /// A partial includes itself, directly or through other partials.
    #[error("partial inclusion cycle: {}", chain.join(" -> "))]
    PartialCycle { chain: Vec<String> },
}

pub type TemplateResult<T> = Result<T, TemplateError>;
