//! Interceptor error types.

use hx_cache::CacheError;
use hx_core::ConfigError;
use hx_fetch::FetchError;
use hx_rpc::RpcError;
use hx_template::TemplateError;
use thiserror::Error;

/// Errors raised while handling worker events.
#[derive(Error, Debug)]
pub enum InterceptError {
    #[error("no route for {0}")]
    RouteNotFound(String),

    /// The request could not be turned into RPC parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl InterceptError {
    /// HTTP status a routed request answers with for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::RouteNotFound(_) => 404,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(InterceptError::RouteNotFound("/x".into()).status(), 404);
        assert_eq!(InterceptError::BadRequest("multipart".into()).status(), 500);
        assert_eq!(
            InterceptError::Rpc(RpcError::Decode("eof".into())).status(),
            500
        );
        assert_eq!(
            InterceptError::Template(TemplateError::PartialCycle { chain: vec![] }).status(),
            500
        );
    }
}
