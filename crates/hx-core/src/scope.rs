//! Worker scope: the origin and base path every relative resource resolves against.

use url::Url;

use crate::config::ConfigError;

/// The location a worker is served from.
///
/// `base_path` always starts and ends with `/`, mirroring the directory of the
/// script that registered the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerScope {
    base: Url,
}

impl WorkerScope {
    /// Create a scope from an origin (`https://host[:port]`) and a base path.
    pub fn new(origin: &str, base_path: &str) -> Result<Self, ConfigError> {
        let origin = Url::parse(origin).map_err(|e| ConfigError::InvalidOrigin {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        if origin.host_str().is_none() {
            return Err(ConfigError::InvalidOrigin {
                origin: origin.to_string(),
                reason: "origin has no host".to_string(),
            });
        }

        let mut base = origin;
        base.set_path(&normalize_base_path(base_path));
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base })
    }

    /// Base path of the worker, e.g. `/app/`.
    pub fn base_path(&self) -> &str {
        self.base.path()
    }

    /// Base URL of the worker (origin + base path).
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve a relative or absolute resource path against the scope.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    /// Build the absolute route key for a declared route path.
    ///
    /// A leading `/` on the declared path is dropped so `tasks` and `/tasks`
    /// both land on `<base_path>tasks`.
    pub fn route_key(&self, declared: &str) -> String {
        format!("{}{}", self.base_path(), declared.trim_start_matches('/'))
    }
}

/// Normalize a base path so it starts and ends with `/`.
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
