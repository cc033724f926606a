//! Cache generation management: install, activate, lookup.

use std::sync::Arc;

use futures::future::join_all;
use hx_core::{HttpResponse, WorkerScope};
use hx_fetch::{get_request, Network};
use url::Url;

use crate::entry::StoredResponse;
use crate::error::{CacheError, CacheResult};
use crate::manifest::CacheManifest;
use crate::storage::CacheStorage;

/// Key of the readiness marker inside the current generation.
///
/// Request URLs are always absolute, so this never collides with a real entry.
pub const READY_MARKER: &str = "hx:ready";

/// Owns the current cache generation.
pub struct CacheManager {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    scope: WorkerScope,
    current: String,
}

impl CacheManager {
    /// Create a manager for the generation named `current`.
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        scope: WorkerScope,
        current: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            network,
            scope,
            current: current.into(),
        }
    }

    /// Name of the current generation.
    pub fn current_generation(&self) -> &str {
        &self.current
    }

    /// The underlying storage.
    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Resolve a manifest path to an absolute URL.
    pub fn resolve(&self, path: &str) -> CacheResult<Url> {
        self.scope.resolve(path).map_err(|e| CacheError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Store every manifest resource in the current generation.
    ///
    /// All resources are fetched first; if any fetch fails or answers with a
    /// non-success status nothing is written and the install fails.
    pub async fn install(&self, manifest: &CacheManifest) -> CacheResult<usize> {
        self.storage.open(&self.current).await?;

        let fetches = manifest.paths().iter().map(|path| self.fetch_entry(path));
        let entries = join_all(fetches)
            .await
            .into_iter()
            .collect::<CacheResult<Vec<_>>>()?;

        let count = entries.len();
        self.storage.put_all(&self.current, entries).await?;

        tracing::info!(
            generation = %self.current,
            resources = count,
            "cache generation installed"
        );
        Ok(count)
    }

    /// Delete every generation except the current one.
    ///
    /// Returns the names of the deleted generations.
    pub async fn activate(&self) -> CacheResult<Vec<String>> {
        let stale: Vec<String> = self
            .storage
            .generations()
            .await?
            .into_iter()
            .filter(|name| name != &self.current)
            .collect();

        let deletions = stale.iter().map(|name| self.storage.delete_generation(name));
        for result in join_all(deletions).await {
            result?;
        }

        tracing::info!(
            generation = %self.current,
            pruned = stale.len(),
            "cache generation activated"
        );
        Ok(stale)
    }

    /// Look up a stored response for a request URL in the current generation.
    pub async fn match_url(&self, url: &Url) -> CacheResult<Option<HttpResponse>> {
        match self.storage.get(&self.current, &cache_key(url)).await? {
            Some(entry) => Ok(Some(entry.to_response()?)),
            None => Ok(None),
        }
    }

    /// Look up a stored entry by manifest-relative path.
    pub async fn match_path(&self, path: &str) -> CacheResult<Option<StoredResponse>> {
        let url = self.resolve(path)?;
        self.storage.get(&self.current, &cache_key(&url)).await
    }

    /// Fetch one resource and store it in the current generation.
    pub async fn add(&self, path: &str) -> CacheResult<()> {
        let (key, entry) = self.fetch_entry(path).await?;
        self.storage.put(&self.current, &key, entry).await
    }

    /// Whether install and activate have completed for the current generation.
    pub async fn is_ready(&self) -> CacheResult<bool> {
        Ok(self.storage.get(&self.current, READY_MARKER).await?.is_some())
    }

    /// Record that install and activate completed for the current generation.
    pub async fn mark_ready(&self) -> CacheResult<()> {
        self.storage
            .put(&self.current, READY_MARKER, StoredResponse::new(204, b""))
            .await
    }

    async fn fetch_entry(&self, path: &str) -> CacheResult<(String, StoredResponse)> {
        let url = self.resolve(path)?;
        let request = get_request(&url).map_err(|e| CacheError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .network
            .fetch(request)
            .await
            .map_err(|e| CacheError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(CacheError::BadStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok((cache_key(&url), StoredResponse::from_response(&response)))
    }
}

/// Storage key for a request URL: the absolute URL without its fragment.
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}
