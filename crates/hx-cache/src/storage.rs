//! Cache storage backends.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::entry::StoredResponse;
use crate::error::{CacheError, CacheResult};

/// Persisted storage of named cache generations.
///
/// A generation maps absolute request URLs to stored responses. Writing to a
/// generation that does not exist yet creates it.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait CacheStorage: Send + Sync {
    /// Names of all existing generations, oldest first.
    async fn generations(&self) -> CacheResult<Vec<String>>;

    /// Create a generation if it does not exist.
    async fn open(&self, generation: &str) -> CacheResult<()>;

    /// Delete a generation. Returns whether it existed.
    async fn delete_generation(&self, generation: &str) -> CacheResult<bool>;

    /// Look up an entry.
    async fn get(&self, generation: &str, url: &str) -> CacheResult<Option<StoredResponse>>;

    /// Store one entry, replacing any previous entry for the URL.
    async fn put(&self, generation: &str, url: &str, entry: StoredResponse) -> CacheResult<()>;

    /// Store several entries; either all are written or none are.
    async fn put_all(
        &self,
        generation: &str,
        entries: Vec<(String, StoredResponse)>,
    ) -> CacheResult<()>;

    /// URLs stored in a generation.
    async fn urls(&self, generation: &str) -> CacheResult<Vec<String>>;
}

type Generation = HashMap<String, StoredResponse>;

/// In-memory storage (for development/testing and native hosts).
#[derive(Default, Clone)]
pub struct InMemoryCacheStorage {
    generations: Arc<RwLock<Vec<(String, Generation)>>>,
}

impl InMemoryCacheStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> CacheError {
        CacheError::Storage(e.to_string())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl CacheStorage for InMemoryCacheStorage {
    async fn generations(&self) -> CacheResult<Vec<String>> {
        let generations = self.generations.read().map_err(Self::poisoned)?;
        Ok(generations.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn open(&self, generation: &str) -> CacheResult<()> {
        let mut generations = self.generations.write().map_err(Self::poisoned)?;
        if !generations.iter().any(|(name, _)| name == generation) {
            generations.push((generation.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn delete_generation(&self, generation: &str) -> CacheResult<bool> {
        let mut generations = self.generations.write().map_err(Self::poisoned)?;
        let before = generations.len();
        generations.retain(|(name, _)| name != generation);
        Ok(generations.len() != before)
    }

    async fn get(&self, generation: &str, url: &str) -> CacheResult<Option<StoredResponse>> {
        let generations = self.generations.read().map_err(Self::poisoned)?;
        Ok(generations
            .iter()
            .find(|(name, _)| name == generation)
            .and_then(|(_, entries)| entries.get(url).cloned()))
    }

    async fn put(&self, generation: &str, url: &str, entry: StoredResponse) -> CacheResult<()> {
        self.put_all(generation, vec![(url.to_string(), entry)]).await
    }

    async fn put_all(
        &self,
        generation: &str,
        entries: Vec<(String, StoredResponse)>,
    ) -> CacheResult<()> {
        let mut generations = self.generations.write().map_err(Self::poisoned)?;
        let index = match generations.iter().position(|(name, _)| name == generation) {
            Some(index) => index,
            None => {
                generations.push((generation.to_string(), HashMap::new()));
                generations.len() - 1
            }
        };
        generations[index].1.extend(entries);
        Ok(())
    }

    async fn urls(&self, generation: &str) -> CacheResult<Vec<String>> {
        let generations = self.generations.read().map_err(Self::poisoned)?;
        let mut urls: Vec<String> = generations
            .iter()
            .find(|(name, _)| name == generation)
            .map(|(_, entries)| entries.keys().cloned().collect())
            .unwrap_or_default();
        urls.sort();
        Ok(urls)
    }
}
