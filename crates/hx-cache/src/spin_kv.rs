//! Cache storage backed by Spin's Key-Value Store.
//!
//! Layout: the key `hx:generations` holds the JSON list of generation names;
//! each generation keeps a JSON list of its URLs under `hx:gen:<name>` and one
//! entry per URL under `hx:gen:<name>:<url>`.

use async_trait::async_trait;
use spin_sdk::key_value::Store;

use crate::entry::StoredResponse;
use crate::error::{CacheError, CacheResult};
use crate::kv::{set_all, KeyValue};
use crate::storage::CacheStorage;

const GENERATIONS_KEY: &str = "hx:generations";

/// Cache generations persisted in a Spin key-value store.
pub struct SpinKvCacheStorage {
    store: Store,
}

impl SpinKvCacheStorage {
    /// Open the default Key-Value store.
    pub fn open_default() -> CacheResult<Self> {
        let store = Store::open_default().map_err(|e| CacheError::Storage(e.to_string()))?;
        Ok(Self { store })
    }

    fn read_list(&self, key: &str) -> CacheResult<Vec<String>> {
        match KeyValue::get(&self.store, key)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_list(&self, key: &str, list: &[String]) -> CacheResult<()> {
        let bytes = serde_json::to_vec(list)?;
        KeyValue::set(&self.store, key, &bytes)
    }

    fn index_key(generation: &str) -> String {
        format!("hx:gen:{}", generation)
    }

    fn entry_key(generation: &str, url: &str) -> String {
        format!("hx:gen:{}:{}", generation, url)
    }

    fn ensure_generation(&self, generation: &str) -> CacheResult<()> {
        let mut generations = self.read_list(GENERATIONS_KEY)?;
        if !generations.iter().any(|g| g == generation) {
            generations.push(generation.to_string());
            self.write_list(GENERATIONS_KEY, &generations)?;
        }
        Ok(())
    }
}

impl KeyValue for Store {
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        Store::get(self, key).map_err(|e| CacheError::Storage(e.to_string()))
    }

    fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        Store::set(self, key, value).map_err(|e| CacheError::Storage(e.to_string()))
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        Store::delete(self, key).map_err(|e| CacheError::Storage(e.to_string()))
    }
}

#[async_trait(?Send)]
impl CacheStorage for SpinKvCacheStorage {
    async fn generations(&self) -> CacheResult<Vec<String>> {
        self.read_list(GENERATIONS_KEY)
    }

    async fn open(&self, generation: &str) -> CacheResult<()> {
        self.ensure_generation(generation)
    }

    async fn delete_generation(&self, generation: &str) -> CacheResult<bool> {
        let mut generations = self.read_list(GENERATIONS_KEY)?;
        if !generations.iter().any(|g| g == generation) {
            return Ok(false);
        }

        for url in self.read_list(&Self::index_key(generation))? {
            self.store
                .delete(&Self::entry_key(generation, &url))
                .map_err(|e| CacheError::Storage(e.to_string()))?;
        }
        self.store
            .delete(&Self::index_key(generation))
            .map_err(|e| CacheError::Storage(e.to_string()))?;

        generations.retain(|g| g != generation);
        self.write_list(GENERATIONS_KEY, &generations)?;
        Ok(true)
    }

    async fn get(&self, generation: &str, url: &str) -> CacheResult<Option<StoredResponse>> {
        match self.store.get(&Self::entry_key(generation, url)) {
            Ok(Some(bytes)) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(CacheError::Storage(e.to_string())),
        }
    }

    async fn put(&self, generation: &str, url: &str, entry: StoredResponse) -> CacheResult<()> {
        self.put_all(generation, vec![(url.to_string(), entry)]).await
    }

    async fn put_all(
        &self,
        generation: &str,
        entries: Vec<(String, StoredResponse)>,
    ) -> CacheResult<()> {
        // Entries are written all or nothing before they are published in
        // the generation index.
        let pairs = entries
            .iter()
            .map(|(url, entry)| Ok((Self::entry_key(generation, url), serde_json::to_vec(entry)?)))
            .collect::<CacheResult<Vec<_>>>()?;
        set_all(&self.store, &pairs)?;

        self.ensure_generation(generation)?;
        let mut urls = self.read_list(&Self::index_key(generation))?;
        for (url, _) in entries {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        self.write_list(&Self::index_key(generation), &urls)
    }

    async fn urls(&self, generation: &str) -> CacheResult<Vec<String>> {
        let mut urls = self.read_list(&Self::index_key(generation))?;
        urls.sort();
        Ok(urls)
    }
}
