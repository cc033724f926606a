//! Byte-level key-value access for key-value backed storages.

use crate::error::CacheResult;

/// The operations a key-value backend must offer.
pub(crate) trait KeyValue {
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> CacheResult<()>;
    fn delete(&self, key: &str) -> CacheResult<()>;
}

/// Write every pair or none of them.
///
/// The store has no transactions. Each key's previous value is read before it
/// is overwritten; on failure every key written so far gets its previous
/// value back (or is deleted if it had none).
pub(crate) fn set_all<S: KeyValue + ?Sized>(store: &S, pairs: &[(String, Vec<u8>)]) -> CacheResult<()> {
    let mut previous: Vec<(&str, Option<Vec<u8>>)> = Vec::with_capacity(pairs.len());

    for (key, value) in pairs {
        let result = store.get(key).and_then(|old| {
            previous.push((key.as_str(), old));
            store.set(key, value)
        });

        if let Err(e) = result {
            restore(store, &previous);
            return Err(e);
        }
    }

    Ok(())
}

fn restore<S: KeyValue + ?Sized>(store: &S, previous: &[(&str, Option<Vec<u8>>)]) {
    for (key, old) in previous.iter().rev() {
        let result = match old {
            Some(bytes) => store.set(key, bytes),
            None => store.delete(key),
        };
        if let Err(e) = result {
            tracing::error!(key = *key, error = %e, "failed to roll back cache entry");
        }
    }
}
