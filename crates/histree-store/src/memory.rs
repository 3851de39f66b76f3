use std::collections::HashMap;
use std::sync::RwLock;

use histree_canon::ContentHasher;
use histree_types::ContentHash;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// In-memory, HashMap-based content store.
///
/// All blobs are held in memory behind a `RwLock` so that several scopes can
/// share one store (co-located blobs from independent histories still dedup).
/// Blobs are cloned on read.
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<ContentHash, Vec<u8>>>,
}

impl InMemoryContentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .map(|map| map.values().map(|b| b.len() as u64).sum())
            .unwrap_or(0)
    }

    /// Return a sorted list of all blob hashes in the store.
    pub fn all_hashes(&self) -> Vec<ContentHash> {
        let mut hashes: Vec<ContentHash> = self
            .blobs
            .read()
            .map(|map| map.keys().copied().collect())
            .unwrap_or_default();
        hashes.sort();
        hashes
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put(&self, bytes: &[u8]) -> StoreResult<ContentHash> {
        let hash = ContentHasher::BLOB.hash(bytes);
        let mut map = self
            .blobs
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        // Insert-if-absent: content-addressing guarantees the same hash
        // always maps to the same bytes.
        if map.get(&hash).is_none() {
            debug!(blob = %hash.short_hex(), size = bytes.len(), "stored blob");
            map.insert(hash, bytes.to_vec());
        }
        Ok(hash)
    }

    fn get(&self, hash: &ContentHash) -> StoreResult<Option<Vec<u8>>> {
        let map = self
            .blobs
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(map.get(hash).cloned())
    }

    fn contains(&self, hash: &ContentHash) -> StoreResult<bool> {
        let map = self
            .blobs
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(map.contains_key(hash))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
