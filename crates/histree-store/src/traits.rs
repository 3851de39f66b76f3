use histree_types::ContentHash;

use crate::error::StoreResult;

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - Blobs are immutable once written; the same bytes always map to the
///   same hash.
/// - `put` has insert-if-absent semantics and is safe to call concurrently
///   from multiple scopes sharing one store.
/// - Concurrent reads are always safe (blobs are immutable).
/// - The store never interprets blob contents -- it is a pure key-value store.
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their content hash.
    ///
    /// If a blob with the same hash already exists, this is a no-op
    /// (idempotent) and the existing hash is returned.
    fn put(&self, bytes: &[u8]) -> StoreResult<ContentHash>;

    /// Read a blob by its content hash.
    ///
    /// Returns `Ok(None)` if the blob does not exist.
    fn get(&self, hash: &ContentHash) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether a blob exists in the store.
    fn contains(&self, hash: &ContentHash) -> StoreResult<bool>;

    /// Store multiple blobs and return their hashes.
    ///
    /// Default implementation calls `put()` for each blob. Backends may
    /// override for better performance (e.g., a single lock acquisition).
    fn put_batch(&self, blobs: &[&[u8]]) -> StoreResult<Vec<ContentHash>> {
        blobs.iter().map(|bytes| self.put(bytes)).collect()
    }

    /// Read multiple blobs in a batch.
    ///
    /// Default implementation calls `get()` for each hash.
    fn get_batch(&self, hashes: &[ContentHash]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        hashes.iter().map(|hash| self.get(hash)).collect()
    }
}
