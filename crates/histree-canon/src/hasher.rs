use histree_types::ContentHash;
use serde::Serialize;

use crate::canon::to_canonical_bytes;
use crate::error::CanonResult;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a blob and any other object kind with identical bytes
/// produce different hashes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for object-state blobs.
    pub const BLOB: Self = Self {
        domain: "histree-blob-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Canonically serialize a value, then hash the bytes.
    pub fn hash_canonical<T: Serialize>(&self, value: &T) -> CanonResult<ContentHash> {
        let bytes = to_canonical_bytes(value)?;
        Ok(self.hash(&bytes))
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &ContentHash) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        let h1 = ContentHasher::BLOB.hash(data);
        let h2 = ContentHasher::BLOB.hash(data);
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        let blob = ContentHasher::BLOB.hash(data);
        let other = ContentHasher::new("histree-test-v1").hash(data);
        assert_ne!(blob, other);
    }

    #[test]
    fn domain_hash_differs_from_raw_hash() {
        let data = b"content";
        assert_ne!(ContentHasher::BLOB.hash(data), ContentHash::of(data));
    }

    #[test]
    fn verify_correct_and_tampered_data() {
        let data = b"test data";
        let h = ContentHasher::BLOB.hash(data);
        assert!(ContentHasher::BLOB.verify(data, &h));
        assert!(!ContentHasher::BLOB.verify(b"tampered", &h));
    }

    #[test]
    fn hash_canonical_ignores_insertion_order() {
        let mut forward = HashMap::new();
        forward.insert("a".to_string(), 1i64);
        forward.insert("b".to_string(), 2);
        let mut backward = HashMap::new();
        backward.insert("b".to_string(), 2i64);
        backward.insert("a".to_string(), 1);

        let h1 = ContentHasher::BLOB.hash_canonical(&forward).unwrap();
        let h2 = ContentHasher::BLOB.hash_canonical(&backward).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn hash_canonical_distinguishes_values() {
        let h1 = ContentHasher::BLOB.hash_canonical(&vec![1, 2, 3]).unwrap();
        let h2 = ContentHasher::BLOB.hash_canonical(&vec![1, 2, 4]).unwrap();
        assert_ne!(h1, h2);
    }
}
