//! Canonical serialization and content hashing.
//!
//! Two values that are semantically identical must hash identically, no
//! matter what order their maps were built in. This crate provides the two
//! halves of that contract:
//!
//! - [`to_canonical_bytes`] / [`from_canonical_bytes`] -- serde round-trip
//!   through a canonical JSON form in which every object is emitted in
//!   key-sorted order
//! - [`ContentHasher`] -- domain-separated BLAKE3 over those bytes
//!
//! Hashes are used for deduplication and addressing only; collision handling
//! and cryptographic tamper-proofing are out of scope.

pub mod canon;
pub mod error;
pub mod hasher;

pub use canon::{from_canonical_bytes, to_canonical_bytes};
pub use error::{CanonError, CanonResult};
pub use hasher::ContentHasher;
