//! Content-addressed blob storage for histree.
//!
//! Every committed object state is stored as an immutable blob keyed by the
//! domain-separated BLAKE3 hash of its canonical bytes. The store is a pure
//! key-value map with no history semantics: those live in `histree-graph`.
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. `put` is idempotent: storing identical bytes twice is a no-op that
//!    returns the same hash.
//! 3. There are no update or delete operations -- the store is append-only
//!    for its lifetime.
//! 4. A single store may be shared by many scopes, so `put`/`get` must
//!    tolerate concurrent callers.
//! 5. All errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;
