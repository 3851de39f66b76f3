//! Scope orchestration for histree -- the surface feature modules depend on.
//!
//! A [`Scope`] is one isolated instance of the versioned object graph: every
//! mutation of a tracked object becomes an immutable, content-addressed
//! snapshot in a commit tree, with full undo/redo, time-travel to any past
//! node, and automatic forking when an edit follows an undo.
//!
//! The intended flow:
//!
//! 1. Implement [`Versioned`] for each domain type and register it once in a
//!    [`Registry`] at module load.
//! 2. Create a [`Scope`] (optionally seeded via [`Seed`]) over a shared
//!    [`ContentStore`].
//! 3. Read and mutate objects through [`Shell`]s (`scope.shell::<T>(id)`),
//!    or land multi-object actions atomically with a [`Batch`].
//! 4. Navigate with [`Scope::move_back`], [`Scope::move_forward`],
//!    [`Scope::move_to`]; resolve ambiguous redos with
//!    [`Scope::fork_choices`].
//! 5. Persist with [`Scope::to_document`] / [`Scope::from_document`] if the
//!    scope must outlive its session.
//!
//! Scopes are single-writer; the content store tolerates sharing across
//! scopes so blobs from independent histories still dedup.

pub mod batch;
pub mod document;
pub mod error;
pub mod registry;
pub mod scope;
pub mod seed;
pub mod shell;

pub use batch::Batch;
pub use document::{NodeRecord, ScopeDocument};
pub use error::{ScopeError, ScopeResult};
pub use registry::{Registry, TypeCodec, Versioned};
pub use scope::{ForkChoice, HistoryEntry, Scope};
pub use seed::Seed;
pub use shell::Shell;

// The foundation types and store seam feature modules need, re-exported so
// they can depend on this crate alone.
pub use histree_store::{ContentStore, InMemoryContentStore};
pub use histree_types::{
    ContentHash, ContentRef, EntityId, NodeId, ScopeId, Stamp, TypeTag,
};
