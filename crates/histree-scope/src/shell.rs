//! The mutable per-object handle feature modules read and update through.

use tracing::debug;

use histree_canon::ContentHasher;
use histree_types::{ContentHash, ContentRef, EntityId, NodeId, TypeTag};

use crate::error::ScopeResult;
use crate::registry::Versioned;
use crate::scope::Scope;

/// A live view of one tracked object, bound to its scope.
///
/// A shell is a thin wrapper: the scope borrow, the entity id, and a cached
/// immutable value with its content hash. It is re-derived from the graph and
/// store whenever the apex changes -- never incrementally patched -- so it is
/// ephemeral by design and holds no history of its own.
pub struct Shell<'a, T: Versioned> {
    scope: &'a mut Scope,
    entity: EntityId,
    value: T,
    hash: ContentHash,
}

impl<'a, T: Versioned> Shell<'a, T> {
    pub(crate) fn new(scope: &'a mut Scope, entity: EntityId, value: T, hash: ContentHash) -> Self {
        Self {
            scope,
            entity,
            value,
            hash,
        }
    }

    /// Tag of the tracked type.
    pub fn tag(&self) -> TypeTag {
        T::tag()
    }

    /// The tracked entity's id.
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// The cached materialized value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Content hash of the cached value.
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Consume the shell, keeping the materialized value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Stage a new immutable value and commit it.
    ///
    /// Computes `f(current)`, serializes and hashes it, and -- unless the hash
    /// matches the current state, in which case no node is created and
    /// `Ok(None)` is returned -- stores the blob, commits a single-ref node as
    /// a child of the apex, and advances the apex. The shell's cached value
    /// is refreshed either way.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) -> ScopeResult<Option<NodeId>> {
        let next = f(&self.value);
        let bytes = self.scope.registry().encode(&next)?;
        let hash = ContentHasher::BLOB.hash(&bytes);

        if hash == self.hash {
            debug!(entity = %self.entity, "update produced identical state; skipping commit");
            self.value = next;
            return Ok(None);
        }

        self.scope.store().put(&bytes)?;
        let node = self
            .scope
            .commit_changes(vec![ContentRef::new(T::tag(), self.entity.clone(), hash)])?;
        self.value = next;
        self.hash = hash;
        Ok(Some(node))
    }
}

impl<T: Versioned + std::fmt::Debug> std::fmt::Debug for Shell<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("tag", &T::TAG)
            .field("entity", &self.entity)
            .field("value", &self.value)
            .finish()
    }
}
