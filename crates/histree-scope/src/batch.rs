//! Atomic multi-object commits.
//!
//! A single [`Shell::update`] always produces a single-ref node. When one
//! user action touches several objects, a [`Batch`] stages all of them and
//! [`Scope::commit_batch`] lands them as one node with one ref per object --
//! so a single undo reverts the whole action.
//!
//! [`Shell::update`]: crate::Shell::update
//! [`Scope::commit_batch`]: crate::Scope::commit_batch

use std::collections::BTreeMap;

use histree_types::ident::validate_non_empty;
use histree_types::{EntityId, TypeTag};

use crate::error::{ScopeError, ScopeResult};
use crate::registry::Versioned;
use crate::scope::Scope;

/// A set of staged object states waiting to be committed as one node.
///
/// Staging reads the committed state at the scope's apex; staging the same
/// (type, entity) twice keeps the last write. The batch holds canonical
/// bytes, so it stays valid however many types it spans.
#[derive(Default)]
pub struct Batch {
    staged: BTreeMap<(TypeTag, EntityId), Vec<u8>>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged objects.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Stage a transformation of an existing object.
    ///
    /// Fails with [`ScopeError::ObjectMissing`] if the object does not exist
    /// at the scope's apex.
    pub fn stage<T: Versioned>(
        &mut self,
        scope: &Scope,
        entity: impl Into<EntityId>,
        f: impl FnOnce(&T) -> T,
    ) -> ScopeResult<&mut Self> {
        let entity = entity.into();
        let current: T = scope
            .get(entity.clone())?
            .ok_or_else(|| ScopeError::ObjectMissing {
                tag: T::tag(),
                entity: entity.clone(),
            })?;
        let next = f(&current);
        self.stage_value(scope, entity, &next)
    }

    /// Stage an explicit value, introducing the object if it does not exist.
    pub fn stage_value<T: Versioned>(
        &mut self,
        scope: &Scope,
        entity: impl Into<EntityId>,
        value: &T,
    ) -> ScopeResult<&mut Self> {
        let entity = entity.into();
        validate_non_empty("entity", entity.as_str())?;
        let bytes = scope.registry().encode(value)?;
        self.staged.insert((T::tag(), entity), bytes);
        Ok(self)
    }

    pub(crate) fn into_staged(self) -> BTreeMap<(TypeTag, EntityId), Vec<u8>> {
        self.staged
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch").field("staged", &self.len()).finish()
    }
}
