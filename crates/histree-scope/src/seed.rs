use histree_canon::to_canonical_bytes;
use histree_types::ident::validate_non_empty;
use histree_types::{EntityId, TypeTag};

use crate::error::ScopeResult;
use crate::registry::Versioned;

/// An initial object for scope creation.
///
/// Seeds are serialized eagerly so a heterogeneous list of them can be passed
/// to [`Scope::create`]; the scope verifies each tag is registered before
/// accepting the seed.
///
/// [`Scope::create`]: crate::Scope::create
pub struct Seed {
    tag: TypeTag,
    entity: EntityId,
    bytes: Vec<u8>,
}

impl Seed {
    /// Create a seed for one tracked object.
    pub fn of<T: Versioned>(entity: impl Into<EntityId>, value: &T) -> ScopeResult<Self> {
        let entity = entity.into();
        validate_non_empty("entity", entity.as_str())?;
        Ok(Self {
            tag: T::tag(),
            entity,
            bytes: to_canonical_bytes(value)?,
        })
    }

    /// Tag of the seeded type.
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// The seeded entity's id.
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// The canonical bytes of the initial state.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seed({}/{}, {} bytes)", self.tag, self.entity, self.bytes.len())
    }
}
