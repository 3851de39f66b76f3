use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::ident::{EntityId, TypeTag};

/// A (type, entity, hash) triple identifying one object's state at one point
/// in history.
///
/// A `ContentRef` says: "entity E of type T, in the state whose canonical
/// bytes hash to H". Refs are immutable once created; commit nodes carry the
/// set of refs that changed relative to their parent.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentRef {
    /// Tag of the registered domain type.
    pub tag: TypeTag,
    /// The tracked object this state belongs to.
    pub entity: EntityId,
    /// Content address of the serialized state.
    pub hash: ContentHash,
}

impl ContentRef {
    /// Create a new content ref.
    pub fn new(tag: TypeTag, entity: EntityId, hash: ContentHash) -> Self {
        Self { tag, entity, hash }
    }

    /// Returns `true` if this ref is for the given (type, entity) pair.
    pub fn is_for(&self, tag: &TypeTag, entity: &EntityId) -> bool {
        &self.tag == tag && &self.entity == entity
    }
}

impl fmt::Debug for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContentRef({}/{}@{})",
            self.tag,
            self.entity,
            self.hash.short_hex()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ref(tag: &str, entity: &str, byte: u8) -> ContentRef {
        ContentRef::new(
            TypeTag::new(tag),
            EntityId::new(entity),
            ContentHash::from_hash([byte; 32]),
        )
    }

    #[test]
    fn is_for_matches_tag_and_entity() {
        let r = make_ref("counter", "c1", 1);
        assert!(r.is_for(&"counter".into(), &"c1".into()));
        assert!(!r.is_for(&"counter".into(), &"c2".into()));
        assert!(!r.is_for(&"player".into(), &"c1".into()));
    }

    #[test]
    fn equality_includes_hash() {
        assert_eq!(make_ref("counter", "c1", 1), make_ref("counter", "c1", 1));
        assert_ne!(make_ref("counter", "c1", 1), make_ref("counter", "c1", 2));
    }

    #[test]
    fn serde_roundtrip() {
        let r = make_ref("counter", "c1", 9);
        let json = serde_json::to_string(&r).unwrap();
        let parsed: ContentRef = serde_json::from_str(&json).unwrap();
        assert_eq!(r, parsed);
    }

    #[test]
    fn debug_is_compact() {
        let r = make_ref("counter", "c1", 0xab);
        assert_eq!(format!("{r:?}"), "ContentRef(counter/c1@abababab)");
    }
}
