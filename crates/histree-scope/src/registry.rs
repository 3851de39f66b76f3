//! The type registry: how the graph stores and rehydrates domain types it
//! knows nothing about.
//!
//! Feature modules declare their domain types by implementing [`Versioned`]
//! and registering them once at module load. [`Registry::register`] builds an
//! erased serialize/deserialize pair from the canonical-serde implementation,
//! so no runtime reflection is involved -- the registry is an explicit map
//! from a type tag to a pair of typed functions.

use std::any::Any;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use histree_canon::{from_canonical_bytes, to_canonical_bytes};
use histree_types::ident::validate_non_empty;
use histree_types::TypeTag;

use crate::error::{ScopeError, ScopeResult};

/// A domain type that can be tracked by a scope.
///
/// The tag is the stable wire name for the type; it keys the registry and is
/// recorded in every [`histree_types::ContentRef`] the type appears in, so it
/// must never change for the lifetime of persisted data.
pub trait Versioned: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable tag for this type (e.g. `"counter"`, `"sheet-cell"`).
    const TAG: &'static str;

    /// The tag as a [`TypeTag`].
    fn tag() -> TypeTag {
        TypeTag::new(Self::TAG)
    }
}

/// A value whose concrete type has been erased behind the registry.
pub type ErasedValue = Box<dyn Any + Send + Sync>;

type EncodeFn = fn(&(dyn Any + Send + Sync)) -> ScopeResult<Vec<u8>>;
type DecodeFn = fn(&[u8]) -> ScopeResult<ErasedValue>;

fn encode_erased<T: Versioned>(value: &(dyn Any + Send + Sync)) -> ScopeResult<Vec<u8>> {
    let value = value
        .downcast_ref::<T>()
        .ok_or_else(|| ScopeError::TypeMismatch { tag: T::tag() })?;
    Ok(to_canonical_bytes(value)?)
}

fn decode_erased<T: Versioned>(bytes: &[u8]) -> ScopeResult<ErasedValue> {
    let value: T = from_canonical_bytes(bytes)?;
    Ok(Box::new(value))
}

/// The serializer/deserializer pair registered for one type tag.
pub struct TypeCodec {
    encode: EncodeFn,
    decode: DecodeFn,
}

impl TypeCodec {
    fn of<T: Versioned>() -> Self {
        Self {
            encode: encode_erased::<T>,
            decode: decode_erased::<T>,
        }
    }

    /// Serialize an erased value to canonical bytes.
    pub fn encode_value(&self, value: &(dyn Any + Send + Sync)) -> ScopeResult<Vec<u8>> {
        (self.encode)(value)
    }

    /// Deserialize canonical bytes back into an erased value.
    pub fn decode_value(&self, bytes: &[u8]) -> ScopeResult<ErasedValue> {
        (self.decode)(bytes)
    }
}

/// Maps type tags to their codecs.
#[derive(Default)]
pub struct Registry {
    codecs: HashMap<TypeTag, TypeCodec>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a domain type under its tag.
    ///
    /// Fails with [`ScopeError::DuplicateType`] if the tag is already taken.
    pub fn register<T: Versioned>(&mut self) -> ScopeResult<()> {
        validate_non_empty("type tag", T::TAG)?;
        let tag = T::tag();
        if self.codecs.contains_key(&tag) {
            return Err(ScopeError::DuplicateType(tag));
        }
        self.codecs.insert(tag, TypeCodec::of::<T>());
        Ok(())
    }

    /// Returns `true` if the tag has a registered codec.
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.codecs.contains_key(tag)
    }

    /// Look up the codec for a tag.
    ///
    /// Fails with [`ScopeError::UnknownType`] -- a miss indicates a missing
    /// module registration and is fatal to the operation.
    pub fn codec(&self, tag: &TypeTag) -> ScopeResult<&TypeCodec> {
        self.codecs
            .get(tag)
            .ok_or_else(|| ScopeError::UnknownType(tag.clone()))
    }

    /// Serialize a value through its registered codec.
    pub fn encode<T: Versioned>(&self, value: &T) -> ScopeResult<Vec<u8>> {
        self.codec(&T::tag())?.encode_value(value)
    }

    /// Deserialize canonical bytes through the registered codec for `T`.
    pub fn decode<T: Versioned>(&self, bytes: &[u8]) -> ScopeResult<T> {
        let erased = self.codec(&T::tag())?.decode_value(bytes)?;
        erased
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ScopeError::TypeMismatch { tag: T::tag() })
    }

    /// All registered tags, sorted.
    pub fn tags(&self) -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = self.codecs.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        v: i64,
    }

    impl Versioned for Counter {
        const TAG: &'static str = "counter";
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Player {
        name: String,
    }

    impl Versioned for Player {
        const TAG: &'static str = "player";
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct BadTag;

    impl Versioned for BadTag {
        const TAG: &'static str = "";
    }

    // Distinct type reusing Counter's tag.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Impostor {
        v: i64,
    }

    impl Versioned for Impostor {
        const TAG: &'static str = "counter";
    }

    #[test]
    fn register_and_roundtrip() {
        let mut registry = Registry::new();
        registry.register::<Counter>().unwrap();

        let value = Counter { v: 42 };
        let bytes = registry.encode(&value).unwrap();
        let restored: Counter = registry.decode(&bytes).unwrap();
        assert_eq!(value, restored);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = Registry::new();
        registry.register::<Counter>().unwrap();
        let err = registry.register::<Counter>().unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateType(_)));
    }

    #[test]
    fn duplicate_tag_across_types_fails() {
        let mut registry = Registry::new();
        registry.register::<Counter>().unwrap();
        let err = registry.register::<Impostor>().unwrap_err();
        assert!(matches!(err, ScopeError::DuplicateType(_)));
    }

    #[test]
    fn empty_tag_is_rejected() {
        let mut registry = Registry::new();
        let err = registry.register::<BadTag>().unwrap_err();
        assert!(matches!(err, ScopeError::Type(_)));
    }

    #[test]
    fn unknown_tag_fails() {
        let registry = Registry::new();
        let err = registry.encode(&Counter { v: 1 }).unwrap_err();
        assert!(matches!(err, ScopeError::UnknownType(_)));
    }

    #[test]
    fn decode_wrong_shape_fails() {
        let mut registry = Registry::new();
        registry.register::<Counter>().unwrap();
        let err = registry.decode::<Counter>(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, ScopeError::Canon(_)));
    }

    #[test]
    fn codec_rejects_mismatched_value() {
        let mut registry = Registry::new();
        registry.register::<Counter>().unwrap();
        let codec = registry.codec(&Counter::tag()).unwrap();
        let err = codec.encode_value(&Player {
            name: "p".to_string(),
        });
        assert!(matches!(err, Err(ScopeError::TypeMismatch { .. })));
    }

    #[test]
    fn tags_are_sorted() {
        let mut registry = Registry::new();
        registry.register::<Player>().unwrap();
        registry.register::<Counter>().unwrap();
        let tags = registry.tags();
        assert_eq!(tags, vec![TypeTag::new("counter"), TypeTag::new("player")]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn encoding_is_canonical() {
        let mut registry = Registry::new();
        registry.register::<Counter>().unwrap();
        let bytes = registry.encode(&Counter { v: 7 }).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"v":7}"#);
    }
}
