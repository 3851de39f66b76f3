//! Canonical byte form for serializable values.
//!
//! Serialization routes through [`serde_json::Value`], whose object type is a
//! `BTreeMap`: every map ends up key-sorted, recursively, before being
//! written out with no whitespace. The result is byte-identical for
//! semantically identical values regardless of insertion order.
//!
//! Limits inherited from JSON canonicalization: map keys must be strings (or
//! integers, which serde_json stringifies), and non-finite floats are not
//! representable -- domain types should not carry NaN or infinities.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CanonError, CanonResult};

/// Serialize a value to its canonical byte form.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> CanonResult<Vec<u8>> {
    let value =
        serde_json::to_value(value).map_err(|e| CanonError::Serialize(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| CanonError::Serialize(e.to_string()))
}

/// Deserialize a value from its canonical byte form.
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> CanonResult<T> {
    serde_json::from_slice(bytes).map_err(|e| CanonError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Board {
        cells: HashMap<String, i64>,
        name: String,
    }

    #[test]
    fn map_insertion_order_does_not_matter() {
        let mut forward = HashMap::new();
        forward.insert("a".to_string(), 1i64);
        forward.insert("b".to_string(), 2);
        forward.insert("c".to_string(), 3);

        let mut backward = HashMap::new();
        backward.insert("c".to_string(), 3i64);
        backward.insert("b".to_string(), 2);
        backward.insert("a".to_string(), 1);

        assert_eq!(
            to_canonical_bytes(&forward).unwrap(),
            to_canonical_bytes(&backward).unwrap()
        );
    }

    #[test]
    fn hashmap_and_btreemap_agree() {
        let mut hash = HashMap::new();
        hash.insert("x".to_string(), 10i64);
        hash.insert("y".to_string(), 20);

        let mut btree = BTreeMap::new();
        btree.insert("y".to_string(), 20i64);
        btree.insert("x".to_string(), 10);

        assert_eq!(
            to_canonical_bytes(&hash).unwrap(),
            to_canonical_bytes(&btree).unwrap()
        );
    }

    #[test]
    fn nested_maps_are_sorted() {
        let mut inner = HashMap::new();
        inner.insert("z".to_string(), 1i64);
        inner.insert("a".to_string(), 2);
        let mut outer = HashMap::new();
        outer.insert("m".to_string(), inner);

        let bytes = to_canonical_bytes(&outer).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"m":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn struct_fields_are_key_sorted() {
        let board = Board {
            cells: HashMap::new(),
            name: "b".to_string(),
        };
        let bytes = to_canonical_bytes(&board).unwrap();
        // "cells" before "name" regardless of declaration order.
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"cells":{},"name":"b"}"#
        );
    }

    #[test]
    fn roundtrip_restores_value() {
        let mut cells = HashMap::new();
        cells.insert("a1".to_string(), 42i64);
        let board = Board {
            cells,
            name: "budget".to_string(),
        };
        let bytes = to_canonical_bytes(&board).unwrap();
        let restored: Board = from_canonical_bytes(&bytes).unwrap();
        assert_eq!(board, restored);
    }

    #[test]
    fn deserialize_garbage_fails() {
        let err = from_canonical_bytes::<Board>(b"not json").unwrap_err();
        assert!(matches!(err, CanonError::Deserialize(_)));
    }

    #[test]
    fn non_string_keyed_map_fails() {
        let mut map = HashMap::new();
        map.insert(vec![1u8, 2], "value");
        let err = to_canonical_bytes(&map).unwrap_err();
        assert!(matches!(err, CanonError::Serialize(_)));
    }

    proptest::proptest! {
        #[test]
        fn canonical_bytes_are_order_independent(entries: Vec<(String, i64)>) {
            let hash: HashMap<String, i64> = entries.iter().cloned().collect();
            let btree: BTreeMap<String, i64> = entries.iter().cloned().collect();
            proptest::prop_assert_eq!(
                to_canonical_bytes(&hash).unwrap(),
                to_canonical_bytes(&btree).unwrap()
            );
        }
    }
}
