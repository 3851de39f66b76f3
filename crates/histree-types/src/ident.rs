//! String identifiers: scopes, entities, and type tags.
//!
//! All three are cheap-to-clone string newtypes. A [`ScopeId`] names one
//! graph instance (one per game, sheet, conversation); an [`EntityId`] names
//! one tracked object within a scope; a [`TypeTag`] names a registered domain
//! type. Identifiers must be non-empty -- [`validate_non_empty`] is applied at
//! the seams that accept caller-supplied names (registry registration, scope
//! creation), the same way ref names are validated at write time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Reject empty identifiers at the point of use.
pub fn validate_non_empty(what: &'static str, value: &str) -> Result<(), TypeError> {
    if value.is_empty() {
        return Err(TypeError::EmptyIdentifier(what));
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the underlying string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Name of one isolated graph instance.
    ///
    /// A scope is the unit of isolation: one per tracked aggregate. Scope ids
    /// are caller-supplied (e.g. `"game:42"`, `"sheet:budget"`).
    ScopeId
}

string_id! {
    /// Name of one tracked object within a scope.
    EntityId
}

string_id! {
    /// Name of a registered domain type.
    ///
    /// Type tags key the serializer/deserializer registry; they are declared
    /// once per domain type and never change for the lifetime of persisted
    /// data.
    TypeTag
}
