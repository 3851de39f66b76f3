use thiserror::Error;

/// Errors from canonical serialization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonError {
    /// The value could not be serialized to canonical JSON (e.g. a map with
    /// non-string keys).
    #[error("canonical serialization error: {0}")]
    Serialize(String),

    /// The bytes could not be deserialized back into the requested type.
    #[error("canonical deserialization error: {0}")]
    Deserialize(String),
}

/// Result alias for canonical serialization operations.
pub type CanonResult<T> = Result<T, CanonError>;
