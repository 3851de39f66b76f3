use histree_canon::CanonError;
use histree_graph::GraphError;
use histree_store::StoreError;
use histree_types::{ContentHash, EntityId, NodeId, TypeError, TypeTag};

/// Errors from scope operations.
///
/// `AtRoot`, `AtTip`, and `ForkAmbiguous` are expected boundary conditions --
/// callers can pre-check with `can_undo`/`can_redo` or match on the result.
/// The structural variants (`NodeNotFound`, `BlobMissing`, `HashMismatch`,
/// `CorruptDocument`) indicate a corrupted scope and are never retried or
/// swallowed; the owning module decides whether to reset the scope.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Undo was requested at the root node.
    #[error("already at the root; nothing to undo")]
    AtRoot,

    /// Redo was requested at a node with no children.
    #[error("already at a tip; nothing to redo")]
    AtTip,

    /// Redo was requested at a fork with no resolvable branch.
    ///
    /// The caller is expected to enumerate the branches with `fork_choices`
    /// and pick one with `move_to`.
    #[error("redo at {node:?} is ambiguous; pick a branch")]
    ForkAmbiguous {
        /// The forked node the apex is sitting on.
        node: NodeId,
    },

    /// The node id is not part of this scope's graph.
    #[error("node not found in this scope: {0:?}")]
    NodeNotFound(NodeId),

    /// The type tag has no registered codec.
    #[error("unknown type tag: {0}")]
    UnknownType(TypeTag),

    /// The type tag was registered twice.
    #[error("type tag registered twice: {0}")]
    DuplicateType(TypeTag),

    /// A codec was invoked with a value of the wrong concrete type.
    #[error("value does not match registered type for tag {tag}")]
    TypeMismatch {
        /// The tag whose codec rejected the value.
        tag: TypeTag,
    },

    /// A batch staged an update for an object that does not exist yet.
    #[error("object {tag}/{entity} does not exist at the apex")]
    ObjectMissing {
        /// Tag of the requested type.
        tag: TypeTag,
        /// The missing entity.
        entity: EntityId,
    },

    /// A hash referenced by a node has no corresponding blob.
    #[error("blob missing from store: {0}")]
    BlobMissing(ContentHash),

    /// A persisted blob does not hash to its recorded key.
    #[error("blob hash mismatch: document says {expected}, content is {computed}")]
    HashMismatch {
        /// The hash the document recorded.
        expected: ContentHash,
        /// The hash the blob bytes actually produce.
        computed: ContentHash,
    },

    /// A persisted document cannot be rebuilt into a graph.
    #[error("corrupt scope document: {0}")]
    CorruptDocument(String),

    /// Document serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A structural graph error other than a missing node.
    #[error(transparent)]
    Graph(GraphError),

    /// Content store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Canonical serialization failure.
    #[error(transparent)]
    Canon(#[from] CanonError),

    /// Invalid identifier or hash.
    #[error(transparent)]
    Type(#[from] TypeError),
}

// NodeNotFound is part of this crate's own taxonomy; everything else from the
// graph layer stays wrapped.
impl From<GraphError> for ScopeError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NodeNotFound(id) => ScopeError::NodeNotFound(id),
            other => ScopeError::Graph(other),
        }
    }
}

/// Result alias for scope operations.
pub type ScopeResult<T> = Result<T, ScopeError>;
