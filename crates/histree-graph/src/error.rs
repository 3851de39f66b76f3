//! Error types for the commit tree.

use histree_types::NodeId;

/// Errors that can occur during commit graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A referenced node was not found in this graph.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Attempted to add a node with an ID that already exists.
    #[error("duplicate node: {0:?}")]
    DuplicateNode(NodeId),

    /// A node's parent reference points to a node that does not exist.
    #[error("dangling parent reference: node {node:?} references missing parent {parent:?}")]
    DanglingParent {
        /// The node containing the bad reference.
        node: NodeId,
        /// The missing parent.
        parent: NodeId,
    },

    /// A non-root node was used to seed a graph.
    #[error("root node {0:?} has a parent")]
    RootHasParent(NodeId),

    /// A second parentless node was added to a graph that already has a root.
    #[error("graph already has root {existing:?}; cannot add second root {node:?}")]
    RootConflict {
        /// The graph's existing root.
        existing: NodeId,
        /// The offending parentless node.
        node: NodeId,
    },

    /// The forward children index disagrees with a node's parent link.
    #[error("children index corrupt: parent {parent:?} does not list child {child:?}")]
    ChildIndexCorrupt {
        /// The parent whose child list is wrong.
        parent: NodeId,
        /// The child missing from (or wrongly present in) the list.
        child: NodeId,
    },

    /// A node is not reachable from the root by parent links.
    #[error("node {0:?} is unreachable from the root")]
    Unreachable(NodeId),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
