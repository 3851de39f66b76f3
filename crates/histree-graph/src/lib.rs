//! The commit tree at the heart of the versioned object graph.
//!
//! [`CommitGraph`] records every change to a scope's objects as an immutable
//! [`CommitNode`]. Nodes form a tree: one parent each, any number of
//! children. A node with several children is a fork -- created when a user
//! undoes past an edit and then makes a new one. The apex pointer marks
//! "current" state and is the only thing that ever moves.
//!
//! # Invariants
//!
//! - The root has no parent; every other node's parent exists in the graph.
//! - Every node is reachable from the root by following parent links.
//! - The apex always refers to an existing node.
//! - Node ids are unique within a graph.

pub mod error;
pub mod graph;
pub mod node;

pub use error::{GraphError, GraphResult};
pub use graph::CommitGraph;
pub use node::CommitNode;
