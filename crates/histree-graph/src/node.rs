//! Commit node type: one atomic change to one or more tracked objects.

use serde::{Deserialize, Serialize};

use histree_types::{ContentRef, EntityId, NodeId, Stamp, TypeTag};

/// A node in the commit tree.
///
/// Each node captures the set of [`ContentRef`]s that changed relative to its
/// parent. Nodes are immutable once added -- the tree is append-only; undo,
/// redo, and time-travel only move the apex pointer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitNode {
    /// Unique identifier for this node.
    pub id: NodeId,
    /// The parent node, or `None` for the root.
    pub parent: Option<NodeId>,
    /// The refs that changed relative to the parent.
    pub changed: Vec<ContentRef>,
    /// When this node was committed.
    pub stamp: Stamp,
}

impl CommitNode {
    /// Create a root node covering the given initial refs.
    pub fn root(changed: Vec<ContentRef>, stamp: Stamp) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            changed,
            stamp,
        }
    }

    /// Create a child node of `parent` with a fresh id.
    pub fn child(parent: NodeId, changed: Vec<ContentRef>, stamp: Stamp) -> Self {
        Self {
            id: NodeId::new(),
            parent: Some(parent),
            changed,
            stamp,
        }
    }

    /// Returns `true` if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The ref this node recorded for `(tag, entity)`, if any.
    pub fn change_for(&self, tag: &TypeTag, entity: &EntityId) -> Option<&ContentRef> {
        self.changed.iter().find(|r| r.is_for(tag, entity))
    }

    /// Returns a human-readable summary of this node.
    pub fn summary(&self) -> String {
        format!(
            "{} ({} change{}) at {}",
            self.id.short_id(),
            self.changed.len(),
            if self.changed.len() == 1 { "" } else { "s" },
            self.stamp,
        )
    }
}
