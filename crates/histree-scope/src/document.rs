//! The persisted scope layout.
//!
//! A [`ScopeDocument`] is everything needed to reproduce a scope: the graph's
//! nodes, the root and apex pointers, and every blob any node references.
//! Round-tripping a scope through save/load reproduces an identical graph --
//! same apex, same reachable nodes, same blob content. How the document gets
//! to disk or network is the caller's concern; flushing it must never block
//! subsequent commits, and the in-memory graph stays the source of truth if
//! a flush fails.
//!
//! Redo hints are deliberately absent from the layout: they are session
//! state, reset on load.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use histree_graph::{CommitGraph, CommitNode};
use histree_store::ContentStore;
use histree_types::{ContentHash, ContentRef, NodeId, ScopeId, Stamp};

use crate::error::{ScopeError, ScopeResult};
use crate::registry::Registry;
use crate::scope::Scope;

/// One commit node, flattened for persistence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// The node's id.
    pub id: NodeId,
    /// Its parent, or `None` for the root.
    pub parent: Option<NodeId>,
    /// The refs this node changed.
    pub changed: Vec<ContentRef>,
    /// When it was committed.
    pub stamp: Stamp,
}

/// The complete persisted form of one scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDocument {
    /// The scope this document captures.
    pub scope_id: ScopeId,
    /// The graph's root node.
    pub root: NodeId,
    /// The apex at save time.
    pub apex: NodeId,
    /// Every node, parent-before-child.
    pub nodes: Vec<NodeRecord>,
    /// Every referenced blob, keyed by hex hash.
    pub blobs: BTreeMap<String, Vec<u8>>,
}

impl ScopeDocument {
    /// Serialize to bincode bytes.
    pub fn to_bytes(&self) -> ScopeResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| ScopeError::Serialization(e.to_string()))
    }

    /// Deserialize from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> ScopeResult<Self> {
        bincode::deserialize(data).map_err(|e| ScopeError::Serialization(e.to_string()))
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> ScopeResult<String> {
        serde_json::to_string(self).map_err(|e| ScopeError::Serialization(e.to_string()))
    }

    /// Deserialize from a JSON string.
    pub fn from_json(data: &str) -> ScopeResult<Self> {
        serde_json::from_str(data).map_err(|e| ScopeError::Serialization(e.to_string()))
    }
}

impl Scope {
    /// Capture this scope as a persistable document.
    ///
    /// Fails with [`ScopeError::BlobMissing`] if any node references a hash
    /// the store no longer holds -- that is store corruption, not a state to
    /// silently persist.
    pub fn to_document(&self) -> ScopeResult<ScopeDocument> {
        let graph = self.graph();
        let mut nodes = Vec::with_capacity(graph.len());
        let mut blobs = BTreeMap::new();

        for node in graph.nodes_topological() {
            for r in &node.changed {
                let key = r.hash.to_hex();
                if !blobs.contains_key(&key) {
                    let bytes = self
                        .store()
                        .get(&r.hash)?
                        .ok_or(ScopeError::BlobMissing(r.hash))?;
                    blobs.insert(key, bytes);
                }
            }
            nodes.push(NodeRecord {
                id: node.id,
                parent: node.parent,
                changed: node.changed.clone(),
                stamp: node.stamp,
            });
        }

        Ok(ScopeDocument {
            scope_id: self.scope_id().clone(),
            root: graph.root(),
            apex: graph.apex(),
            nodes,
            blobs,
        })
    }

    /// Rebuild a scope from a persisted document.
    ///
    /// Blobs are reinserted into the provided store (verifying each against
    /// its recorded hash) and the graph is rebuilt and validated. The rebuilt
    /// graph is identical to the saved one: same apex, same reachable nodes,
    /// same blob content. Redo hints start empty.
    pub fn from_document(
        doc: ScopeDocument,
        registry: Arc<Registry>,
        store: Arc<dyn ContentStore>,
    ) -> ScopeResult<Self> {
        for (hex, bytes) in &doc.blobs {
            let expected = ContentHash::from_hex(hex)?;
            let computed = store.put(bytes)?;
            if computed != expected {
                return Err(ScopeError::HashMismatch { expected, computed });
            }
        }

        let mut records = doc.nodes;
        let root_pos = records
            .iter()
            .position(|r| r.id == doc.root && r.parent.is_none())
            .ok_or_else(|| ScopeError::CorruptDocument("root node record missing".into()))?;
        let root = records.remove(root_pos);
        let mut last_stamp = root.stamp;
        let mut graph = CommitGraph::new(CommitNode {
            id: root.id,
            parent: None,
            changed: root.changed,
            stamp: root.stamp,
        })?;

        // Documents written by `to_document` are parent-before-child, but
        // external producers may not be: keep deferring records until their
        // parents land.
        let mut pending = records;
        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut progressed = false;
            for record in pending {
                let parent_known = record.parent.is_some_and(|p| graph.contains(p));
                if parent_known {
                    if record.stamp > last_stamp {
                        last_stamp = record.stamp;
                    }
                    graph.insert(CommitNode {
                        id: record.id,
                        parent: record.parent,
                        changed: record.changed,
                        stamp: record.stamp,
                    })?;
                    progressed = true;
                } else {
                    deferred.push(record);
                }
            }
            if !progressed {
                let orphan = deferred[0].id;
                return Err(ScopeError::CorruptDocument(format!(
                    "node {orphan:?} references a parent outside the document"
                )));
            }
            pending = deferred;
        }

        graph.set_apex(doc.apex)?;
        graph.validate()?;
        info!(scope = %doc.scope_id, nodes = graph.len(), "restored scope from document");

        Ok(Scope::restore(doc.scope_id, graph, store, registry, last_stamp))
    }
}
