//! The core commit tree structure and traversal algorithms.
//!
//! [`CommitGraph`] stores nodes in a [`HashMap`] and maintains a forward-edge
//! index (`children`) so fork enumeration and redo resolution are O(1) per
//! node. The root and apex pointers are part of the structure: the root never
//! moves, the apex is repointed by undo/redo/time-travel.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use histree_types::{ContentRef, EntityId, NodeId, Stamp, TypeTag};

use crate::error::{GraphError, GraphResult};
use crate::node::CommitNode;

/// The commit tree for one scope.
///
/// Each node has exactly one parent (except the root) and any number of
/// children; a node with several children is a fork. Committing and moving
/// the apex are separate operations so callers can build a node before
/// deciding whether it becomes current.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitGraph {
    /// All nodes, keyed by their id.
    nodes: HashMap<NodeId, CommitNode>,
    /// Forward-edge index: parent -> children in commit order
    /// (most recent last).
    children: HashMap<NodeId, Vec<NodeId>>,
    /// The node every history starts from.
    root: NodeId,
    /// The node representing "current" state.
    apex: NodeId,
}

impl CommitGraph {
    /// Create a graph seeded with a root node; root becomes the apex.
    pub fn new(root: CommitNode) -> GraphResult<Self> {
        if !root.is_root() {
            return Err(GraphError::RootHasParent(root.id));
        }
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Ok(Self {
            nodes,
            children: HashMap::new(),
            root: root_id,
            apex: root_id,
        })
    }

    /// Total number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes. A well-formed graph always
    /// holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node's id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The apex node's id.
    pub fn apex(&self) -> NodeId {
        self.apex
    }

    /// The apex node itself.
    pub fn apex_node(&self) -> &CommitNode {
        self.nodes
            .get(&self.apex)
            .expect("apex always refers to an existing node")
    }

    /// Retrieve a node by id.
    pub fn node(&self, id: NodeId) -> Option<&CommitNode> {
        self.nodes.get(&id)
    }

    /// Returns `true` if the graph contains the given node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterate over all nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &CommitNode> {
        self.nodes.values()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Insert a prebuilt node.
    ///
    /// The node's parent must already exist, and its id must be new. Used by
    /// persistence to rebuild a graph; live commits go through [`commit`].
    ///
    /// [`commit`]: CommitGraph::commit
    pub fn insert(&mut self, node: CommitNode) -> GraphResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        match node.parent {
            None => {
                return Err(GraphError::RootConflict {
                    existing: self.root,
                    node: node.id,
                });
            }
            Some(parent) => {
                if !self.nodes.contains_key(&parent) {
                    return Err(GraphError::DanglingParent {
                        node: node.id,
                        parent,
                    });
                }
                self.children.entry(parent).or_default().push(node.id);
            }
        }
        debug!(node = %node.id.short_id(), "added commit node");
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Create a new node as a child of `parent` and return its id.
    ///
    /// Does **not** move the apex -- committing and advancing are separate.
    /// Fails with [`GraphError::NodeNotFound`] if the parent is unknown.
    pub fn commit(
        &mut self,
        parent: NodeId,
        changed: Vec<ContentRef>,
        stamp: Stamp,
    ) -> GraphResult<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return Err(GraphError::NodeNotFound(parent));
        }
        let node = CommitNode::child(parent, changed, stamp);
        let id = node.id;
        self.insert(node)?;
        Ok(id)
    }

    /// Repoint the apex.
    ///
    /// Fails with [`GraphError::NodeNotFound`] if the id is unknown to this
    /// graph. Never mutates node data.
    pub fn set_apex(&mut self, id: NodeId) -> GraphResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        debug!(from = %self.apex.short_id(), to = %id.short_id(), "moved apex");
        self.apex = id;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Undo / redo predicates
    // ---------------------------------------------------------------

    /// True iff the apex has a parent to move back to.
    pub fn can_undo(&self) -> bool {
        self.apex_node().parent.is_some()
    }

    /// True iff the apex has at least one child to move forward to.
    pub fn can_redo(&self) -> bool {
        !self.children_of(self.apex).is_empty()
    }

    // ---------------------------------------------------------------
    // Traversal
    // ---------------------------------------------------------------

    /// The children of a node, in commit order (most recent last).
    ///
    /// Unknown ids and leaves both yield an empty slice.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The ancestor chain root→node (inclusive of both ends).
    pub fn path(&self, id: NodeId) -> GraphResult<Vec<NodeId>> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        path.push(current.id);
        while let Some(parent) = current.parent {
            if path.len() > self.nodes.len() {
                // Parent links loop: the tree invariant is broken.
                return Err(GraphError::Unreachable(id));
            }
            current = self
                .nodes
                .get(&parent)
                .ok_or(GraphError::DanglingParent {
                    node: current.id,
                    parent,
                })?;
            path.push(current.id);
        }
        path.reverse();
        Ok(path)
    }

    /// Resolve the effective state of `(tag, entity)` at a node.
    ///
    /// Walks backward from the node to the root and returns the first ref
    /// (nearest ancestor, inclusive) whose change set mentions the pair.
    /// `Ok(None)` means the object did not yet exist at that node.
    pub fn resolve(
        &self,
        at: NodeId,
        tag: &TypeTag,
        entity: &EntityId,
    ) -> GraphResult<Option<&ContentRef>> {
        let mut steps = 0usize;
        let mut current = self.nodes.get(&at).ok_or(GraphError::NodeNotFound(at))?;
        loop {
            if let Some(found) = current.change_for(tag, entity) {
                return Ok(Some(found));
            }
            match current.parent {
                None => return Ok(None),
                Some(parent) => {
                    steps += 1;
                    if steps > self.nodes.len() {
                        return Err(GraphError::Unreachable(at));
                    }
                    current = self
                        .nodes
                        .get(&parent)
                        .ok_or(GraphError::DanglingParent {
                            node: current.id,
                            parent,
                        })?;
                }
            }
        }
    }

    /// All nodes in parent-before-child order (BFS from the root, children
    /// in commit order). Used by persistence so a rebuild can insert
    /// sequentially.
    pub fn nodes_topological(&self) -> Vec<&CommitNode> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::new();
        queue.push_back(self.root);
        while let Some(id) = queue.pop_front() {
            if let Some(node) = self.nodes.get(&id) {
                result.push(node);
            }
            for child in self.children_of(id) {
                queue.push_back(*child);
            }
        }
        result
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Validate the graph's structural integrity.
    ///
    /// Checks that parent references resolve, the children index agrees with
    /// parent links in both directions, exactly one root exists, the apex
    /// exists, and every node is reachable from the root.
    pub fn validate(&self) -> GraphResult<()> {
        if !self.nodes.contains_key(&self.apex) {
            return Err(GraphError::NodeNotFound(self.apex));
        }
        let root = self
            .nodes
            .get(&self.root)
            .ok_or(GraphError::NodeNotFound(self.root))?;
        if !root.is_root() {
            return Err(GraphError::RootHasParent(self.root));
        }

        for node in self.nodes.values() {
            match node.parent {
                None => {
                    if node.id != self.root {
                        return Err(GraphError::RootConflict {
                            existing: self.root,
                            node: node.id,
                        });
                    }
                }
                Some(parent) => {
                    if !self.nodes.contains_key(&parent) {
                        return Err(GraphError::DanglingParent {
                            node: node.id,
                            parent,
                        });
                    }
                    if !self.children_of(parent).contains(&node.id) {
                        return Err(GraphError::ChildIndexCorrupt {
                            parent,
                            child: node.id,
                        });
                    }
                }
            }
        }

        for (parent, child_ids) in &self.children {
            for child in child_ids {
                let ok = self
                    .nodes
                    .get(child)
                    .is_some_and(|n| n.parent == Some(*parent));
                if !ok {
                    return Err(GraphError::ChildIndexCorrupt {
                        parent: *parent,
                        child: *child,
                    });
                }
            }
        }

        // Reachability: BFS down from the root must visit every node.
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(self.root);
        queue.push_back(self.root);
        while let Some(id) = queue.pop_front() {
            for child in self.children_of(id) {
                if visited.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }
        if visited.len() != self.nodes.len() {
            let orphan = self
                .nodes
                .keys()
                .find(|id| !visited.contains(id))
                .copied()
                .unwrap_or(self.root);
            return Err(GraphError::Unreachable(orphan));
        }

        Ok(())
    }

    // ---------------------------------------------------------------
    // Serialization helpers
    // ---------------------------------------------------------------

    /// Serialize the graph to bincode bytes.
    pub fn to_bytes(&self) -> GraphResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// Deserialize a graph from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> GraphResult<Self> {
        bincode::deserialize(data).map_err(|e| GraphError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use histree_types::ContentHash;

    use super::*;

    fn make_ref(entity: &str, byte: u8) -> ContentRef {
        ContentRef::new(
            "counter".into(),
            entity.into(),
            ContentHash::from_hash([byte; 32]),
        )
    }

    fn root_graph() -> CommitGraph {
        CommitGraph::new(CommitNode::root(vec![make_ref("c1", 0)], Stamp::zero())).unwrap()
    }

    /// Root -> a -> b, with stamps 1 and 2.
    fn linear_graph() -> (CommitGraph, NodeId, NodeId) {
        let mut graph = root_graph();
        let a = graph
            .commit(graph.root(), vec![make_ref("c1", 1)], Stamp::new(1, 0))
            .unwrap();
        let b = graph
            .commit(a, vec![make_ref("c1", 2)], Stamp::new(2, 0))
            .unwrap();
        (graph, a, b)
    }

    // ----------------------------------------------------------
    // Construction
    // ----------------------------------------------------------

    #[test]
    fn new_graph_seeds_root_as_apex() {
        let graph = root_graph();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.root(), graph.apex());
        assert!(graph.apex_node().is_root());
    }

    #[test]
    fn new_rejects_non_root_node() {
        let child = CommitNode::child(NodeId::new(), vec![], Stamp::zero());
        let err = CommitGraph::new(child).unwrap_err();
        assert!(matches!(err, GraphError::RootHasParent(_)));
    }

    #[test]
    fn commit_creates_child_without_moving_apex() {
        let mut graph = root_graph();
        let id = graph
            .commit(graph.root(), vec![make_ref("c1", 1)], Stamp::new(1, 0))
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.apex(), graph.root());
        assert_eq!(graph.node(id).unwrap().parent, Some(graph.root()));
    }

    #[test]
    fn commit_unknown_parent_fails() {
        let mut graph = root_graph();
        let err = graph
            .commit(NodeId::new(), vec![], Stamp::new(1, 0))
            .unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(_)));
    }

    #[test]
    fn insert_duplicate_id_fails() {
        let mut graph = root_graph();
        let node = CommitNode::child(graph.root(), vec![], Stamp::new(1, 0));
        graph.insert(node.clone()).unwrap();
        let err = graph.insert(node).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(_)));
    }

    #[test]
    fn insert_second_root_fails() {
        let mut graph = root_graph();
        let err = graph
            .insert(CommitNode::root(vec![], Stamp::new(1, 0)))
            .unwrap_err();
        assert!(matches!(err, GraphError::RootConflict { .. }));
    }

    #[test]
    fn insert_dangling_parent_fails() {
        let mut graph = root_graph();
        let err = graph
            .insert(CommitNode::child(NodeId::new(), vec![], Stamp::new(1, 0)))
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingParent { .. }));
    }

    // ----------------------------------------------------------
    // Apex movement
    // ----------------------------------------------------------

    #[test]
    fn set_apex_moves_pointer() {
        let (mut graph, a, _) = linear_graph();
        graph.set_apex(a).unwrap();
        assert_eq!(graph.apex(), a);
    }

    #[test]
    fn set_apex_unknown_node_fails() {
        let mut graph = root_graph();
        let before = graph.apex();
        let err = graph.set_apex(NodeId::new()).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(_)));
        assert_eq!(graph.apex(), before);
    }

    #[test]
    fn can_undo_and_redo_track_apex_position() {
        let (mut graph, a, b) = linear_graph();
        // Apex still at root: nothing behind, something ahead.
        assert!(!graph.can_undo());
        assert!(graph.can_redo());

        graph.set_apex(b).unwrap();
        assert!(graph.can_undo());
        assert!(!graph.can_redo());

        graph.set_apex(a).unwrap();
        assert!(graph.can_undo());
        assert!(graph.can_redo());
    }

    // ----------------------------------------------------------
    // Children / forks
    // ----------------------------------------------------------

    #[test]
    fn children_in_commit_order() {
        let mut graph = root_graph();
        let first = graph
            .commit(graph.root(), vec![make_ref("c1", 1)], Stamp::new(1, 0))
            .unwrap();
        let second = graph
            .commit(graph.root(), vec![make_ref("c1", 2)], Stamp::new(2, 0))
            .unwrap();
        // Most recent last.
        assert_eq!(graph.children_of(graph.root()), &[first, second]);
    }

    #[test]
    fn children_of_leaf_is_empty() {
        let (graph, _, b) = linear_graph();
        assert!(graph.children_of(b).is_empty());
    }

    // ----------------------------------------------------------
    // Path / resolve
    // ----------------------------------------------------------

    #[test]
    fn path_runs_root_to_node() {
        let (graph, a, b) = linear_graph();
        assert_eq!(graph.path(b).unwrap(), vec![graph.root(), a, b]);
        assert_eq!(graph.path(graph.root()).unwrap(), vec![graph.root()]);
    }

    #[test]
    fn path_unknown_node_fails() {
        let graph = root_graph();
        assert!(matches!(
            graph.path(NodeId::new()),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn resolve_finds_nearest_ancestor() {
        let (graph, a, b) = linear_graph();
        let tag: TypeTag = "counter".into();
        let entity: EntityId = "c1".into();

        // At b, b's own change wins.
        let at_b = graph.resolve(b, &tag, &entity).unwrap().unwrap();
        assert_eq!(at_b.hash, ContentHash::from_hash([2; 32]));
        // At a, a's change wins.
        let at_a = graph.resolve(a, &tag, &entity).unwrap().unwrap();
        assert_eq!(at_a.hash, ContentHash::from_hash([1; 32]));
    }

    #[test]
    fn resolve_walks_past_unrelated_nodes() {
        let mut graph = root_graph();
        // A node that changes a different entity.
        let a = graph
            .commit(graph.root(), vec![make_ref("other", 9)], Stamp::new(1, 0))
            .unwrap();
        let found = graph
            .resolve(a, &"counter".into(), &"c1".into())
            .unwrap()
            .unwrap();
        // Root's ref is the nearest ancestor mentioning c1.
        assert_eq!(found.hash, ContentHash::from_hash([0; 32]));
    }

    #[test]
    fn resolve_missing_object_is_none() {
        let graph = root_graph();
        let found = graph
            .resolve(graph.root(), &"counter".into(), &"never-created".into())
            .unwrap();
        assert!(found.is_none());
    }

    // ----------------------------------------------------------
    // Topological order
    // ----------------------------------------------------------

    #[test]
    fn topological_order_is_parent_before_child() {
        let (mut graph, a, b) = linear_graph();
        // Add a fork off the root as well.
        let c = graph
            .commit(graph.root(), vec![make_ref("c1", 3)], Stamp::new(3, 0))
            .unwrap();
        let order: Vec<NodeId> = graph.nodes_topological().iter().map(|n| n.id).collect();
        assert_eq!(order.len(), 4);
        let pos = |id: NodeId| order.iter().position(|n| *n == id).unwrap();
        assert!(pos(graph.root()) < pos(a));
        assert!(pos(a) < pos(b));
        assert!(pos(graph.root()) < pos(c));
    }

    // ----------------------------------------------------------
    // Validation
    // ----------------------------------------------------------

    #[test]
    fn valid_graph_passes_validation() {
        let (graph, _, _) = linear_graph();
        graph.validate().unwrap();
    }

    #[test]
    fn validation_detects_dangling_parent() {
        let (mut graph, a, _) = linear_graph();
        // Corrupt: remove a node that still has a child.
        graph.nodes.remove(&a);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn validation_detects_child_index_corruption() {
        let (mut graph, a, b) = linear_graph();
        graph.children.get_mut(&a).unwrap().retain(|id| *id != b);
        let err = graph.validate().unwrap_err();
        assert!(matches!(err, GraphError::ChildIndexCorrupt { .. }));
    }

    #[test]
    fn validation_detects_missing_apex() {
        let (mut graph, _, b) = linear_graph();
        graph.apex = NodeId::new();
        let err = graph.validate().unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(_)));
        graph.apex = b;
        graph.validate().unwrap();
    }

    // ----------------------------------------------------------
    // Serialization
    // ----------------------------------------------------------

    #[test]
    fn bincode_roundtrip() {
        let (mut graph, a, _) = linear_graph();
        graph.set_apex(a).unwrap();
        let bytes = graph.to_bytes().unwrap();
        let restored = CommitGraph::from_bytes(&bytes).unwrap();
        assert_eq!(restored.len(), graph.len());
        assert_eq!(restored.root(), graph.root());
        assert_eq!(restored.apex(), graph.apex());
        restored.validate().unwrap();
    }
}
