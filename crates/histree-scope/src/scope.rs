//! Scope orchestration: the undo/redo/fork algorithm over one commit tree.
//!
//! A [`Scope`] owns one [`CommitGraph`] plus a shared content store and type
//! registry. It is the unit of isolation -- one per game, sheet, or
//! conversation -- and the only surface feature modules talk to. Scopes are
//! single-writer: all commits happen on the module's one logical thread of
//! control.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, warn};

use histree_canon::ContentHasher;
use histree_graph::{CommitGraph, CommitNode};
use histree_store::ContentStore;
use histree_types::ident::validate_non_empty;
use histree_types::{ContentHash, ContentRef, EntityId, NodeId, ScopeId, Stamp, TypeTag};

use crate::batch::Batch;
use crate::error::{ScopeError, ScopeResult};
use crate::registry::{Registry, Versioned};
use crate::seed::Seed;
use crate::shell::Shell;

/// One branch available to redo into, as presented to the UI at a fork.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkChoice {
    /// The child node this choice leads to.
    pub node: NodeId,
    /// Whether this child is the branch the user most recently undid out of.
    pub same_line: bool,
    /// What moving here would change, for previewing.
    pub changed: Vec<ContentRef>,
}

/// One line of a scope's history, for log-style displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The commit node.
    pub node: NodeId,
    /// When it was committed.
    pub stamp: Stamp,
    /// The refs it changed.
    pub changed: Vec<ContentRef>,
}

/// A named instance of the versioned object graph.
///
/// Everything a feature module does -- reading objects, committing updates,
/// undo, redo, time-travel, fork resolution -- goes through its scope. The
/// content store may be shared with other scopes; the graph never is.
pub struct Scope {
    id: ScopeId,
    graph: CommitGraph,
    store: Arc<dyn ContentStore>,
    registry: Arc<Registry>,
    /// Per node: which child was most recently departed from via undo.
    redo_hints: HashMap<NodeId, NodeId>,
    last_stamp: Stamp,
}

impl Scope {
    /// Create a scope seeded with the given initial objects.
    ///
    /// The root node's change set covers every seeded object; root becomes
    /// the apex. Every seed's tag must already be registered. When two seeds
    /// name the same (type, entity) pair, the last one wins.
    pub fn create(
        id: impl Into<ScopeId>,
        registry: Arc<Registry>,
        store: Arc<dyn ContentStore>,
        seeds: Vec<Seed>,
    ) -> ScopeResult<Self> {
        let id = id.into();
        validate_non_empty("scope", id.as_str())?;

        let mut initial: BTreeMap<(TypeTag, EntityId), Seed> = BTreeMap::new();
        for seed in seeds {
            if !registry.contains(seed.tag()) {
                return Err(ScopeError::UnknownType(seed.tag().clone()));
            }
            initial.insert((seed.tag().clone(), seed.entity().clone()), seed);
        }

        let mut changed = Vec::with_capacity(initial.len());
        for ((tag, entity), seed) in initial {
            let hash = store.put(seed.bytes())?;
            changed.push(ContentRef::new(tag, entity, hash));
        }

        let stamp = Stamp::zero().next();
        let object_count = changed.len();
        let graph = CommitGraph::new(CommitNode::root(changed, stamp))?;
        info!(scope = %id, objects = object_count, "created scope");

        Ok(Self {
            id,
            graph,
            store,
            registry,
            redo_hints: HashMap::new(),
            last_stamp: stamp,
        })
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    /// This scope's id.
    pub fn scope_id(&self) -> &ScopeId {
        &self.id
    }

    /// The current apex node.
    pub fn apex(&self) -> NodeId {
        self.graph.apex()
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.graph.root()
    }

    /// True iff the apex has a parent to undo into.
    pub fn can_undo(&self) -> bool {
        self.graph.can_undo()
    }

    /// True iff the apex has at least one child to redo into.
    pub fn can_redo(&self) -> bool {
        self.graph.can_redo()
    }

    /// Read-only view of the commit graph.
    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    /// The shared content store.
    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// The shared type registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    // ---------------------------------------------------------------
    // Reading objects
    // ---------------------------------------------------------------

    /// Materialize a live handle for one tracked object at the apex.
    ///
    /// Returns `Ok(None)` if no ancestor commit introduced the object.
    pub fn shell<T: Versioned>(
        &mut self,
        entity: impl Into<EntityId>,
    ) -> ScopeResult<Option<Shell<'_, T>>> {
        let entity = entity.into();
        let tag = T::tag();
        if !self.registry.contains(&tag) {
            return Err(ScopeError::UnknownType(tag));
        }
        let Some(found) = self.graph.resolve(self.graph.apex(), &tag, &entity)? else {
            return Ok(None);
        };
        let hash = found.hash;
        let bytes = self
            .store
            .get(&hash)?
            .ok_or(ScopeError::BlobMissing(hash))?;
        let value = self.registry.decode::<T>(&bytes)?;
        Ok(Some(Shell::new(self, entity, value, hash)))
    }

    /// Materialize one tracked object's value at the apex, read-only.
    pub fn get<T: Versioned>(&self, entity: impl Into<EntityId>) -> ScopeResult<Option<T>> {
        self.object_at(self.graph.apex(), entity)
    }

    /// Materialize one tracked object's value at an arbitrary node, without
    /// moving the apex. Used to render ghost previews of other pasts and
    /// futures.
    pub fn object_at<T: Versioned>(
        &self,
        node: NodeId,
        entity: impl Into<EntityId>,
    ) -> ScopeResult<Option<T>> {
        let entity = entity.into();
        let tag = T::tag();
        if !self.registry.contains(&tag) {
            return Err(ScopeError::UnknownType(tag));
        }
        let Some(found) = self.graph.resolve(node, &tag, &entity)? else {
            return Ok(None);
        };
        let bytes = self
            .store
            .get(&found.hash)?
            .ok_or(ScopeError::BlobMissing(found.hash))?;
        Ok(Some(self.registry.decode::<T>(&bytes)?))
    }

    /// Raw blob lookup for callers that already hold a hash (e.g. from a
    /// [`ForkChoice`] ref).
    pub fn loaded_state(&self, hash: &ContentHash) -> ScopeResult<Option<Vec<u8>>> {
        Ok(self.store.get(hash)?)
    }

    // ---------------------------------------------------------------
    // Committing
    // ---------------------------------------------------------------

    /// Introduce a new tracked object (or overwrite an existing one) with a
    /// single-ref commit.
    ///
    /// Returns `Ok(None)` if the object already holds an identical state at
    /// the apex (no node is created).
    pub fn insert<T: Versioned>(
        &mut self,
        entity: impl Into<EntityId>,
        value: &T,
    ) -> ScopeResult<Option<NodeId>> {
        let entity = entity.into();
        validate_non_empty("entity", entity.as_str())?;
        let tag = T::tag();
        let bytes = self.registry.encode(value)?;
        let hash = ContentHasher::BLOB.hash(&bytes);

        let current = self
            .graph
            .resolve(self.graph.apex(), &tag, &entity)?
            .map(|r| r.hash);
        if current == Some(hash) {
            return Ok(None);
        }

        self.store.put(&bytes)?;
        let node = self.commit_changes(vec![ContentRef::new(tag, entity, hash)])?;
        Ok(Some(node))
    }

    /// Commit every staged change in a batch as one node.
    ///
    /// Staged entries whose bytes hash identically to the object's current
    /// state are dropped; if nothing substantive remains, no node is created
    /// and `Ok(None)` is returned.
    pub fn commit_batch(&mut self, batch: Batch) -> ScopeResult<Option<NodeId>> {
        let apex = self.graph.apex();
        let mut changed = Vec::new();
        for ((tag, entity), bytes) in batch.into_staged() {
            let hash = ContentHasher::BLOB.hash(&bytes);
            let current = self.graph.resolve(apex, &tag, &entity)?.map(|r| r.hash);
            if current == Some(hash) {
                continue;
            }
            self.store.put(&bytes)?;
            changed.push(ContentRef::new(tag, entity, hash));
        }
        if changed.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.commit_changes(changed)?))
    }

    /// Append a node carrying `changed` as a child of the apex and advance
    /// the apex to it.
    ///
    /// This is the fork point: if the old apex already had children (the user
    /// had undone past this point), the new node becomes an additional
    /// sibling -- the old future is kept, just no longer the default redo
    /// target.
    pub(crate) fn commit_changes(&mut self, changed: Vec<ContentRef>) -> ScopeResult<NodeId> {
        let old_apex = self.graph.apex();
        let stamp = self.tick();
        let node = self.graph.commit(old_apex, changed, stamp)?;
        self.graph.set_apex(node)?;
        // A fresh edit from this point invalidates the previously preferred
        // future: drop the hint recorded here and any hints inside the
        // sibling subtrees it used to lead into.
        if let Some(stale) = self.redo_hints.remove(&old_apex) {
            debug!(
                node = %old_apex.short_id(),
                stale = %stale.short_id(),
                "cleared stale redo hint"
            );
            let mut queue: VecDeque<NodeId> = self
                .graph
                .children_of(old_apex)
                .iter()
                .filter(|id| **id != node)
                .copied()
                .collect();
            while let Some(id) = queue.pop_front() {
                self.redo_hints.remove(&id);
                queue.extend(self.graph.children_of(id).iter().copied());
            }
        }
        debug!(scope = %self.id, node = %node.short_id(), "committed");
        Ok(node)
    }

    fn tick(&mut self) -> Stamp {
        let stamp = self.last_stamp.next();
        self.last_stamp = stamp;
        stamp
    }

    // ---------------------------------------------------------------
    // Undo / redo / time-travel
    // ---------------------------------------------------------------

    /// Move the apex to its parent.
    ///
    /// Records which child we departed from, so a later [`move_forward`] can
    /// return along the same line. Fails with [`ScopeError::AtRoot`] at the
    /// root.
    ///
    /// [`move_forward`]: Scope::move_forward
    pub fn move_back(&mut self) -> ScopeResult<NodeId> {
        let apex = self.graph.apex();
        let Some(parent) = self.graph.apex_node().parent else {
            return Err(ScopeError::AtRoot);
        };
        self.redo_hints.insert(parent, apex);
        self.graph.set_apex(parent)?;
        debug!(scope = %self.id, apex = %parent.short_id(), "moved back");
        Ok(parent)
    }

    /// Move the apex to a child.
    ///
    /// With one child the move is unambiguous. With several, the redo hint
    /// recorded by the undo that left this node decides; without a usable
    /// hint this fails with [`ScopeError::ForkAmbiguous`] and the apex does
    /// not move -- the caller should present [`fork_choices`] and pick with
    /// [`move_to`]. Fails with [`ScopeError::AtTip`] at a leaf.
    ///
    /// [`fork_choices`]: Scope::fork_choices
    /// [`move_to`]: Scope::move_to
    pub fn move_forward(&mut self) -> ScopeResult<NodeId> {
        let apex = self.graph.apex();
        let target = match self.graph.children_of(apex) {
            [] => return Err(ScopeError::AtTip),
            [only] => *only,
            many => match self.redo_hints.get(&apex) {
                Some(hint) if many.contains(hint) => *hint,
                Some(stale) => {
                    warn!(
                        node = %apex.short_id(),
                        stale = %stale.short_id(),
                        "redo hint no longer names a child"
                    );
                    return Err(ScopeError::ForkAmbiguous { node: apex });
                }
                None => return Err(ScopeError::ForkAmbiguous { node: apex }),
            },
        };
        self.graph.set_apex(target)?;
        debug!(scope = %self.id, apex = %target.short_id(), "moved forward");
        Ok(target)
    }

    /// Time-travel to any node in this scope's graph.
    ///
    /// Always legal for browsing history; only the apex pointer moves. Fails
    /// with [`ScopeError::NodeNotFound`] for ids from another scope.
    pub fn move_to(&mut self, node: NodeId) -> ScopeResult<()> {
        self.graph.set_apex(node)?;
        debug!(scope = %self.id, apex = %node.short_id(), "moved to node");
        Ok(())
    }

    /// Enumerate the branches available at the current apex.
    ///
    /// Entries come in commit order (most recent last); `same_line` marks
    /// the child a plain redo would prefer.
    pub fn fork_choices(&self) -> Vec<ForkChoice> {
        let apex = self.graph.apex();
        let hint = self.redo_hints.get(&apex);
        self.graph
            .children_of(apex)
            .iter()
            .map(|id| ForkChoice {
                node: *id,
                same_line: hint == Some(id),
                changed: self
                    .graph
                    .node(*id)
                    .map(|n| n.changed.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// The apex's ancestry as log entries, most recent first.
    pub fn history(&self, limit: usize) -> ScopeResult<Vec<HistoryEntry>> {
        let path = self.graph.path(self.graph.apex())?;
        Ok(path
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| self.graph.node(*id))
            .map(|node| HistoryEntry {
                node: node.id,
                stamp: node.stamp,
                changed: node.changed.clone(),
            })
            .collect())
    }

    pub(crate) fn restore(
        id: ScopeId,
        graph: CommitGraph,
        store: Arc<dyn ContentStore>,
        registry: Arc<Registry>,
        last_stamp: Stamp,
    ) -> Self {
        Self {
            id,
            graph,
            store,
            registry,
            redo_hints: HashMap::new(),
            last_stamp,
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("nodes", &self.graph.len())
            .field("apex", &self.graph.apex())
            .finish()
    }
}
