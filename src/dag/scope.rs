// src/dag/scope.rs

//! A single builder context: an ordered member registry plus two mirrored
//! adjacency maps.

use indexmap::{IndexMap, IndexSet};
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::node::DependencyNode;
use crate::errors::{FlowdagError, Result};

/// Index of a scope inside its owning [`TaskGraph`](crate::dag::TaskGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) usize);

impl ScopeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Members and edges of one task group.
///
/// Edges are stored twice:
/// - `upstream[a]` holds every `b` such that `a` must complete before `b`
/// - `downstream[b]` holds every `a` such that `a` must complete before `b`
///
/// Both maps are kept as exact mirrors of each other.
#[derive(Debug, Clone)]
pub struct Scope<H> {
    id: String,
    parent: Option<ScopeId>,
    level: usize,
    members: IndexMap<String, DependencyNode<H>>,
    upstream: IndexMap<String, IndexSet<String>>,
    downstream: IndexMap<String, IndexSet<String>>,
}

impl<H> Scope<H> {
    pub(crate) fn new(id: impl Into<String>, parent: Option<ScopeId>, level: usize) -> Self {
        Self {
            id: id.into(),
            parent,
            level,
            members: IndexMap::new(),
            upstream: IndexMap::new(),
            downstream: IndexMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Enclosing scope, if any. This never keeps the parent alive; it is a
    /// plain index into the same graph.
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Nesting depth; the outermost scope is level 1.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn members(&self) -> impl Iterator<Item = &DependencyNode<H>> {
        self.members.values()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(|s| s.as_str())
    }

    pub fn member(&self, id: &str) -> Option<&DependencyNode<H>> {
        self.members.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn upstream_edges(&self) -> &IndexMap<String, IndexSet<String>> {
        &self.upstream
    }

    pub fn downstream_edges(&self) -> &IndexMap<String, IndexSet<String>> {
        &self.downstream
    }

    /// Nodes that directly wait on `id` in this scope.
    pub fn dependents_of(&self, id: &str) -> impl Iterator<Item = &str> {
        self.upstream
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(|s| s.as_str()))
    }

    /// Nodes `id` directly waits on in this scope.
    pub fn dependencies_of(&self, id: &str) -> impl Iterator<Item = &str> {
        self.downstream
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(|s| s.as_str()))
    }

    pub fn has_edge(&self, upstream: &str, downstream: &str) -> bool {
        self.upstream
            .get(upstream)
            .is_some_and(|set| set.contains(downstream))
    }

    pub fn edge_count(&self) -> usize {
        self.upstream.values().map(|set| set.len()).sum()
    }

    /// Ids with no incoming edge.
    ///
    /// When no edge has been declared at all, every member is a root.
    pub fn root_keys(&self) -> Vec<&str> {
        if self.upstream.is_empty() && self.downstream.is_empty() {
            return self.member_ids().collect();
        }
        self.upstream
            .keys()
            .filter(|key| !self.downstream.contains_key(*key))
            .map(|s| s.as_str())
            .collect()
    }

    /// Ids with no outgoing edge.
    ///
    /// When no edge has been declared at all, every member is a leaf.
    pub fn leaf_keys(&self) -> Vec<&str> {
        if self.upstream.is_empty() && self.downstream.is_empty() {
            return self.member_ids().collect();
        }
        self.downstream
            .keys()
            .filter(|key| !self.upstream.contains_key(*key))
            .map(|s| s.as_str())
            .collect()
    }

    /// Insert a node, preserving registration order.
    pub(crate) fn register(&mut self, node: DependencyNode<H>) -> Result<()> {
        if self.members.contains_key(node.id()) {
            return Err(FlowdagError::DuplicateId {
                id: node.id().to_string(),
                scope: self.id.clone(),
            });
        }
        debug!(scope = %self.id, node = %node.id(), "registered dependency");
        self.members.insert(node.id().to_string(), node);
        Ok(())
    }

    /// Record `upstream -> downstream` in both maps.
    ///
    /// Returns `false` when the edge already existed. Cycle checks span
    /// several scopes and are done by the owning graph before calling this.
    pub(crate) fn insert_edge(&mut self, upstream: &str, downstream: &str) -> bool {
        if self.has_edge(upstream, downstream) {
            return false;
        }

        self.upstream
            .entry(upstream.to_string())
            .or_default()
            .insert(downstream.to_string());
        self.downstream
            .entry(downstream.to_string())
            .or_default()
            .insert(upstream.to_string());

        debug!(scope = %self.id, %upstream, %downstream, "declared dependency edge");
        true
    }

    /// Whether `to` is reachable from `from` following the edges declared in
    /// this scope only. A node always reaches itself.
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for (up, downs) in self.upstream.iter() {
            for down in downs.iter() {
                graph.add_edge(up.as_str(), down.as_str(), ());
            }
        }

        if !graph.contains_node(from) || !graph.contains_node(to) {
            return false;
        }
        has_path_connecting(&graph, from, to, None)
    }
}
