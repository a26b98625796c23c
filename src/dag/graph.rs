// src/dag/graph.rs

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::node::{DependencyNode, GroupNode, GroupOptions, NodeRef, TaskNode};
use crate::dag::scope::{Scope, ScopeId};
use crate::errors::{FlowdagError, Result};

/// All scopes of one pipeline, stored as an arena.
///
/// Scope `0` is the outermost one. Every group node owns exactly one nested
/// scope; a nested scope points back at its parent by index only.
///
/// Edges are always declared *in* a scope, and both endpoints must be
/// registered in that scope or one of its ancestors.
#[derive(Debug, Clone)]
pub struct TaskGraph<H> {
    scopes: Vec<Scope<H>>,
}

impl<H> TaskGraph<H> {
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            scopes: vec![Scope::new(root_id, None, 1)],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Panics if `id` was not produced by this graph.
    pub fn scope(&self, id: ScopeId) -> &Scope<H> {
        &self.scopes[id.0]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope<H>)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i), s))
    }

    pub fn register_node(&mut self, scope: ScopeId, node: DependencyNode<H>) -> Result<NodeRef> {
        let node_ref = node.to_ref();
        self.scopes[scope.0].register(node)?;
        Ok(node_ref)
    }

    /// Wrap `handle` as a task and register it in `scope`.
    pub fn add_task(&mut self, scope: ScopeId, id: impl Into<String>, handle: H) -> Result<NodeRef> {
        let id = id.into();
        self.register_node(scope, DependencyNode::Task(TaskNode { id, handle }))
    }

    /// Register a group node in `scope` and create the scope it owns.
    ///
    /// Returns the group's reference together with its nested scope.
    pub fn add_group(
        &mut self,
        scope: ScopeId,
        id: impl Into<String>,
        options: GroupOptions,
    ) -> Result<(NodeRef, ScopeId)> {
        let id = id.into();
        let parent = &self.scopes[scope.0];
        if parent.contains(&id) {
            return Err(FlowdagError::DuplicateId {
                id,
                scope: parent.id().to_string(),
            });
        }

        let nested = ScopeId(self.scopes.len());
        let level = parent.level() + 1;
        self.scopes.push(Scope::new(id.clone(), Some(scope), level));

        let node_ref = self.register_node(
            scope,
            DependencyNode::Group(GroupNode {
                id,
                scope: nested,
                options,
            }),
        )?;
        debug!(group = %node_ref, level, "opened nested task group");
        Ok((node_ref, nested))
    }

    /// Find `id` in `scope` or the closest ancestor that registered it.
    pub fn lookup(&self, scope: ScopeId, id: &str) -> Option<&DependencyNode<H>> {
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            let s = &self.scopes[current.0];
            if let Some(node) = s.member(id) {
                return Some(node);
            }
            cursor = s.parent();
        }
        None
    }

    /// External handle of the task registered as `id`.
    pub fn handle(&self, scope: ScopeId, id: &str) -> Result<&H> {
        match self.lookup(scope, id) {
            Some(DependencyNode::Task(task)) => Ok(&task.handle),
            Some(DependencyNode::Group(_)) => Err(FlowdagError::NotATask(id.to_string())),
            None => Err(self.unknown(scope, id)),
        }
    }

    /// Declare that `upstream` must complete before `downstream`.
    ///
    /// Returns `Ok(false)` if the edge was already present. Fails with
    /// [`FlowdagError::DagCycle`] when `downstream` already reaches
    /// `upstream` through edges declared in any scope; nothing is recorded
    /// in that case.
    pub fn declare_edge(&mut self, scope: ScopeId, upstream: &NodeRef, downstream: &NodeRef) -> Result<bool> {
        let up_owner = self
            .owner(scope, upstream.id())
            .ok_or_else(|| self.unknown(scope, upstream.id()))?;
        let down_owner = self
            .owner(scope, downstream.id())
            .ok_or_else(|| self.unknown(scope, downstream.id()))?;

        if self.scopes[scope.0].has_edge(upstream.id(), downstream.id()) {
            return Ok(false);
        }
        if self.reaches((down_owner, downstream.id()), (up_owner, upstream.id())) {
            return Err(FlowdagError::DagCycle(format!(
                "edge '{}' -> '{}' would close a cycle in group '{}'",
                upstream.id(),
                downstream.id(),
                self.scopes[scope.0].id()
            )));
        }
        Ok(self.scopes[scope.0].insert_edge(upstream.id(), downstream.id()))
    }

    /// Closest scope, starting at `scope`, that registered `id`.
    fn owner(&self, scope: ScopeId, id: &str) -> Option<ScopeId> {
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            let s = &self.scopes[current.0];
            if s.contains(id) {
                return Some(current);
            }
            cursor = s.parent();
        }
        None
    }

    /// Whether `to` is reachable from `from` over the edges of every scope.
    ///
    /// Nodes are keyed by the scope that registered them, so the same id
    /// in two sibling groups stays two distinct vertices.
    fn reaches(&self, from: (ScopeId, &str), to: (ScopeId, &str)) -> bool {
        if from == to {
            return true;
        }

        let mut graph: DiGraphMap<(usize, &str), ()> = DiGraphMap::new();
        for (index, scope) in self.scopes.iter().enumerate() {
            for (up, downs) in scope.upstream_edges() {
                let Some(up_owner) = self.owner(ScopeId(index), up) else {
                    continue;
                };
                for down in downs {
                    if let Some(down_owner) = self.owner(ScopeId(index), down) {
                        graph.add_edge((up_owner.0, up.as_str()), (down_owner.0, down.as_str()), ());
                    }
                }
            }
        }

        let (from, to) = ((from.0.0, from.1), (to.0.0, to.1));
        if !graph.contains_node(from) || !graph.contains_node(to) {
            return false;
        }
        has_path_connecting(&graph, from, to, None)
    }

    /// `upstream` before `downstream`; yields `downstream` for chaining.
    pub fn before(&mut self, scope: ScopeId, upstream: &NodeRef, downstream: &NodeRef) -> Result<NodeRef> {
        self.declare_edge(scope, upstream, downstream)?;
        Ok(downstream.clone())
    }

    /// One edge from `upstream` to each element of `downstream`, in order.
    pub fn before_all(
        &mut self,
        scope: ScopeId,
        upstream: &NodeRef,
        downstream: &[NodeRef],
    ) -> Result<Vec<NodeRef>> {
        downstream
            .iter()
            .map(|down| self.before(scope, upstream, down))
            .collect()
    }

    /// `downstream` after `upstream`; yields `upstream` for chaining.
    pub fn after(&mut self, scope: ScopeId, downstream: &NodeRef, upstream: &NodeRef) -> Result<NodeRef> {
        self.declare_edge(scope, upstream, downstream)?;
        Ok(upstream.clone())
    }

    /// One edge from each element of `upstream` to `downstream`, in order.
    pub fn after_all(
        &mut self,
        scope: ScopeId,
        downstream: &NodeRef,
        upstream: &[NodeRef],
    ) -> Result<Vec<NodeRef>> {
        upstream
            .iter()
            .map(|up| self.after(scope, downstream, up))
            .collect()
    }

    pub fn roots(&self, scope: ScopeId) -> Vec<&DependencyNode<H>> {
        self.scopes[scope.0]
            .root_keys()
            .into_iter()
            .filter_map(|key| self.lookup(scope, key))
            .collect()
    }

    pub fn leaves(&self, scope: ScopeId) -> Vec<&DependencyNode<H>> {
        self.scopes[scope.0]
            .leaf_keys()
            .into_iter()
            .filter_map(|key| self.lookup(scope, key))
            .collect()
    }

    /// Every task in the graph, depth-first through groups, in registration
    /// order.
    pub fn tasks(&self) -> Vec<&TaskNode<H>> {
        let mut out = Vec::new();
        self.collect_tasks(self.root(), &mut out);
        out
    }

    fn collect_tasks<'g>(&'g self, scope: ScopeId, out: &mut Vec<&'g TaskNode<H>>) {
        for node in self.scopes[scope.0].members() {
            match node {
                DependencyNode::Task(task) => out.push(task),
                DependencyNode::Group(group) => self.collect_tasks(group.scope, out),
            }
        }
    }

    fn unknown(&self, scope: ScopeId, id: &str) -> FlowdagError {
        FlowdagError::UnknownNode {
            id: id.to_string(),
            scope: self.scopes[scope.0].id().to_string(),
        }
    }
}
