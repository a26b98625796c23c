// src/dag/builder.rs

//! Stack-scoped graph construction.
//!
//! [`GraphBuilder`] pairs a [`TaskGraph`] with its own [`ScopeStack`]. Every
//! push goes through a [`ScopeGuard`], which pops on drop, so the stack is
//! restored on every exit path: `?`, early return or panic.

use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::dag::graph::TaskGraph;
use crate::dag::node::{GroupOptions, NodeRef};
use crate::dag::scope::ScopeId;
use crate::dag::stack::ScopeStack;
use crate::errors::{FlowdagError, Result};

#[derive(Debug, Clone)]
pub struct GraphBuilder<H> {
    graph: TaskGraph<H>,
    stack: ScopeStack,
}

impl<H> GraphBuilder<H> {
    /// New builder whose outermost scope is `root_id`. Nothing is open yet;
    /// call [`enter`](Self::enter) first.
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            graph: TaskGraph::new(root_id),
            stack: ScopeStack::new(),
        }
    }

    /// Open the outermost scope.
    pub fn enter(&mut self) -> ScopeGuard<'_, H> {
        let root = self.graph.root();
        ScopeGuard::push(self, root)
    }

    /// Register a group in the current scope and open its nested scope.
    pub fn group(&mut self, id: impl Into<String>, options: GroupOptions) -> Result<ScopeGuard<'_, H>> {
        let current = self.current_scope()?;
        let (_node, nested) = self.graph.add_group(current, id, options)?;
        Ok(ScopeGuard::push(self, nested))
    }

    /// Innermost open scope.
    pub fn current_scope(&self) -> Result<ScopeId> {
        self.stack.current().ok_or(FlowdagError::NoActiveScope)
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Register a task in the current scope.
    pub fn task(&mut self, id: impl Into<String>, handle: H) -> Result<NodeRef> {
        let current = self.current_scope()?;
        self.graph.add_task(current, id, handle)
    }

    pub fn before(&mut self, upstream: &NodeRef, downstream: &NodeRef) -> Result<NodeRef> {
        let current = self.current_scope()?;
        self.graph.before(current, upstream, downstream)
    }

    pub fn before_all(&mut self, upstream: &NodeRef, downstream: &[NodeRef]) -> Result<Vec<NodeRef>> {
        let current = self.current_scope()?;
        self.graph.before_all(current, upstream, downstream)
    }

    pub fn after(&mut self, downstream: &NodeRef, upstream: &NodeRef) -> Result<NodeRef> {
        let current = self.current_scope()?;
        self.graph.after(current, downstream, upstream)
    }

    pub fn after_all(&mut self, downstream: &NodeRef, upstream: &[NodeRef]) -> Result<Vec<NodeRef>> {
        let current = self.current_scope()?;
        self.graph.after_all(current, downstream, upstream)
    }

    pub fn graph(&self) -> &TaskGraph<H> {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut TaskGraph<H> {
        &mut self.graph
    }

    pub fn into_graph(self) -> TaskGraph<H> {
        self.graph
    }

    pub(crate) fn push_scope(&mut self, scope: ScopeId) {
        self.stack.push(scope);
    }

    /// Pop the top of the stack, warning if it is not `expected`.
    pub(crate) fn pop_scope(&mut self, expected: ScopeId) {
        match self.stack.pop() {
            Some(popped) if popped == expected => {}
            Some(popped) => {
                warn!(
                    expected = expected.index(),
                    popped = popped.index(),
                    "scope stack out of order on pop"
                );
            }
            None => warn!(expected = expected.index(), "pop on empty scope stack"),
        }
    }
}

/// An open scope. Derefs to the builder; pops the scope when dropped.
pub struct ScopeGuard<'b, H> {
    builder: &'b mut GraphBuilder<H>,
    scope: ScopeId,
}

impl<'b, H> ScopeGuard<'b, H> {
    fn push(builder: &'b mut GraphBuilder<H>, scope: ScopeId) -> Self {
        builder.push_scope(scope);
        Self { builder, scope }
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl<H> Deref for ScopeGuard<'_, H> {
    type Target = GraphBuilder<H>;

    fn deref(&self) -> &Self::Target {
        &*self.builder
    }
}

impl<H> DerefMut for ScopeGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.builder
    }
}

impl<H> Drop for ScopeGuard<'_, H> {
    fn drop(&mut self) {
        self.builder.pop_scope(self.scope);
    }
}
