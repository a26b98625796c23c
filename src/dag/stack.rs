// src/dag/stack.rs

use crate::dag::scope::ScopeId;

/// Stack of open scopes; the top is where new declarations land.
///
/// There is no locking here. A stack belongs to exactly one construction
/// context (one [`GraphBuilder`](crate::dag::GraphBuilder) or one
/// [`Pipeline`](crate::pipeline::Pipeline)); build independent graphs on
/// other threads with their own builders.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeId>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scope: ScopeId) {
        self.frames.push(scope);
    }

    pub fn pop(&mut self) -> Option<ScopeId> {
        self.frames.pop()
    }

    /// Innermost open scope, or `None` when nothing is open.
    pub fn current(&self) -> Option<ScopeId> {
        self.frames.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
