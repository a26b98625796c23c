// src/dag/node.rs

//! Graph vertices: tasks wrapping an external handle, and groups owning a
//! nested scope.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::dag::scope::ScopeId;

/// Whether a node is a plain task or a task group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Task,
    Group,
}

/// Lightweight reference to a registered node, used to declare edges.
///
/// Identity is the node id; two refs with the same id are equal whatever
/// their kind.
#[derive(Debug, Clone)]
pub struct NodeRef {
    id: String,
    kind: NodeKind,
}

impl NodeRef {
    pub(crate) fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeRef {}

impl Hash for NodeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Free-form parameters attached to a task group and handed to the
/// orchestrator backend unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOptions {
    pub params: BTreeMap<String, String>,
}

impl GroupOptions {
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A task vertex carrying the scheduler-native handle produced by the job.
#[derive(Debug, Clone)]
pub struct TaskNode<H> {
    pub id: String,
    pub handle: H,
}

/// A group vertex; its members and edges live in the scope it owns.
#[derive(Debug, Clone)]
pub struct GroupNode {
    pub id: String,
    pub scope: ScopeId,
    pub options: GroupOptions,
}

#[derive(Debug, Clone)]
pub enum DependencyNode<H> {
    Task(TaskNode<H>),
    Group(GroupNode),
}

impl<H> DependencyNode<H> {
    pub fn id(&self) -> &str {
        match self {
            DependencyNode::Task(task) => &task.id,
            DependencyNode::Group(group) => &group.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            DependencyNode::Task(_) => NodeKind::Task,
            DependencyNode::Group(_) => NodeKind::Group,
        }
    }

    pub fn to_ref(&self) -> NodeRef {
        NodeRef::new(self.id(), self.kind())
    }

    pub fn as_task(&self) -> Option<&TaskNode<H>> {
        match self {
            DependencyNode::Task(task) => Some(task),
            DependencyNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            DependencyNode::Task(_) => None,
            DependencyNode::Group(group) => Some(group),
        }
    }
}

impl<H> PartialEq for DependencyNode<H> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<H> Eq for DependencyNode<H> {}

impl<H> Hash for DependencyNode<H> {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.id().hash(state);
    }
}
