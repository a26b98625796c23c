// src/dag/mod.rs

//! Dependency graph construction.
//!
//! - [`node`] defines task and group vertices.
//! - [`scope`] holds one task group's members and mirrored edge maps,
//!   and derives roots and leaves.
//! - [`graph`] is the arena of all scopes of a pipeline.
//! - [`stack`] tracks which scope is currently open.
//! - [`builder`] pairs a graph with its stack behind drop guards.
//! - [`tree`] renders a finished graph for diagnostics.

pub mod builder;
pub mod graph;
pub mod node;
pub mod scope;
pub mod stack;
pub mod tree;

pub use builder::{GraphBuilder, ScopeGuard};
pub use graph::TaskGraph;
pub use node::{DependencyNode, GroupNode, GroupOptions, NodeKind, NodeRef, TaskNode};
pub use scope::{Scope, ScopeId};
pub use stack::ScopeStack;
pub use tree::render_tree;
