// src/dag/tree.rs

//! Text rendering of a finished graph, for logs and `--dry-run` style output.
//!
//! The traversal starts at every root of a scope and follows outgoing edges,
//! indenting one step per hop and per nested group. Depth is purely cosmetic.

use crate::dag::graph::TaskGraph;
use crate::dag::node::DependencyNode;
use crate::dag::scope::ScopeId;

/// Render `scope` (and nested groups) starting at indentation `level`.
pub fn render_tree<H>(graph: &TaskGraph<H>, scope: ScopeId, level: usize) -> String {
    let mut lines = Vec::new();
    render_scope(graph, scope, level, &mut lines);
    lines.join("\n")
}

/// Returns the deepest level reached.
fn render_scope<H>(graph: &TaskGraph<H>, scope: ScopeId, level: usize, lines: &mut Vec<String>) -> usize {
    let roots = graph.scope(scope).root_keys();
    roots
        .into_iter()
        .map(|root| render_node(graph, scope, root, level, lines))
        .max()
        .unwrap_or(level)
}

fn render_node<H>(
    graph: &TaskGraph<H>,
    scope: ScopeId,
    key: &str,
    level: usize,
    lines: &mut Vec<String>,
) -> usize {
    lines.push(format!("{}{}", " ".repeat(level), key));

    let current = graph.scope(scope);
    let mut updated = level;

    if let Some(DependencyNode::Group(group)) = current.member(key) {
        if group.id != current.id() {
            updated = render_scope(graph, group.scope, level + 1, lines);
        }
    }

    for next in current.dependents_of(key) {
        updated += 1;
        render_node(graph, scope, next, updated, lines);
    }

    updated
}
