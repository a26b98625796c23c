// tests/graph_properties.rs

use std::collections::BTreeSet;

use proptest::prelude::*;

use flowdag::dag::{GraphBuilder, NodeRef, TaskGraph};
use flowdag::errors::FlowdagError;

/// Build a graph of `size` tasks and try to declare every `(up, down)` pair.
/// Returns the graph and how many declarations were rejected as cycles.
fn build(size: usize, edges: &[(usize, usize)]) -> (TaskGraph<usize>, usize) {
    let mut builder = GraphBuilder::new("prop");
    let mut rejected = 0;
    {
        let mut root = builder.enter();
        let nodes: Vec<NodeRef> = (0..size)
            .map(|i| root.task(format!("t{i}"), i).expect("unique ids"))
            .collect();
        for &(up, down) in edges {
            match root.before(&nodes[up % size], &nodes[down % size]) {
                Ok(_) => {}
                Err(FlowdagError::DagCycle(_)) => rejected += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
    }
    (builder.into_graph(), rejected)
}

fn forward_edges(size: usize, raw: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    raw.into_iter()
        .map(|(a, b)| (a % size, b % size))
        .filter(|(a, b)| a < b)
        .collect()
}

proptest! {
    #[test]
    fn edgeless_scope_roots_and_leaves_are_all_members(size in 1usize..12) {
        let (graph, _) = build(size, &[]);
        let root = graph.root();
        let members: BTreeSet<_> = graph.scope(root).member_ids().map(str::to_string).collect();
        let roots: BTreeSet<_> = graph.roots(root).iter().map(|n| n.id().to_string()).collect();
        let leaves: BTreeSet<_> = graph.leaves(root).iter().map(|n| n.id().to_string()).collect();
        prop_assert_eq!(&roots, &members);
        prop_assert_eq!(&leaves, &members);
    }

    #[test]
    fn roots_have_no_incoming_and_leaves_no_outgoing(
        size in 2usize..12,
        raw in proptest::collection::vec((0usize..64, 0usize..64), 1..30),
    ) {
        let edges = forward_edges(size, raw);
        let (graph, rejected) = build(size, &edges);
        prop_assert_eq!(rejected, 0);

        let root = graph.root();
        let scope = graph.scope(root);
        let targets: BTreeSet<&str> = scope.downstream_edges().keys().map(|k| k.as_str()).collect();
        let sources: BTreeSet<&str> = scope.upstream_edges().keys().map(|k| k.as_str()).collect();

        for node in graph.roots(root) {
            prop_assert!(!targets.contains(node.id()));
        }
        for node in graph.leaves(root) {
            prop_assert!(!sources.contains(node.id()));
        }
    }

    #[test]
    fn redeclaring_edges_changes_nothing(
        size in 2usize..10,
        raw in proptest::collection::vec((0usize..64, 0usize..64), 0..20),
    ) {
        let edges = forward_edges(size, raw);
        let (once, _) = build(size, &edges);
        let doubled: Vec<_> = edges.iter().chain(edges.iter()).copied().collect();
        let (twice, _) = build(size, &doubled);

        let a = once.scope(once.root());
        let b = twice.scope(twice.root());
        prop_assert_eq!(a.upstream_edges().len(), b.upstream_edges().len());
        prop_assert_eq!(a.downstream_edges().len(), b.downstream_edges().len());
        prop_assert_eq!(a.edge_count(), b.edge_count());
    }

    #[test]
    fn arbitrary_edges_keep_maps_mirrored_and_acyclic(
        size in 1usize..10,
        raw in proptest::collection::vec((0usize..64, 0usize..64), 0..40),
    ) {
        let (graph, _) = build(size, &raw);
        let scope = graph.scope(graph.root());

        let mut forward = 0;
        for (up, downs) in scope.upstream_edges() {
            for down in downs {
                forward += 1;
                prop_assert!(scope.downstream_edges()[down].contains(up));
                prop_assert!(!scope.reaches(down, up), "cycle through {} -> {}", up, down);
            }
        }
        let backward: usize = scope.downstream_edges().values().map(|s| s.len()).sum();
        prop_assert_eq!(forward, backward);
    }
}
