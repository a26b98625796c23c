// tests/scope_graph.rs

mod common;
use crate::common::init_tracing;

use std::collections::BTreeSet;
use std::error::Error;

use flowdag::dag::{GraphBuilder, GroupOptions, NodeKind, render_tree};
use flowdag::errors::FlowdagError;

type TestResult = Result<(), Box<dyn Error>>;

fn ids<'a>(nodes: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    nodes.into_iter().map(|s| s.to_string()).collect()
}

#[test]
fn unconnected_members_are_both_roots_and_leaves() -> TestResult {
    init_tracing();
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    root.task("a", 1)?;
    root.task("b", 2)?;
    root.task("c", 3)?;
    drop(root);

    let graph = builder.graph();
    let roots = ids(graph.roots(graph.root()).iter().map(|n| n.id()));
    let leaves = ids(graph.leaves(graph.root()).iter().map(|n| n.id()));

    assert_eq!(roots, ids(["a", "b", "c"]));
    assert_eq!(leaves, roots);
    Ok(())
}

#[test]
fn roots_and_leaves_follow_edges() -> TestResult {
    init_tracing();
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let a = root.task("a", ())?;
    let b = root.task("b", ())?;
    let c = root.task("c", ())?;
    let d = root.task("d", ())?;

    // a >> [b, c] >> d
    let fanned = root.before_all(&a, &[b.clone(), c.clone()])?;
    assert_eq!(fanned, vec![b.clone(), c.clone()]);
    root.after_all(&d, &[b, c])?;

    let scope = root.current_scope()?;
    let graph = root.graph();
    let roots: Vec<_> = graph.roots(scope).iter().map(|n| n.id().to_string()).collect();
    let leaves: Vec<_> = graph.leaves(scope).iter().map(|n| n.id().to_string()).collect();
    assert_eq!(roots, vec!["a"]);
    assert_eq!(leaves, vec!["d"]);
    Ok(())
}

#[test]
fn before_and_after_return_the_node_passed_in() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let a = root.task("a", ())?;
    let b = root.task("b", ())?;
    let c = root.task("c", ())?;

    let chained = root.before(&a, &b)?;
    assert_eq!(chained, b);
    let upstream = root.after(&c, &b)?;
    assert_eq!(upstream, b);

    let scope = root.graph().scope(root.current_scope()?);
    assert!(scope.has_edge("a", "b"));
    assert!(scope.has_edge("b", "c"));
    Ok(())
}

#[test]
fn declaring_an_edge_twice_is_a_no_op() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let a = root.task("a", ())?;
    let b = root.task("b", ())?;
    root.before(&a, &b)?;

    let scope_id = root.current_scope()?;
    let (up, down) = {
        let scope = root.graph().scope(scope_id);
        (scope.upstream_edges().len(), scope.downstream_edges().len())
    };

    root.before(&a, &b)?;
    root.after(&b, &a)?;

    let scope = root.graph().scope(scope_id);
    assert_eq!(scope.upstream_edges().len(), up);
    assert_eq!(scope.downstream_edges().len(), down);
    assert_eq!(scope.edge_count(), 1);
    Ok(())
}

#[test]
fn duplicate_id_in_same_scope_fails() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    root.task("load", ())?;

    match root.task("load", ()) {
        Err(FlowdagError::DuplicateId { id, scope }) => {
            assert_eq!(id, "load");
            assert_eq!(scope, "pipeline");
        }
        other => panic!("expected DuplicateId, got {other:?}"),
    }
    Ok(())
}

#[test]
fn same_id_in_different_scopes_is_allowed() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    root.task("load", ())?;
    {
        let mut group = root.group("sales", GroupOptions::default())?;
        group.task("load", ())?;
        assert_eq!(group.depth(), 2);
    }
    assert_eq!(root.depth(), 1);
    Ok(())
}

#[test]
fn task_outside_any_scope_fails() {
    let mut builder: GraphBuilder<()> = GraphBuilder::new("pipeline");
    let err = builder.task("orphan", ()).unwrap_err();
    assert!(matches!(err, FlowdagError::NoActiveScope));
    assert!(err.to_string().contains("No task group context found"));
}

#[test]
fn cycles_are_rejected_and_leave_edges_mirrored() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let a = root.task("a", ())?;
    let b = root.task("b", ())?;
    let c = root.task("c", ())?;
    root.before(&a, &b)?;
    root.before(&b, &c)?;

    let err = root.before(&c, &a).unwrap_err();
    assert!(matches!(err, FlowdagError::DagCycle(_)));
    let err = root.before(&a, &a).unwrap_err();
    assert!(matches!(err, FlowdagError::DagCycle(_)));

    let scope = root.graph().scope(root.current_scope()?);
    assert_eq!(scope.edge_count(), 2);
    for (up, downs) in scope.upstream_edges() {
        for down in downs {
            assert!(scope.downstream_edges()[down].contains(up));
        }
    }
    Ok(())
}

#[test]
fn edge_to_unregistered_node_fails() -> TestResult {
    let mut other = GraphBuilder::new("other");
    let foreign = other.enter().task("ghost", ())?;

    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let a = root.task("a", ())?;

    match root.before(&a, &foreign) {
        Err(FlowdagError::UnknownNode { id, .. }) => assert_eq!(id, "ghost"),
        other => panic!("expected UnknownNode, got {other:?}"),
    }
    Ok(())
}

#[test]
fn nested_group_can_depend_on_parent_members() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let start = root.task("start", ())?;
    {
        let mut group = root.group("sales", GroupOptions::default().with_param("tooltip", "sales"))?;
        let load = group.task("load_orders", ())?;
        group.before(&start, &load)?;

        let scope = group.graph().scope(group.current_scope()?);
        assert_eq!(scope.level(), 2);
        assert!(scope.has_edge("start", "load_orders"));
    }

    let graph = root.graph();
    let group = graph
        .scope(graph.root())
        .member("sales")
        .expect("group registered in parent");
    assert_eq!(group.kind(), NodeKind::Group);
    assert_eq!(group.as_group().map(|g| g.options.params["tooltip"].as_str()), Some("sales"));
    Ok(())
}

#[test]
fn cycles_through_parent_edges_are_rejected_in_nested_groups() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let a = root.task("a", ())?;
    let c = root.task("c", ())?;
    root.before(&a, &c)?;
    {
        let mut group = root.group("g", GroupOptions::default())?;
        let err = group.before(&c, &a).unwrap_err();
        assert!(matches!(err, FlowdagError::DagCycle(_)));
        assert_eq!(group.graph().scope(group.current_scope()?).edge_count(), 0);

        let inner = group.task("inner", ())?;
        group.before(&c, &inner)?;
    }

    let b = root.task("b", ())?;
    root.before(&c, &b)?;
    let err = root.before(&b, &a).unwrap_err();
    assert!(matches!(err, FlowdagError::DagCycle(_)));
    Ok(())
}

#[test]
fn same_id_in_sibling_groups_does_not_form_a_cycle() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let start = root.task("start", ())?;
    {
        let mut first = root.group("first", GroupOptions::default())?;
        let load = first.task("load", ())?;
        first.before(&start, &load)?;
    }
    {
        let mut second = root.group("second", GroupOptions::default())?;
        let load = second.task("load", ())?;
        let check = second.task("check", ())?;
        second.before(&load, &check)?;
        second.before(&check, &start)?;
    }
    Ok(())
}

#[test]
fn group_guard_pops_on_error_paths() -> TestResult {
    fn failing_body(builder: &mut GraphBuilder<()>) -> Result<(), FlowdagError> {
        let mut group = builder.group("g", GroupOptions::default())?;
        group.task("x", ())?;
        group.task("x", ())?;
        Ok(())
    }

    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let before = root.depth();
    assert!(failing_body(&mut root).is_err());
    assert_eq!(root.depth(), before);
    drop(root);
    assert_eq!(builder.depth(), 0);
    Ok(())
}

#[test]
fn tree_lists_nested_groups_below_their_node() -> TestResult {
    let mut builder = GraphBuilder::new("pipeline");
    let mut root = builder.enter();
    let start = root.task("start", ())?;
    {
        let mut group = root.group("sales", GroupOptions::default())?;
        group.task("load_orders", ())?;
    }
    let group_ref = root
        .graph()
        .lookup(root.current_scope()?, "sales")
        .map(|n| n.to_ref())
        .expect("group node");
    root.before(&start, &group_ref)?;
    drop(root);

    let graph = builder.into_graph();
    let tree = render_tree(&graph, graph.root(), 0);
    let lines: Vec<_> = tree.lines().collect();
    assert_eq!(lines, vec!["start", " sales", "  load_orders"]);
    Ok(())
}
