//! Integration tests for renders that overlap in time
//!
//! Animations are parked by the headless surface so a second render can start
//! while the first one is still tweening.

use std::{cell::RefCell, rc::Rc};

use typescope::surface::Surface;

use futures::{
    executor::{LocalPool, block_on},
    task::LocalSpawnExt,
};

use typescope::{
    LoadingEvent, PipelineState, RenderOutcome, TypeGraph, TypeGraphBuilder,
    catalog::{EntityKind, TypeCatalog},
    geometry::{Point, Size},
    headless::{AnimationMode, HeadlessSurface},
    identifier::Id,
    surface::EdgeKey,
};

fn blog_catalog() -> TypeCatalog {
    TypeCatalog::builder()
        .entity(
            "Query",
            EntityKind::Object,
            [("user", "User"), ("settings", "Settings")],
        )
        .entity(
            "User",
            EntityKind::Object,
            [("name", "String!"), ("posts", "[Post!]!")],
        )
        .entity(
            "Post",
            EntityKind::Object,
            [("title", "String"), ("author", "User")],
        )
        .entity("Settings", EntityKind::Object, [("theme", "String")])
        .build()
        .expect("valid catalog")
}

/// An initialized graph whose later animations wait for the test.
fn parked_graph() -> TypeGraph<HeadlessSurface> {
    let graph: TypeGraph<HeadlessSurface> = TypeGraphBuilder::default().build().unwrap();
    block_on(graph.init((), Size::new(1024.0, 768.0), blog_catalog())).unwrap();
    graph.with_surface(|surface| surface.set_animation_mode(AnimationMode::Manual));
    graph
}

fn count_hooks(graph: &TypeGraph<HeadlessSurface>) -> Rc<RefCell<Vec<LoadingEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    for event in [LoadingEvent::Start, LoadingEvent::Stop] {
        let events = Rc::clone(&events);
        graph.on(event, move || events.borrow_mut().push(event));
    }
    events
}

fn finish_everything(graph: &TypeGraph<HeadlessSurface>, pool: &mut LocalPool) {
    pool.run_until_stalled();
    while graph
        .with_surface(|surface| surface.finish_all_animations())
        .unwrap_or_default()
        > 0
    {
        pool.run_until_stalled();
    }
}

/// Top-left corner of every drawn node, by id.
fn positions(graph: &TypeGraph<HeadlessSurface>) -> Vec<(Id, Point)> {
    let mut ids = graph.drawn_node_ids();
    ids.sort();
    ids.into_iter()
        .map(|id| {
            let position = graph
                .with_surface(|surface| {
                    let node = surface.drawn_node(id)?;
                    surface.bbox(node).map(|bounds| bounds.min_point())
                })
                .flatten()
                .unwrap_or_else(|| panic!("`{id}` should be drawn"));
            (id, position)
        })
        .collect()
}

#[test]
fn test_animated_render_waits_for_tweens() {
    let graph = parked_graph();
    let mut pool = LocalPool::new();

    let handle = pool
        .spawner()
        .spawn_local_with_handle({
            let graph = graph.clone();
            async move { graph.set_focus("User").await }
        })
        .unwrap();
    pool.run_until_stalled();

    assert_eq!(graph.state(), PipelineState::Animating);
    let parked = graph
        .with_surface(|surface| surface.pending_animations().len())
        .unwrap();
    assert!(parked > 0, "the new node has to travel to its rank");

    finish_everything(&graph, &mut pool);
    let outcome = pool.run_until(handle).unwrap();

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.tweens, parked);
    assert_eq!(graph.state(), PipelineState::Idle);
    let mut edges = graph.drawn_edge_keys();
    edges.sort();
    assert_eq!(
        edges,
        vec![
            EdgeKey::new(Id::new("Post"), Id::new("User")),
            EdgeKey::new(Id::new("Query"), Id::new("User")),
            EdgeKey::new(Id::new("User"), Id::new("Post")),
        ],
        "every detached edge comes back once its nodes land"
    );
}

#[test]
fn test_newer_run_supersedes_older_one() {
    let graph = parked_graph();
    let events = count_hooks(&graph);
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let first = spawner
        .spawn_local_with_handle({
            let graph = graph.clone();
            async move { graph.set_focus("User").await }
        })
        .unwrap();
    pool.run_until_stalled();
    assert_eq!(graph.state(), PipelineState::Animating);

    // Post was drawn by the first run, so it is a valid focus already.
    let second = spawner
        .spawn_local_with_handle({
            let graph = graph.clone();
            async move { graph.set_focus("Post").await }
        })
        .unwrap();
    finish_everything(&graph, &mut pool);

    assert_eq!(pool.run_until(first), Ok(RenderOutcome::Superseded));
    let second = pool.run_until(second).unwrap();
    assert!(second.is_committed());

    assert_eq!(graph.focus(), "Post");
    assert_eq!(graph.state(), PipelineState::Idle);
    assert_eq!(
        *events.borrow(),
        vec![LoadingEvent::Start, LoadingEvent::Stop],
        "overlapping runs share one loading span"
    );

    let mut nodes = graph.drawn_node_ids();
    nodes.sort();
    assert_eq!(nodes, vec![Id::new("Post"), Id::new("User")]);
    let mut edges = graph.drawn_edge_keys();
    edges.sort();
    assert_eq!(
        edges,
        vec![
            EdgeKey::new(Id::new("Post"), Id::new("User")),
            EdgeKey::new(Id::new("User"), Id::new("Post")),
        ],
        "the superseded run must not reattach edges of its own render set"
    );
}

#[test]
fn test_destroy_supersedes_in_flight_run() {
    let graph = parked_graph();
    let events = count_hooks(&graph);
    let mut pool = LocalPool::new();

    let handle = pool
        .spawner()
        .spawn_local_with_handle({
            let graph = graph.clone();
            async move { graph.set_focus("User").await }
        })
        .unwrap();
    pool.run_until_stalled();

    // The dropped surface drops the parked animations with it.
    graph.destroy();
    pool.run_until_stalled();

    assert_eq!(pool.run_until(handle), Ok(RenderOutcome::Superseded));
    assert!(!graph.is_initialized());
    assert_eq!(graph.state(), PipelineState::Idle);
    assert_eq!(
        *events.borrow(),
        vec![LoadingEvent::Start, LoadingEvent::Stop]
    );
}

#[test]
fn test_superseded_tweens_do_not_move_nodes_afterwards() {
    let graph = parked_graph();
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let first = spawner
        .spawn_local_with_handle({
            let graph = graph.clone();
            async move { graph.set_focus("User").await }
        })
        .unwrap();
    pool.run_until_stalled();

    // Nodes still rest where the root layout put them, so going back to root
    // leaves most of them where they are.
    let second = spawner
        .spawn_local_with_handle({
            let graph = graph.clone();
            async move { graph.set_focus("root").await }
        })
        .unwrap();
    finish_everything(&graph, &mut pool);

    assert_eq!(pool.run_until(first), Ok(RenderOutcome::Superseded));
    assert!(pool.run_until(second).unwrap().is_committed());

    let fresh: TypeGraph<HeadlessSurface> = TypeGraphBuilder::default().build().unwrap();
    block_on(fresh.init((), Size::new(1024.0, 768.0), blog_catalog())).unwrap();
    let expected = positions(&fresh);
    let actual = positions(&graph);

    assert_eq!(
        actual.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        expected.iter().map(|(id, _)| *id).collect::<Vec<_>>()
    );
    for ((id, actual), (_, expected)) in actual.iter().zip(&expected) {
        assert!(
            actual.approx_eq(*expected, 0.01),
            "`{id}` is at {actual:?}, expected {expected:?}"
        );
    }
}
