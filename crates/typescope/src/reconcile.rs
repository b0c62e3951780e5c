//! Diffing the desired render set against the drawn graph.
//!
//! A reconciliation runs in three steps, all computed from one snapshot of
//! the drawn graph taken up front:
//!
//! 1. *stage*: every node and edge that has to appear is looked up in the
//!    identity cache or constructed, without drawing anything;
//! 2. *remove*: drawn nodes that left the render set and drawn edges whose
//!    relationship is gone are removed in one batch;
//! 3. *commit*: staged elements are positioned, cached and drawn.
//!
//! A failure in the first two steps leaves the drawn graph and the cache as
//! they were; elements constructed for the failed run are disposed.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use typescope_core::{
    catalog::{Entity, TypeCatalog},
    geometry::{Bounds, Point, Size},
    identifier::Id,
    introspection::TypeIntrospection,
};

use crate::{
    cache::IdentityCache,
    config::Theme,
    surface::{
        Anchor, EdgeHandle, EdgeKey, EdgeSpec, Element, NodeHandle, NodeSpec, PortSpec,
        RenderError, Surface,
    },
};

/// Offset of an edge's start below the top edge of its source node.
const SOURCE_ANCHOR_DY: f32 = 5.0;

/// Horizontal nudge of an edge's end on its target node.
const TARGET_ANCHOR_DX: f32 = 10.0;

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    /// Nodes drawn by this run, in render-set order.
    pub added_nodes: Vec<Id>,
    /// Nodes removed by this run.
    pub removed_nodes: Vec<Id>,
    /// Edges drawn by this run.
    pub added_edges: Vec<EdgeKey>,
    /// Drawn edges no longer in the desired graph, including those dropped
    /// along with a removed endpoint.
    pub removed_edges: Vec<EdgeKey>,
    /// Elements taken from the identity cache.
    pub reused: usize,
    /// Elements constructed from scratch.
    pub constructed: usize,
    /// Every edge of the desired graph, drawn before or by this run.
    pub desired_edges: Vec<EdgeKey>,
}

impl Diff {
    /// True when the drawn graph did not change.
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

/// Element to draw once staging succeeded.
#[derive(Debug, Clone, Copy)]
enum Staged<H> {
    Cached(H),
    Constructed(H),
}

impl<H: Copy> Staged<H> {
    fn handle(self) -> H {
        match self {
            Self::Cached(handle) | Self::Constructed(handle) => handle,
        }
    }
}

/// What a run has to do, derived from the snapshot.
struct Plan<'e> {
    desired: &'e [&'e Entity],
    /// Desired entities that are drawn already.
    drawn_ids: HashSet<Id>,
    desired_edges: IndexMap<EdgeKey, Vec<Id>>,
    /// Desired edges that are drawn already.
    kept_edges: HashSet<EdgeKey>,
    removals: Vec<Element>,
    spawn: Point,
}

/// Elements staged for drawing.
#[derive(Default)]
struct Staging {
    nodes: Vec<(Id, u64, Staged<NodeHandle>)>,
    edges: Vec<(EdgeKey, Staged<EdgeHandle>)>,
}

impl Staging {
    /// Releases whatever this run constructed.
    fn dispose<S: Surface>(&self, surface: &mut S) {
        for (_, staged) in &self.edges {
            if let Staged::Constructed(handle) = staged {
                surface.dispose(Element::Edge(*handle));
            }
        }
        for (_, _, staged) in &self.nodes {
            if let Staged::Constructed(handle) = staged {
                surface.dispose(Element::Node(*handle));
            }
        }
    }
}

/// Diffs render sets against a surface.
pub struct Reconciler<'a> {
    introspection: &'a dyn TypeIntrospection,
    theme: &'a Theme,
}

impl<'a> Reconciler<'a> {
    pub fn new(introspection: &'a dyn TypeIntrospection, theme: &'a Theme) -> Self {
        Self {
            introspection,
            theme,
        }
    }

    /// Brings the drawn graph of `surface` in line with `desired`.
    ///
    /// # Arguments
    ///
    /// * `surface` - The drawing collaborator holding the drawn graph.
    /// * `cache` - Identity cache consulted before constructing anything.
    /// * `catalog` - Catalog the render set was selected from.
    /// * `desired` - The render set.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when constructing or removing an element fails.
    /// The drawn graph and the cache are unchanged in that case.
    pub fn reconcile<S: Surface>(
        &self,
        surface: &mut S,
        cache: &mut IdentityCache,
        catalog: &TypeCatalog,
        desired: &[&Entity],
    ) -> Result<Diff, RenderError> {
        let mut diff = Diff::default();
        let plan = self.plan(surface, catalog, desired, &mut diff);

        let mut staging = Staging::default();
        if let Err(err) = self.stage(surface, cache, catalog, &plan, &mut staging) {
            staging.dispose(surface);
            return Err(err);
        }

        if !plan.removals.is_empty() {
            trace!(count = plan.removals.len(); "Removing elements");
            if let Err(err) = surface.remove_elements(&plan.removals) {
                staging.dispose(surface);
                return Err(err);
            }
        }

        let mut additions = Vec::with_capacity(staging.nodes.len() + staging.edges.len());
        for &(id, fingerprint, staged) in &staging.nodes {
            match staged {
                Staged::Cached(_) => diff.reused += 1,
                Staged::Constructed(handle) => {
                    cache.insert_node(id, handle, fingerprint);
                    diff.constructed += 1;
                }
            }
            surface.set_position(staged.handle(), plan.spawn);
            additions.push(Element::Node(staged.handle()));
            diff.added_nodes.push(id);
        }
        for &(key, staged) in &staging.edges {
            match staged {
                Staged::Cached(_) => diff.reused += 1,
                Staged::Constructed(handle) => {
                    cache.insert_edge(key, handle);
                    diff.constructed += 1;
                }
            }
            additions.push(Element::Edge(staged.handle()));
            diff.added_edges.push(key);
        }
        if !additions.is_empty() {
            surface.add_elements(&additions);
        }

        debug!(
            added_nodes = diff.added_nodes.len(),
            removed_nodes = diff.removed_nodes.len(),
            added_edges = diff.added_edges.len(),
            removed_edges = diff.removed_edges.len(),
            reused = diff.reused,
            constructed = diff.constructed;
            "Reconciled drawn graph"
        );

        Ok(diff)
    }

    /// Takes the snapshot and derives removals and the spawn point from it.
    fn plan<'e, S: Surface>(
        &self,
        surface: &S,
        catalog: &TypeCatalog,
        desired: &'e [&'e Entity],
        diff: &mut Diff,
    ) -> Plan<'e> {
        let drawn_nodes: Vec<(NodeHandle, Id)> = surface
            .nodes()
            .into_iter()
            .filter_map(|handle| Some((handle, surface.node_id(handle)?)))
            .collect();
        let drawn_edges: Vec<(EdgeHandle, EdgeKey)> = surface
            .edges()
            .into_iter()
            .filter_map(|handle| Some((handle, surface.edge_key(handle)?)))
            .collect();

        let desired_ids: IndexSet<Id> = desired.iter().map(|entity| entity.id()).collect();
        let desired_edges = self.desired_edges(catalog, desired, &desired_ids);
        diff.desired_edges = desired_edges.keys().copied().collect();

        let mut removals = Vec::new();
        let mut surviving = Vec::new();
        let mut drawn_ids = HashSet::new();
        for &(handle, id) in &drawn_nodes {
            if desired_ids.contains(&id) {
                surviving.push(handle);
                drawn_ids.insert(id);
            } else {
                removals.push(Element::Node(handle));
                diff.removed_nodes.push(id);
            }
        }

        let mut kept_edges = HashSet::new();
        for &(handle, key) in &drawn_edges {
            if desired_edges.contains_key(&key) {
                kept_edges.insert(key);
                continue;
            }
            diff.removed_edges.push(key);
            // Edges of a removed node go with it.
            if drawn_ids.contains(&key.source()) && drawn_ids.contains(&key.target()) {
                removals.push(Element::Edge(handle));
            }
        }

        let spawn = Bounds::enclosing(surviving.iter().filter_map(|handle| surface.bbox(*handle)))
            .or_else(|| surface.content_bounds())
            .map_or_else(Point::default, Bounds::min_point);

        Plan {
            desired,
            drawn_ids,
            desired_edges,
            kept_edges,
            removals,
            spawn,
        }
    }

    /// Collapsed edges of the desired graph with the fields each stands for.
    ///
    /// Every desired entity contributes, not only newly added ones, so edges
    /// towards an entity that just entered the render set are found.
    fn desired_edges(
        &self,
        catalog: &TypeCatalog,
        desired: &[&Entity],
        desired_ids: &IndexSet<Id>,
    ) -> IndexMap<EdgeKey, Vec<Id>> {
        let mut edges: IndexMap<EdgeKey, Vec<Id>> = IndexMap::new();
        for entity in desired {
            for field in entity.fields() {
                let Some(target) = self
                    .introspection
                    .resolve_field_target(catalog, field.type_ref())
                else {
                    continue;
                };
                if !desired_ids.contains(&target.id()) {
                    continue;
                }
                edges
                    .entry(EdgeKey::new(entity.id(), target.id()))
                    .or_default()
                    .push(field.name());
            }
        }
        edges
    }

    /// Looks up or constructs every element the plan adds.
    fn stage<S: Surface>(
        &self,
        surface: &mut S,
        cache: &IdentityCache,
        catalog: &TypeCatalog,
        plan: &Plan<'_>,
        staging: &mut Staging,
    ) -> Result<(), RenderError> {
        for entity in plan.desired {
            if plan.drawn_ids.contains(&entity.id()) {
                continue;
            }
            let staged = match cache.node(entity.id()) {
                Some(handle) => Staged::Cached(handle),
                None => {
                    let spec = self.node_spec(catalog, entity, plan.spawn);
                    trace!(id:% = entity.id(), ports = spec.out_ports.len(); "Constructing node");
                    Staged::Constructed(surface.create_node(&spec)?)
                }
            };
            staging
                .nodes
                .push((entity.id(), entity.shape_fingerprint(), staged));
        }

        for (key, fields) in &plan.desired_edges {
            if plan.kept_edges.contains(key) {
                continue;
            }
            let staged = match cache.edge(*key) {
                Some(handle) => Staged::Cached(handle),
                None => {
                    trace!(edge:% = key, fields = fields.len(); "Constructing edge");
                    Staged::Constructed(surface.create_edge(&self.edge_spec(*key, fields))?)
                }
            };
            staging.edges.push((*key, staged));
        }

        Ok(())
    }

    /// Describes the node drawn for `entity`.
    ///
    /// One inbound port per field; one outbound port per field whose target
    /// is itself drawable.
    pub fn node_spec(&self, catalog: &TypeCatalog, entity: &Entity, position: Point) -> NodeSpec {
        let in_ports = entity
            .fields()
            .map(|field| PortSpec {
                id: field.name().to_text(),
                label: field.name().to_text(),
                target: None,
            })
            .collect();

        let out_ports = entity
            .fields()
            .filter_map(|field| {
                let target = self
                    .introspection
                    .resolve_field_target(catalog, field.type_ref())?;
                if self.introspection.is_filtered_entity(target)
                    || self.introspection.is_base_entity(target)
                {
                    return None;
                }
                Some(PortSpec {
                    id: format!("{}_{}_{}", entity.id(), field.name(), target.id()),
                    label: self.introspection.field_display_label(field.type_ref()),
                    target: Some(target.id()),
                })
            })
            .collect();

        let rows = entity.field_count() as f32;
        NodeSpec {
            id: entity.id(),
            kind: entity.kind(),
            title: entity.id().to_text(),
            in_ports,
            out_ports,
            size: Size::new(
                self.theme.node_width(),
                self.theme.header_height() + rows * self.theme.row_height(),
            ),
            position,
        }
    }

    /// Describes the edge drawn for `key`.
    pub fn edge_spec(&self, key: EdgeKey, fields: &[Id]) -> EdgeSpec {
        EdgeSpec {
            key,
            fields: fields.to_vec(),
            source_anchor: Anchor::top(0.0, SOURCE_ANCHOR_DY),
            target_anchor: Anchor::top(TARGET_ANCHOR_DX, self.theme.row_height() - 5.0),
        }
    }
}
