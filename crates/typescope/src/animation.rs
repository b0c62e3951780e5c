//! Applying a layout to the drawn graph, with or without tweening.
//!
//! [`AnimationController::apply_layout`] is the synchronous half: it captures
//! where every drawn node is, asks the layout engine where it should be and
//! either moves nodes there at once or starts one position tween per moved
//! node. Edges of a tweening node are detached for the duration of its tween
//! so they never stretch between a moving and a resting endpoint.
//!
//! [`run_tweens`] is the asynchronous half: it awaits the tweens concurrently
//! and hands each node's detached edges back as soon as that node lands,
//! without waiting for the others.

use std::{collections::HashSet, time::Duration};

use futures::future::{LocalBoxFuture, join_all};
use log::{debug, trace};
use thiserror::Error;

use typescope_core::{geometry::Point, identifier::Id};

use crate::{
    layout::{LayoutEngine, LayoutError, LayoutOptions, Topology},
    surface::{EdgeHandle, EdgeKey, Element, NodeHandle, RenderError, Surface},
};

/// Why a layout could not be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Rendering(#[from] RenderError),
}

/// A position tween in flight.
pub struct Tween {
    node: NodeHandle,
    detached: Vec<EdgeHandle>,
    done: LocalBoxFuture<'static, ()>,
}

impl Tween {
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// Edges removed from the drawn graph until the tween completes.
    pub fn detached(&self) -> &[EdgeHandle] {
        &self.detached
    }
}

impl std::fmt::Debug for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("node", &self.node)
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

/// Moves drawn nodes to the positions computed by a layout engine.
#[derive(Debug, Clone, Copy)]
pub struct AnimationController {
    duration: Duration,
}

impl AnimationController {
    /// Creates a controller whose tweens last `duration`.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Lays out the drawn nodes of `surface` connected by `edges`.
    ///
    /// Without `animate` every node is moved to its target and no tween is
    /// returned. With `animate` each node whose position changes keeps its
    /// original position, loses its drawn edges and starts a tween to its
    /// target; the tweens are returned for [`run_tweens`].
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::Layout`] when the engine fails and
    /// [`ApplyError::Rendering`] when detaching edges fails. No node has
    /// started moving and no edge has been detached in either case.
    pub fn apply_layout<S: Surface>(
        &self,
        surface: &mut S,
        engine: &dyn LayoutEngine,
        options: &LayoutOptions,
        edges: &[EdgeKey],
        animate: bool,
    ) -> Result<Vec<Tween>, ApplyError> {
        let originals: Vec<(NodeHandle, Id, Point)> = surface
            .nodes()
            .into_iter()
            .filter_map(|node| {
                Some((node, surface.node_id(node)?, surface.bbox(node)?.min_point()))
            })
            .collect();

        let mut topology = Topology::new();
        for &(node, id, _) in &originals {
            if let Some(bounds) = surface.bbox(node) {
                topology.add_node(id, bounds.to_size());
            }
        }
        for key in edges {
            topology.add_edge(*key);
        }

        let positions = engine
            .layout(&topology, options)
            .map_err(ApplyError::Layout)?;
        let targets = originals
            .iter()
            .map(|&(node, id, original)| {
                positions
                    .get(&id)
                    .map(|target| (node, original, *target))
                    .ok_or(ApplyError::Layout(LayoutError::UnplacedNode(id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !animate {
            for &(node, _, target) in &targets {
                surface.set_position(node, target);
            }
            debug!(nodes = targets.len(); "Layout applied without animation");
            return Ok(Vec::new());
        }

        // Resting nodes are pinned so a tween left over from an earlier
        // layout cannot land them somewhere else.
        let mut moving = Vec::new();
        let mut claimed = HashSet::new();
        for (node, original, target) in targets {
            if original == target {
                surface.set_position(node, target);
                continue;
            }
            let detached: Vec<EdgeHandle> = surface
                .connected_edges(node)
                .into_iter()
                .filter(|edge| claimed.insert(*edge))
                .collect();
            moving.push((node, original, target, detached));
        }

        let elements: Vec<Element> = moving
            .iter()
            .flat_map(|(_, _, _, detached)| detached.iter().copied().map(Element::Edge))
            .collect();
        if !elements.is_empty() {
            surface
                .remove_elements(&elements)
                .map_err(ApplyError::Rendering)?;
        }

        let mut tweens = Vec::with_capacity(moving.len());
        for (node, original, target, detached) in moving {
            surface.set_position(node, original);
            trace!(node = node.raw(), detached = detached.len(); "Starting position tween");
            let done = surface.animate_position(node, target, self.duration);
            tweens.push(Tween {
                node,
                detached,
                done,
            });
        }

        debug!(tweens = tweens.len(); "Layout applied with animation");
        Ok(tweens)
    }
}

/// Awaits every tween concurrently, calling `landed` for each one as soon as
/// it completes.
pub async fn run_tweens(tweens: Vec<Tween>, landed: impl Fn(NodeHandle, &[EdgeHandle])) {
    let landed = &landed;
    join_all(tweens.into_iter().map(|tween| async move {
        tween.done.await;
        landed(tween.node, &tween.detached);
    }))
    .await;
}

/// Draws detached edges again.
///
/// Only edges still part of the desired graph and not drawn by now come
/// back; the surface itself skips edges whose endpoints are gone.
pub fn reattach<S: Surface>(surface: &mut S, detached: &[EdgeHandle], desired: &HashSet<EdgeKey>) {
    let elements: Vec<Element> = detached
        .iter()
        .copied()
        .filter(|edge| {
            surface.edge_key(*edge).is_some_and(|key| desired.contains(&key))
                && !surface.is_drawn(Element::Edge(*edge))
        })
        .map(Element::Edge)
        .collect();
    if !elements.is_empty() {
        trace!(count = elements.len(); "Reattaching edges");
        surface.add_elements(&elements);
    }
}
