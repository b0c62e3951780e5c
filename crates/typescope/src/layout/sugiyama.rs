//! Sugiyama (layered) layout engine
//!
//! Ranks and in-rank ordering come from the rust-sugiyama crate; this module
//! turns them into concrete boxes using the node sizes and the configured
//! separations. Each connected component is ranked on its own and components
//! are stacked along the cross axis, so a catalog with unrelated islands does
//! not interleave them.

use std::{any::Any, collections::HashSet, panic};

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::unionfind::UnionFind;
use rust_sugiyama::configure::Config;

use typescope_core::geometry::{Point, Size};

use super::{LayoutEngine, LayoutError, LayoutOptions, Positions, RankDirection, Topology};

/// Nodes of one component as ranks, each rank ordered along the cross axis.
/// Entries are indices into the topology's node list.
type Ranks = Vec<Vec<usize>>;

/// A connected component: its nodes and its edges, both as topology indices.
#[derive(Debug, Default)]
struct Component {
    nodes: Vec<usize>,
    edges: Vec<(usize, usize)>,
}

/// The layered layout engine.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Spacing handed to rust-sugiyama; only relative order matters here.
    vertex_spacing: f64,
}

impl Engine {
    /// Create a new Sugiyama layout engine
    pub fn new() -> Self {
        Self {
            vertex_spacing: 3.0,
        }
    }

    /// Splits the topology into connected components, dropping self-loops,
    /// duplicate edges and edges with an unknown endpoint.
    fn components(&self, topology: &Topology) -> Vec<Component> {
        let count = topology.node_count();
        let mut sets = UnionFind::<usize>::new(count);
        let mut seen = HashSet::new();
        let mut edges = Vec::new();

        for key in topology.edges() {
            let (Some(source), Some(target)) = (
                topology.node_index(key.source()),
                topology.node_index(key.target()),
            ) else {
                trace!(edge:% = key; "Skipping edge with an endpoint outside the topology");
                continue;
            };
            if source == target || !seen.insert((source, target)) {
                continue;
            }
            sets.union(source, target);
            edges.push((source, target));
        }

        let mut components: IndexMap<usize, Component> = IndexMap::new();
        for node in 0..count {
            components.entry(sets.find(node)).or_default().nodes.push(node);
        }
        for (source, target) in edges {
            if let Some(component) = components.get_mut(&sets.find(source)) {
                component.edges.push((source, target));
            }
        }

        components.into_values().collect()
    }

    /// Ranks one connected component.
    fn rank_component(
        &self,
        component: &Component,
        topology: &Topology,
    ) -> Result<Ranks, LayoutError> {
        if component.edges.is_empty() {
            return Ok(component.nodes.iter().map(|&node| vec![node]).collect());
        }

        // rust-sugiyama expects dense ids, so renumber within the component
        let local: IndexMap<usize, u32> = component
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, &node)| (node, idx as u32))
            .collect();
        let edges: Vec<(u32, u32)> = component
            .edges
            .iter()
            .filter_map(|(source, target)| Some((*local.get(source)?, *local.get(target)?)))
            .collect();
        let edge_count = edges.len();

        debug!(
            nodes = component.nodes.len(),
            edges = edge_count;
            "Applying Sugiyama algorithm to component"
        );

        let vertex_spacing = self.vertex_spacing;
        let layouts = panic::catch_unwind(move || {
            let config = Config {
                minimum_length: 1,
                vertex_spacing,
                ..Default::default()
            };
            rust_sugiyama::from_edges(&edges, &config)
        })
        .map_err(|err| LayoutError::EnginePanicked(panic_message(err.as_ref())))?;

        if layouts.is_empty() {
            return Err(LayoutError::EmptyResult {
                nodes: component.nodes.len(),
                edges: edge_count,
            });
        }

        let mut coords: Vec<Option<(f32, f32)>> = vec![None; component.nodes.len()];
        for (layout, _, _) in &layouts {
            for &(id, (x, y)) in layout {
                if let Some(slot) = coords.get_mut(id as usize) {
                    *slot = Some((x as f32, y as f32));
                }
            }
        }

        let mut placed = Vec::with_capacity(coords.len());
        for (idx, coord) in coords.into_iter().enumerate() {
            let node = component.nodes[idx];
            let (x, y) = coord.ok_or_else(|| match topology.nodes().nth(node) {
                Some((id, _)) => LayoutError::UnplacedNode(id),
                None => LayoutError::EmptyResult {
                    nodes: component.nodes.len(),
                    edges: edge_count,
                },
            })?;
            placed.push((x, level_key(y)));
        }

        let mut level_keys: Vec<i64> = placed.iter().map(|(_, key)| *key).collect();
        level_keys.sort_unstable();
        level_keys.dedup();
        let mut levels: Vec<usize> = placed
            .iter()
            .map(|(_, key)| level_keys.binary_search(key).unwrap_or_default())
            .collect();

        // The engine's vertical sign convention is not part of its contract;
        // orient levels so that most edges point to a later rank.
        let (forward, backward) =
            component
                .edges
                .iter()
                .fold((0usize, 0usize), |(forward, backward), (source, target)| {
                    let (Some(&source), Some(&target)) = (local.get(source), local.get(target))
                    else {
                        return (forward, backward);
                    };
                    let (source, target) = (levels[source as usize], levels[target as usize]);
                    if source < target {
                        (forward + 1, backward)
                    } else if source > target {
                        (forward, backward + 1)
                    } else {
                        (forward, backward)
                    }
                });
        if backward > forward {
            let last = level_keys.len() - 1;
            levels.iter_mut().for_each(|level| *level = last - *level);
        }

        let mut ranks: Vec<Vec<(f32, usize)>> = vec![Vec::new(); level_keys.len()];
        for (idx, (x, _)) in placed.into_iter().enumerate() {
            ranks[levels[idx]].push((x, component.nodes[idx]));
        }

        Ok(ranks
            .into_iter()
            .map(|mut rank| {
                rank.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                rank.into_iter().map(|(_, node)| node).collect()
            })
            .collect())
    }

    /// Turns ranked components into top-left positions.
    ///
    /// Works in main/cross coordinates: the main axis runs along the rank
    /// direction, the cross axis across it.
    fn place(&self, components: &[Ranks], topology: &Topology, options: &LayoutOptions) -> Positions {
        let nodes: Vec<_> = topology.nodes().collect();
        let oriented = |node: usize| -> Size {
            let size = nodes[node].1;
            match options.direction() {
                RankDirection::LeftToRight => size,
                RankDirection::TopToBottom => size.transpose(),
            }
        };

        let mut positions = Positions::with_capacity(nodes.len());
        let mut cross_offset = 0.0;

        for ranks in components {
            let rank_main: Vec<f32> = ranks
                .iter()
                .map(|rank| {
                    rank.iter()
                        .map(|&node| oriented(node).width())
                        .fold(0.0, f32::max)
                })
                .collect();
            let rank_cross: Vec<f32> = ranks
                .iter()
                .map(|rank| {
                    let gaps = rank.len().saturating_sub(1) as f32 * options.node_separation();
                    rank.iter().map(|&node| oriented(node).height()).sum::<f32>() + gaps
                })
                .collect();
            let extent = rank_cross.iter().copied().fold(0.0, f32::max);

            let mut main = 0.0;
            for (idx, rank) in ranks.iter().enumerate() {
                let mut cross = cross_offset + (extent - rank_cross[idx]) / 2.0;
                for &node in rank {
                    let size = oriented(node);
                    let local = Point::new(main + (rank_main[idx] - size.width()) / 2.0, cross);
                    let position = match options.direction() {
                        RankDirection::LeftToRight => local,
                        RankDirection::TopToBottom => local.transpose(),
                    };
                    positions.insert(nodes[node].0, position);
                    cross += size.height() + options.node_separation();
                }
                main += rank_main[idx] + options.rank_separation();
            }

            cross_offset += extent + options.node_separation();
        }

        positions
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine for Engine {
    fn layout(
        &self,
        topology: &Topology,
        options: &LayoutOptions,
    ) -> Result<Positions, LayoutError> {
        if topology.is_empty() {
            return Ok(Positions::new());
        }

        let components = self.components(topology);
        let ranked = components
            .iter()
            .map(|component| self.rank_component(component, topology))
            .collect::<Result<Vec<_>, _>>()?;
        let positions = self.place(&ranked, topology, options);

        debug!(
            nodes = positions.len(),
            components = ranked.len();
            "Layout generated"
        );

        Ok(positions)
    }
}

/// Groups engine y coordinates that differ only by float noise.
fn level_key(y: f32) -> i64 {
    (y * 1000.0).round() as i64
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown error".to_string()
    }
}
