//! Layout engine contract and the default layered engine.
//!
//! The pipeline hands a [`LayoutEngine`] nothing but topology: node ids with
//! their sizes and the directed edges between them. The engine answers with
//! the top-left position of every node. Engines must be deterministic for a
//! fixed topology and option set, so re-running a render with nothing changed
//! moves nothing.

mod sugiyama;

pub use sugiyama::Engine as SugiyamaEngine;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use typescope_core::{
    geometry::{Point, Size},
    identifier::Id,
};

use crate::surface::EdgeKey;

/// Positions produced by a layout engine, keyed by node id.
pub type Positions = HashMap<Id, Point>;

/// The layout engine could not produce positions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("layout engine panicked: {0}")]
    EnginePanicked(String),

    #[error("layout engine returned no layout for {nodes} nodes and {edges} edges")]
    EmptyResult { nodes: usize, edges: usize },

    #[error("layout engine did not place node `{0}`")]
    UnplacedNode(Id),
}

/// Axis along which ranks follow each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankDirection {
    #[default]
    LeftToRight,
    TopToBottom,
}

/// Tunables of a layered layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    node_separation: f32,
    rank_separation: f32,
    direction: RankDirection,
}

impl LayoutOptions {
    pub fn new(node_separation: f32, rank_separation: f32, direction: RankDirection) -> Self {
        Self {
            node_separation,
            rank_separation,
            direction,
        }
    }

    pub fn node_separation(&self) -> f32 {
        self.node_separation
    }

    pub fn rank_separation(&self) -> f32 {
        self.rank_separation
    }

    pub fn direction(&self) -> RankDirection {
        self.direction
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::new(200.0, 500.0, RankDirection::LeftToRight)
    }
}

/// Nodes and edges to lay out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    nodes: IndexMap<Id, Size>,
    edges: Vec<EdgeKey>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: Id, size: Size) {
        self.nodes.insert(id, size);
    }

    /// Adds an edge. Edges touching unknown nodes are ignored by engines.
    pub fn add_edge(&mut self, key: EdgeKey) {
        self.edges.push(key);
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (Id, Size)> {
        self.nodes.iter().map(|(id, size)| (*id, *size))
    }

    pub fn node_size(&self, id: Id) -> Option<Size> {
        self.nodes.get(&id).copied()
    }

    pub fn node_index(&self, id: Id) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Computes node positions for a topology.
pub trait LayoutEngine {
    /// Returns the top-left corner of every node in `topology`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] when the engine cannot place every node.
    fn layout(
        &self,
        topology: &Topology,
        options: &LayoutOptions,
    ) -> Result<Positions, LayoutError>;
}
