//! Contracts of the drawing and pan/zoom collaborators.
//!
//! The pipeline never draws anything itself. It describes nodes and edges
//! with [`NodeSpec`] and [`EdgeSpec`], asks a [`Surface`] to construct them,
//! and afterwards refers to them only through opaque handles. A handle stays
//! valid for the lifetime of the surface that issued it, whether or not the
//! element is currently drawn; that is what lets the identity cache hand the
//! very same element back when an entity re-enters the render set.

use std::{fmt, time::Duration};

use futures::future::LocalBoxFuture;
use thiserror::Error;

use typescope_core::{
    catalog::EntityKind,
    color::Color,
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

/// The drawing collaborator rejected an operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("failed to create element `{id}`: {reason}")]
    Create { id: String, reason: String },

    #[error("failed to remove elements: {0}")]
    Remove(String),

    #[error("failed to mount drawing surface: {0}")]
    Mount(String),
}

/// Handle of a constructed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Handle of a constructed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeHandle(u64);

impl EdgeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Either kind of drawable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Node(NodeHandle),
    Edge(EdgeHandle),
}

/// Identity of a collapsed edge: one per `(source, target)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    source: Id,
    target: Id,
}

impl EdgeKey {
    pub fn new(source: Id, target: Id) -> Self {
        Self { source, target }
    }

    pub fn source(self) -> Id {
        self.source
    }

    pub fn target(self) -> Id {
        self.target
    }

    /// True when `node` is either endpoint.
    pub fn touches(self, node: Id) -> bool {
        self.source == node || self.target == node
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.source, self.target)
    }
}

/// One anchor row of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct PortSpec {
    /// Field name for inbound ports, `source_field_target` for outbound ones.
    pub id: String,
    pub label: String,
    /// Entity the outbound port points at.
    pub target: Option<Id>,
}

/// Everything a surface needs to construct a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: Id,
    pub kind: EntityKind,
    pub title: String,
    pub in_ports: Vec<PortSpec>,
    pub out_ports: Vec<PortSpec>,
    pub size: Size,
    pub position: Point,
}

impl NodeSpec {
    /// Outbound port pointing at `target`, if any.
    pub fn out_port_to(&self, target: Id) -> Option<&PortSpec> {
        self.out_ports.iter().find(|port| port.target == Some(target))
    }
}

/// Offset of an edge endpoint from the top-center of its node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Anchor {
    pub dx: f32,
    pub dy: f32,
}

impl Anchor {
    pub fn top(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Absolute position of the anchor on a node occupying `bounds`.
    pub fn resolve(self, bounds: Bounds) -> Point {
        Point::new(bounds.center().x() + self.dx, bounds.min_y() + self.dy)
    }
}

/// Everything a surface needs to construct an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub key: EdgeKey,
    /// Fields of the source collapsed into this edge, in declaration order.
    pub fields: Vec<Id>,
    pub source_anchor: Anchor,
    pub target_anchor: Anchor,
}

/// Options handed to the surface when the pan/zoom collaborator is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportOptions {
    pub max_zoom: f32,
    pub fit: bool,
    pub pan_enabled: bool,
}

/// The drawing collaborator.
///
/// Construction (`create_*`) and drawing (`add_elements`) are separate steps:
/// constructed elements live until [`Surface::dispose`] or
/// [`Surface::clear`], while the drawn graph is the subset currently added.
pub trait Surface {
    /// Whatever the host mounts the surface into.
    type Container;

    /// The pan/zoom collaborator this surface can host.
    type Viewport: PanZoom;

    /// Builds a surface of the given size inside `container`.
    fn mount(container: Self::Container, size: Size) -> Result<Self, RenderError>
    where
        Self: Sized;

    /// Constructs a node without drawing it.
    fn create_node(&mut self, spec: &NodeSpec) -> Result<NodeHandle, RenderError>;

    /// Constructs an edge without drawing it.
    fn create_edge(&mut self, spec: &EdgeSpec) -> Result<EdgeHandle, RenderError>;

    /// Releases a constructed element that is not drawn.
    fn dispose(&mut self, element: Element);

    /// Draws constructed elements. Already drawn elements are left alone, and
    /// edges whose endpoints are not drawn are ignored.
    fn add_elements(&mut self, elements: &[Element]);

    /// Removes elements from the drawn graph in one batch. Removing a node
    /// also removes the drawn edges connected to it.
    ///
    /// The batch is all-or-nothing: on error nothing was removed.
    fn remove_elements(&mut self, elements: &[Element]) -> Result<(), RenderError>;

    /// Drawn nodes, back to front.
    fn nodes(&self) -> Vec<NodeHandle>;

    /// Drawn edges, back to front.
    fn edges(&self) -> Vec<EdgeHandle>;

    fn is_drawn(&self, element: Element) -> bool;

    /// Entity id of a constructed node.
    fn node_id(&self, node: NodeHandle) -> Option<Id>;

    /// Key of a constructed edge.
    fn edge_key(&self, edge: EdgeHandle) -> Option<EdgeKey>;

    /// Entity targeted by the outbound port `port` of a node, if any.
    fn port_target(&self, node: NodeHandle, port: &str) -> Option<Id>;

    /// Current box of a constructed node.
    fn bbox(&self, node: NodeHandle) -> Option<Bounds>;

    /// Box enclosing every drawn node, `None` when nothing is drawn.
    fn content_bounds(&self) -> Option<Bounds>;

    /// Drawn edges with `node` at either end.
    fn connected_edges(&self, node: NodeHandle) -> Vec<EdgeHandle>;

    /// Moves a node's top-left corner without animation.
    ///
    /// A pending animation of the node is cancelled and its future resolves
    /// without moving the node any further.
    fn set_position(&mut self, node: NodeHandle, position: Point);

    /// Moves a node's top-left corner to `target` over `duration`.
    ///
    /// The returned future resolves when the animation completes or is
    /// superseded by another move of the same node.
    fn animate_position(
        &mut self,
        node: NodeHandle,
        target: Point,
        duration: Duration,
    ) -> LocalBoxFuture<'static, ()>;

    /// Fades an edge's stroke to `color` over `duration`.
    fn transition_color(&mut self, edge: EdgeHandle, color: Color, duration: Duration);

    /// Raises an element above all others.
    fn bring_to_front(&mut self, element: Element);

    /// Resets the fill of every port of a node.
    fn reset_port_fill(&mut self, node: NodeHandle);

    /// Shows the interaction tools (endpoint handles) of an edge.
    fn show_tools(&mut self, edge: EdgeHandle);

    /// Hides every edge's interaction tools.
    fn hide_tools(&mut self);

    fn size(&self) -> Size;

    fn set_size(&mut self, size: Size);

    /// Creates the pan/zoom collaborator bound to this surface.
    fn create_viewport(&mut self, options: ViewportOptions) -> Self::Viewport;

    /// Drops every drawn and constructed element.
    fn clear(&mut self);
}

/// The pan/zoom collaborator. Pan is a screen-space offset, zoom an absolute
/// scale factor applied about the viewport center.
pub trait PanZoom {
    /// Zooms and pans so the content fits the viewport.
    fn fit(&mut self);

    /// Sets the pan offset.
    fn pan(&mut self, to: Point);

    /// Sets the absolute zoom level, keeping the viewport center fixed.
    fn zoom(&mut self, level: f32);

    fn pan_position(&self) -> Point;

    fn zoom_level(&self) -> f32;

    /// Size of the viewport in screen units.
    fn sizes(&self) -> Size;

    /// Returns to the fitted state.
    fn reset(&mut self);

    /// Re-reads the viewport size from the surface.
    fn resize(&mut self, size: Size);

    /// Records the current content box in graph units.
    fn update_bbox(&mut self, content: Option<Bounds>);

    fn enable_pan(&mut self);

    fn disable_pan(&mut self);
}
