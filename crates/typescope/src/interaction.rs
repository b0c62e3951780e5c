//! Pointer events and what they do to the drawn graph.
//!
//! Hovering only changes highlight state and tool visibility. Clicking never
//! touches the graph: it yields a focus request which the controller feeds
//! back into the render pipeline.

use std::time::Duration;

use log::trace;

use typescope_core::{color::Color, geometry::Size, identifier::Id};

use crate::{
    config::Theme,
    surface::{EdgeHandle, Element, NodeHandle, PanZoom, Surface},
};

/// A pointer or window event reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    /// The pointer entered an edge.
    EdgeHover(EdgeHandle),
    /// The pointer entered a node, possibly over one of its ports.
    NodeHover {
        node: NodeHandle,
        port: Option<String>,
    },
    /// The pointer is over empty space.
    BlankHover,
    EdgeClick(EdgeHandle),
    NodeClick(NodeHandle),
    /// A pointer went down on empty space.
    BlankPointerDown,
    PointerUp,
    /// The viewport was resized.
    Resize(Size),
}

/// Maps interaction events to effects.
#[derive(Debug, Clone, Copy)]
pub struct InteractionRouter {
    active: Color,
    inactive: Color,
    duration: Duration,
}

impl InteractionRouter {
    pub fn new(theme: &Theme, duration: Duration) -> Self {
        Self {
            active: theme.active_line(),
            inactive: theme.inactive_line(),
            duration,
        }
    }

    /// Applies the effects of `event`.
    ///
    /// Returns the entity to focus when the event asks for a focus change.
    /// Viewport events are ignored while no viewport exists.
    pub fn handle<S: Surface>(
        &self,
        event: &InteractionEvent,
        surface: &mut S,
        viewport: Option<&mut S::Viewport>,
    ) -> Option<Id> {
        trace!(event:?; "Handling interaction");
        match event {
            InteractionEvent::EdgeHover(edge) => {
                self.highlight(surface, &[*edge]);
                surface.show_tools(*edge);
                None
            }
            InteractionEvent::NodeHover { node, port } => {
                self.hover_node(surface, *node, port.as_deref());
                None
            }
            InteractionEvent::BlankHover => {
                surface.hide_tools();
                None
            }
            InteractionEvent::EdgeClick(edge) => surface.edge_key(*edge).map(|key| key.target()),
            InteractionEvent::NodeClick(node) => surface.node_id(*node),
            InteractionEvent::BlankPointerDown => {
                if let Some(viewport) = viewport {
                    viewport.enable_pan();
                }
                None
            }
            InteractionEvent::PointerUp => {
                if let Some(viewport) = viewport {
                    viewport.disable_pan();
                }
                None
            }
            InteractionEvent::Resize(size) => {
                if let Some(viewport) = viewport {
                    viewport.resize(*size);
                    viewport.reset();
                }
                None
            }
        }
    }

    fn hover_node<S: Surface>(&self, surface: &mut S, node: NodeHandle, port: Option<&str>) {
        surface.hide_tools();
        surface.bring_to_front(Element::Node(node));
        surface.reset_port_fill(node);

        let connected = surface.connected_edges(node);
        let port_edge = port
            .and_then(|port| surface.port_target(node, port))
            .zip(surface.node_id(node))
            .and_then(|(target, source)| {
                connected.iter().copied().find(|edge| {
                    surface
                        .edge_key(*edge)
                        .is_some_and(|key| key.source() == source && key.target() == target)
                })
            });

        match port_edge {
            Some(edge) => self.highlight(surface, &[edge]),
            None => self.highlight(surface, &connected),
        }
    }

    /// Fades every drawn edge to the inactive color and `edges` to the active
    /// one, raising them above the rest.
    pub fn highlight<S: Surface>(&self, surface: &mut S, edges: &[EdgeHandle]) {
        for edge in surface.edges() {
            surface.transition_color(edge, self.inactive, self.duration);
        }
        for edge in edges {
            surface.transition_color(*edge, self.active, self.duration);
        }
        for edge in edges {
            surface.bring_to_front(Element::Edge(*edge));
        }
    }
}
