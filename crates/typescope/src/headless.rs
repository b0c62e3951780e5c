//! In-memory drawing and pan/zoom collaborators.
//!
//! [`HeadlessSurface`] keeps constructed elements, the drawn subset, z-order,
//! edge colors and tool visibility in plain collections, which makes the
//! pipeline runnable without a GUI and every effect observable from tests.
//! [`HeadlessViewport`] models an svg-pan-zoom style viewport: an absolute
//! zoom about the viewport center and a screen-space pan offset.

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use futures::{
    channel::oneshot,
    future::{self, LocalBoxFuture},
};
use indexmap::IndexMap;
use log::{debug, trace};

use typescope_core::{
    color::Color,
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::surface::{
    EdgeHandle, EdgeKey, EdgeSpec, Element, NodeHandle, NodeSpec, PanZoom, RenderError, Surface,
    ViewportOptions,
};

/// How [`HeadlessSurface::animate_position`] completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnimationMode {
    /// Moves land at once and their futures are ready.
    #[default]
    Immediate,
    /// Moves are parked until [`HeadlessSurface::finish_animation`] or
    /// [`HeadlessSurface::finish_all_animations`] completes them.
    Manual,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    spec: NodeSpec,
    position: Point,
    port_fill_resets: usize,
}

#[derive(Debug, Clone)]
struct EdgeRecord {
    spec: EdgeSpec,
    color: Option<Color>,
}

/// A parked position animation.
#[derive(Debug)]
struct PendingMove {
    target: Point,
    done: oneshot::Sender<()>,
}

/// Drawing collaborator that draws into memory.
#[derive(Debug)]
pub struct HeadlessSurface {
    size: Size,
    next_handle: u64,
    nodes: HashMap<NodeHandle, NodeRecord>,
    edges: HashMap<EdgeHandle, EdgeRecord>,
    /// Drawn elements, back to front.
    drawn: Vec<Element>,
    tools: HashSet<EdgeHandle>,
    animation_mode: AnimationMode,
    pending: IndexMap<NodeHandle, PendingMove>,
    animations_started: usize,
    failing_ids: HashSet<String>,
    fail_next_removal: bool,
}

impl HeadlessSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            next_handle: 0,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            drawn: Vec::new(),
            tools: HashSet::new(),
            animation_mode: AnimationMode::default(),
            pending: IndexMap::new(),
            animations_started: 0,
            failing_ids: HashSet::new(),
            fail_next_removal: false,
        }
    }

    pub fn animation_mode(&self) -> AnimationMode {
        self.animation_mode
    }

    pub fn set_animation_mode(&mut self, mode: AnimationMode) {
        self.animation_mode = mode;
    }

    /// Makes creating the node `id`, or the edge displayed as `id`
    /// (`source_target`), fail.
    pub fn fail_creation_of(&mut self, id: &str) {
        self.failing_ids.insert(id.to_string());
    }

    /// Makes the next [`Surface::remove_elements`] call fail.
    pub fn fail_next_removal(&mut self) {
        self.fail_next_removal = true;
    }

    /// Completes the parked animation of `node`. Returns false when none was
    /// parked.
    pub fn finish_animation(&mut self, node: NodeHandle) -> bool {
        let Some(pending) = self.pending.shift_remove(&node) else {
            return false;
        };
        if let Some(record) = self.nodes.get_mut(&node) {
            record.position = pending.target;
        }
        // The receiver is gone when the awaiting pipeline was dropped.
        let _ = pending.done.send(());
        true
    }

    /// Completes every parked animation in the order they were started.
    pub fn finish_all_animations(&mut self) -> usize {
        let parked: Vec<NodeHandle> = self.pending.keys().copied().collect();
        parked
            .into_iter()
            .filter(|node| self.finish_animation(*node))
            .count()
    }

    /// Nodes with a parked animation, in start order.
    pub fn pending_animations(&self) -> Vec<NodeHandle> {
        self.pending.keys().copied().collect()
    }

    /// Number of position animations started since construction.
    pub fn animations_started(&self) -> usize {
        self.animations_started
    }

    /// Number of constructed elements not yet disposed.
    pub fn constructed_count(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn node_spec(&self, node: NodeHandle) -> Option<&NodeSpec> {
        self.nodes.get(&node).map(|record| &record.spec)
    }

    pub fn edge_spec(&self, edge: EdgeHandle) -> Option<&EdgeSpec> {
        self.edges.get(&edge).map(|record| &record.spec)
    }

    /// Current stroke of an edge; `None` until a color transition ran.
    pub fn edge_color(&self, edge: EdgeHandle) -> Option<Color> {
        self.edges.get(&edge).and_then(|record| record.color)
    }

    /// How often the port fill of `node` was reset.
    pub fn port_fill_resets(&self, node: NodeHandle) -> usize {
        self.nodes
            .get(&node)
            .map_or(0, |record| record.port_fill_resets)
    }

    pub fn tools_visible(&self, edge: EdgeHandle) -> bool {
        self.tools.contains(&edge)
    }

    /// Drawn elements, back to front.
    pub fn z_order(&self) -> &[Element] {
        &self.drawn
    }

    /// The drawn node depicting `id`.
    pub fn drawn_node(&self, id: Id) -> Option<NodeHandle> {
        self.drawn.iter().find_map(|element| match element {
            Element::Node(node) if self.node_id(*node) == Some(id) => Some(*node),
            _ => None,
        })
    }

    /// The drawn edge keyed `key`.
    pub fn drawn_edge(&self, key: EdgeKey) -> Option<EdgeHandle> {
        self.drawn.iter().find_map(|element| match element {
            Element::Edge(edge) if self.edge_key(*edge) == Some(key) => Some(*edge),
            _ => None,
        })
    }

    fn next_raw(&mut self) -> u64 {
        let raw = self.next_handle;
        self.next_handle += 1;
        raw
    }

    fn drawn_ids(&self) -> HashSet<Id> {
        self.nodes()
            .into_iter()
            .filter_map(|node| self.node_id(node))
            .collect()
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(Size::new(1024.0, 768.0))
    }
}

impl Surface for HeadlessSurface {
    type Container = ();
    type Viewport = HeadlessViewport;

    fn mount(_container: Self::Container, size: Size) -> Result<Self, RenderError> {
        debug!(width = size.width(), height = size.height(); "Mounting headless surface");
        Ok(Self::new(size))
    }

    fn create_node(&mut self, spec: &NodeSpec) -> Result<NodeHandle, RenderError> {
        let id = spec.id.to_text();
        if self.failing_ids.contains(&id) {
            return Err(RenderError::Create {
                id,
                reason: "injected failure".to_string(),
            });
        }
        let handle = NodeHandle::new(self.next_raw());
        self.nodes.insert(
            handle,
            NodeRecord {
                spec: spec.clone(),
                position: spec.position,
                port_fill_resets: 0,
            },
        );
        Ok(handle)
    }

    fn create_edge(&mut self, spec: &EdgeSpec) -> Result<EdgeHandle, RenderError> {
        let id = spec.key.to_string();
        if self.failing_ids.contains(&id) {
            return Err(RenderError::Create {
                id,
                reason: "injected failure".to_string(),
            });
        }
        let handle = EdgeHandle::new(self.next_raw());
        self.edges.insert(
            handle,
            EdgeRecord {
                spec: spec.clone(),
                color: None,
            },
        );
        Ok(handle)
    }

    fn dispose(&mut self, element: Element) {
        if self.is_drawn(element) {
            return;
        }
        match element {
            Element::Node(node) => {
                self.nodes.remove(&node);
                self.pending.shift_remove(&node);
            }
            Element::Edge(edge) => {
                self.edges.remove(&edge);
                self.tools.remove(&edge);
            }
        }
    }

    fn add_elements(&mut self, elements: &[Element]) {
        for element in elements {
            let Element::Node(node) = element else {
                continue;
            };
            if self.nodes.contains_key(node) && !self.drawn.contains(element) {
                self.drawn.push(*element);
            }
        }
        let drawn_ids = self.drawn_ids();
        for element in elements {
            let Element::Edge(edge) = element else {
                continue;
            };
            let endpoints_drawn = self.edges.get(edge).is_some_and(|record| {
                drawn_ids.contains(&record.spec.key.source())
                    && drawn_ids.contains(&record.spec.key.target())
            });
            if endpoints_drawn && !self.drawn.contains(element) {
                self.drawn.push(*element);
            }
        }
    }

    fn remove_elements(&mut self, elements: &[Element]) -> Result<(), RenderError> {
        if self.fail_next_removal {
            self.fail_next_removal = false;
            return Err(RenderError::Remove("injected failure".to_string()));
        }

        let removed_ids: HashSet<Id> = elements
            .iter()
            .filter_map(|element| match element {
                Element::Node(node) => self.node_id(*node),
                Element::Edge(_) => None,
            })
            .collect();
        let edges = &self.edges;
        self.drawn.retain(|element| match element {
            Element::Node(_) => !elements.contains(element),
            Element::Edge(edge) => {
                !elements.contains(element)
                    && !edges.get(edge).is_some_and(|record| {
                        removed_ids
                            .iter()
                            .any(|id| record.spec.key.touches(*id))
                    })
            }
        });
        let drawn: HashSet<Element> = self.drawn.iter().copied().collect();
        self.tools
            .retain(|edge| drawn.contains(&Element::Edge(*edge)));
        trace!(count = elements.len(); "Removed elements");
        Ok(())
    }

    fn nodes(&self) -> Vec<NodeHandle> {
        self.drawn
            .iter()
            .filter_map(|element| match element {
                Element::Node(node) => Some(*node),
                Element::Edge(_) => None,
            })
            .collect()
    }

    fn edges(&self) -> Vec<EdgeHandle> {
        self.drawn
            .iter()
            .filter_map(|element| match element {
                Element::Edge(edge) => Some(*edge),
                Element::Node(_) => None,
            })
            .collect()
    }

    fn is_drawn(&self, element: Element) -> bool {
        self.drawn.contains(&element)
    }

    fn node_id(&self, node: NodeHandle) -> Option<Id> {
        self.nodes.get(&node).map(|record| record.spec.id)
    }

    fn edge_key(&self, edge: EdgeHandle) -> Option<EdgeKey> {
        self.edges.get(&edge).map(|record| record.spec.key)
    }

    fn port_target(&self, node: NodeHandle, port: &str) -> Option<Id> {
        self.nodes
            .get(&node)?
            .spec
            .out_ports
            .iter()
            .find(|spec| spec.id == port)
            .and_then(|spec| spec.target)
    }

    fn bbox(&self, node: NodeHandle) -> Option<Bounds> {
        self.nodes
            .get(&node)
            .map(|record| Bounds::new_from_top_left(record.position, record.spec.size))
    }

    fn content_bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(self.nodes().into_iter().filter_map(|node| self.bbox(node)))
    }

    fn connected_edges(&self, node: NodeHandle) -> Vec<EdgeHandle> {
        let Some(id) = self.node_id(node) else {
            return Vec::new();
        };
        self.edges()
            .into_iter()
            .filter(|edge| self.edge_key(*edge).is_some_and(|key| key.touches(id)))
            .collect()
    }

    fn set_position(&mut self, node: NodeHandle, position: Point) {
        if let Some(pending) = self.pending.shift_remove(&node) {
            let _ = pending.done.send(());
        }
        if let Some(record) = self.nodes.get_mut(&node) {
            record.position = position;
        }
    }

    fn animate_position(
        &mut self,
        node: NodeHandle,
        target: Point,
        duration: Duration,
    ) -> LocalBoxFuture<'static, ()> {
        self.animations_started += 1;
        trace!(node = node.raw(), duration:?; "Animating node position");

        match self.animation_mode {
            AnimationMode::Immediate => {
                self.set_position(node, target);
                Box::pin(future::ready(()))
            }
            AnimationMode::Manual => {
                let (done, finished) = oneshot::channel();
                // A newer move supersedes the parked one, which resolves.
                if let Some(previous) = self.pending.insert(node, PendingMove { target, done }) {
                    let _ = previous.done.send(());
                }
                Box::pin(async move {
                    let _ = finished.await;
                })
            }
        }
    }

    fn transition_color(&mut self, edge: EdgeHandle, color: Color, _duration: Duration) {
        if let Some(record) = self.edges.get_mut(&edge) {
            record.color = Some(color);
        }
    }

    fn bring_to_front(&mut self, element: Element) {
        if let Some(index) = self.drawn.iter().position(|drawn| *drawn == element) {
            let element = self.drawn.remove(index);
            self.drawn.push(element);
        }
    }

    fn reset_port_fill(&mut self, node: NodeHandle) {
        if let Some(record) = self.nodes.get_mut(&node) {
            record.port_fill_resets += 1;
        }
    }

    fn show_tools(&mut self, edge: EdgeHandle) {
        if self.is_drawn(Element::Edge(edge)) {
            self.tools.insert(edge);
        }
    }

    fn hide_tools(&mut self) {
        self.tools.clear();
    }

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn create_viewport(&mut self, options: ViewportOptions) -> Self::Viewport {
        let mut viewport = HeadlessViewport::new(self.size, options);
        viewport.update_bbox(self.content_bounds());
        if options.fit {
            viewport.fit();
        }
        viewport
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.drawn.clear();
        self.tools.clear();
        // Dropping the senders resolves every parked animation.
        self.pending.clear();
    }
}

/// Pan/zoom collaborator over a [`HeadlessSurface`].
///
/// A graph point `p` is shown at `p * zoom + pan` on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessViewport {
    size: Size,
    pan: Point,
    zoom: f32,
    max_zoom: f32,
    content: Option<Bounds>,
    pan_enabled: bool,
}

impl HeadlessViewport {
    pub fn new(size: Size, options: ViewportOptions) -> Self {
        Self {
            size,
            pan: Point::default(),
            zoom: 1.0,
            max_zoom: options.max_zoom,
            content: None,
            pan_enabled: options.pan_enabled,
        }
    }

    pub fn is_pan_enabled(&self) -> bool {
        self.pan_enabled
    }

    /// Content box recorded by the last [`PanZoom::update_bbox`].
    pub fn content(&self) -> Option<Bounds> {
        self.content
    }

    /// Maps a graph point to the screen.
    pub fn to_screen(&self, point: Point) -> Point {
        point.scale(self.zoom).add_point(self.pan)
    }
}

impl PanZoom for HeadlessViewport {
    fn fit(&mut self) {
        let Some(content) = self.content else {
            return;
        };
        if content.to_size().is_empty() || self.size.is_empty() {
            return;
        }
        let zoom = (self.size.width() / content.width())
            .min(self.size.height() / content.height())
            .min(self.max_zoom);
        self.zoom = zoom;
        let viewport_center = Point::new(self.size.width() / 2.0, self.size.height() / 2.0);
        self.pan = viewport_center.sub_point(content.center().scale(zoom));
    }

    fn pan(&mut self, to: Point) {
        self.pan = to;
    }

    fn zoom(&mut self, level: f32) {
        if !level.is_finite() || level <= 0.0 {
            return;
        }
        let level = level.min(self.max_zoom);
        let center = Point::new(self.size.width() / 2.0, self.size.height() / 2.0);
        let focus = center.sub_point(self.pan).scale(1.0 / self.zoom);
        self.zoom = level;
        self.pan = center.sub_point(focus.scale(level));
    }

    fn pan_position(&self) -> Point {
        self.pan
    }

    fn zoom_level(&self) -> f32 {
        self.zoom
    }

    fn sizes(&self) -> Size {
        self.size
    }

    fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Point::default();
        self.fit();
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn update_bbox(&mut self, content: Option<Bounds>) {
        self.content = content;
    }

    fn enable_pan(&mut self) {
        self.pan_enabled = true;
    }

    fn disable_pan(&mut self) {
        self.pan_enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use futures::executor::block_on;
    use typescope_core::catalog::EntityKind;

    use super::*;
    use crate::surface::{Anchor, PortSpec};

    fn node_spec(name: &str, position: Point) -> NodeSpec {
        NodeSpec {
            id: Id::new(name),
            kind: EntityKind::Object,
            title: name.to_string(),
            in_ports: Vec::new(),
            out_ports: Vec::new(),
            size: Size::new(100.0, 50.0),
            position,
        }
    }

    fn edge_spec(source: &str, target: &str) -> EdgeSpec {
        EdgeSpec {
            key: EdgeKey::new(Id::new(source), Id::new(target)),
            fields: Vec::new(),
            source_anchor: Anchor::default(),
            target_anchor: Anchor::default(),
        }
    }

    fn surface_with_pair() -> (HeadlessSurface, NodeHandle, NodeHandle, EdgeHandle) {
        let mut surface = HeadlessSurface::default();
        let a = surface.create_node(&node_spec("A", Point::default())).unwrap();
        let b = surface
            .create_node(&node_spec("B", Point::new(200.0, 0.0)))
            .unwrap();
        let edge = surface.create_edge(&edge_spec("A", "B")).unwrap();
        surface.add_elements(&[Element::Node(a), Element::Node(b), Element::Edge(edge)]);
        (surface, a, b, edge)
    }

    #[test]
    fn test_construction_is_separate_from_drawing() {
        let mut surface = HeadlessSurface::default();
        let node = surface.create_node(&node_spec("A", Point::default())).unwrap();
        assert!(!surface.is_drawn(Element::Node(node)));
        assert_eq!(surface.node_id(node), Some(Id::new("A")));

        surface.add_elements(&[Element::Node(node)]);
        assert_eq!(surface.nodes(), vec![node]);
    }

    #[test]
    fn test_edges_need_drawn_endpoints() {
        let mut surface = HeadlessSurface::default();
        let a = surface.create_node(&node_spec("A", Point::default())).unwrap();
        let edge = surface.create_edge(&edge_spec("A", "B")).unwrap();
        surface.add_elements(&[Element::Node(a), Element::Edge(edge)]);
        assert!(surface.edges().is_empty());
    }

    #[test]
    fn test_removing_a_node_drops_its_edges() {
        let (mut surface, a, b, edge) = surface_with_pair();
        assert_eq!(surface.connected_edges(b), vec![edge]);

        surface.remove_elements(&[Element::Node(a)]).unwrap();
        assert_eq!(surface.nodes(), vec![b]);
        assert!(surface.edges().is_empty());
        assert_eq!(surface.edge_key(edge).unwrap().to_string(), "A_B");
    }

    #[test]
    fn test_injected_removal_failure_changes_nothing() {
        let (mut surface, a, _, _) = surface_with_pair();
        surface.fail_next_removal();
        assert!(surface.remove_elements(&[Element::Node(a)]).is_err());
        assert_eq!(surface.z_order().len(), 3);
        assert!(surface.remove_elements(&[Element::Node(a)]).is_ok());
    }

    #[test]
    fn test_injected_creation_failure() {
        let mut surface = HeadlessSurface::default();
        surface.fail_creation_of("A_B");
        assert!(surface.create_node(&node_spec("A", Point::default())).is_ok());
        let err = surface.create_edge(&edge_spec("A", "B")).unwrap_err();
        assert_eq!(
            err,
            RenderError::Create {
                id: "A_B".to_string(),
                reason: "injected failure".to_string()
            }
        );
    }

    #[test]
    fn test_dispose_only_releases_undrawn_elements() {
        let (mut surface, a, _, _) = surface_with_pair();
        surface.dispose(Element::Node(a));
        assert_eq!(surface.constructed_count(), 3);

        surface.remove_elements(&[Element::Node(a)]).unwrap();
        surface.dispose(Element::Node(a));
        assert_eq!(surface.constructed_count(), 2);
    }

    #[test]
    fn test_bring_to_front_and_tools() {
        let (mut surface, a, _, edge) = surface_with_pair();
        surface.bring_to_front(Element::Node(a));
        assert_eq!(surface.z_order().last(), Some(&Element::Node(a)));

        surface.show_tools(edge);
        assert!(surface.tools_visible(edge));
        surface.hide_tools();
        assert!(!surface.tools_visible(edge));
    }

    #[test]
    fn test_port_target() {
        let mut surface = HeadlessSurface::default();
        let mut spec = node_spec("A", Point::default());
        spec.out_ports.push(PortSpec {
            id: "A_b_B".to_string(),
            label: "B!".to_string(),
            target: Some(Id::new("B")),
        });
        let node = surface.create_node(&spec).unwrap();
        assert_eq!(surface.port_target(node, "A_b_B"), Some(Id::new("B")));
        assert_eq!(surface.port_target(node, "missing"), None);
    }

    #[test]
    fn test_immediate_animation_lands_at_once() {
        let (mut surface, a, _, _) = surface_with_pair();
        let done = surface.animate_position(a, Point::new(50.0, 60.0), Duration::from_millis(500));
        assert_eq!(surface.bbox(a).unwrap().min_point(), Point::new(50.0, 60.0));
        block_on(done);
        assert_eq!(surface.animations_started(), 1);
    }

    #[test]
    fn test_manual_animation_is_parked() {
        let (mut surface, a, b, _) = surface_with_pair();
        surface.set_animation_mode(AnimationMode::Manual);

        let first = surface.animate_position(a, Point::new(10.0, 10.0), Duration::ZERO);
        let _second = surface.animate_position(b, Point::new(20.0, 20.0), Duration::ZERO);
        assert_eq!(surface.pending_animations(), vec![a, b]);
        assert_eq!(surface.bbox(a).unwrap().min_point(), Point::default());

        assert!(surface.finish_animation(a));
        assert!(!surface.finish_animation(a));
        block_on(first);
        assert_eq!(surface.bbox(a).unwrap().min_point(), Point::new(10.0, 10.0));
        assert_eq!(surface.finish_all_animations(), 1);
        assert!(surface.pending_animations().is_empty());
    }

    #[test]
    fn test_set_position_cancels_parked_animation() {
        let (mut surface, a, b, _) = surface_with_pair();
        surface.set_animation_mode(AnimationMode::Manual);

        let done = surface.animate_position(a, Point::new(300.0, 300.0), Duration::ZERO);
        surface.set_position(a, Point::new(5.0, 5.0));
        block_on(done);

        assert!(surface.pending_animations().is_empty());
        assert_eq!(surface.finish_all_animations(), 0);
        assert_eq!(surface.bbox(a).unwrap().min_point(), Point::new(5.0, 5.0));
        assert_eq!(surface.bbox(b).unwrap().min_point(), Point::new(200.0, 0.0));
    }

    #[test]
    fn test_content_bounds() {
        let (surface, _, _, _) = surface_with_pair();
        let bounds = surface.content_bounds().unwrap();
        assert_eq!(bounds.min_point(), Point::default());
        assert_eq!(bounds.to_size(), Size::new(300.0, 50.0));
        assert_eq!(HeadlessSurface::default().content_bounds(), None);
    }

    #[test]
    fn test_viewport_fit_centers_content() {
        let mut viewport = HeadlessViewport::new(
            Size::new(400.0, 400.0),
            ViewportOptions {
                max_zoom: 20.0,
                fit: true,
                pan_enabled: false,
            },
        );
        viewport.update_bbox(Some(Bounds::new_from_top_left(
            Point::new(100.0, 100.0),
            Size::new(200.0, 100.0),
        )));
        viewport.fit();

        assert_approx_eq!(f32, viewport.zoom_level(), 2.0);
        let center = viewport.to_screen(Point::new(200.0, 150.0));
        assert!(center.approx_eq(Point::new(200.0, 200.0), 0.001));
    }

    #[test]
    fn test_viewport_zoom_keeps_center_fixed() {
        let mut viewport = HeadlessViewport::new(
            Size::new(400.0, 300.0),
            ViewportOptions {
                max_zoom: 5.0,
                fit: false,
                pan_enabled: false,
            },
        );
        viewport.pan(Point::new(30.0, -20.0));
        let center = Point::new(200.0, 150.0);
        let graph_center = center.sub_point(viewport.pan_position());

        viewport.zoom(3.0);
        assert!(
            viewport
                .to_screen(graph_center)
                .approx_eq(center, 0.001)
        );

        viewport.zoom(50.0);
        assert_approx_eq!(f32, viewport.zoom_level(), 5.0);
    }

    #[test]
    fn test_viewport_pan_flag() {
        let mut surface = HeadlessSurface::default();
        let mut viewport = surface.create_viewport(ViewportOptions {
            max_zoom: 20.0,
            fit: true,
            pan_enabled: false,
        });
        assert!(!viewport.is_pan_enabled());
        viewport.enable_pan();
        assert!(viewport.is_pan_enabled());
        viewport.disable_pan();
        assert!(!viewport.is_pan_enabled());
        assert_eq!(viewport.sizes(), Size::new(1024.0, 768.0));
    }
}
