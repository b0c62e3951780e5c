//! SVG rendering of a [`HeadlessSurface`].
//!
//! Elements are emitted in the surface's z-order: a node becomes a group with
//! its box, title band and one row per field, an edge becomes a curve between
//! its two anchors stroked with its current highlight color.

use std::{fs, path::Path};

use log::{debug, error, info};
use svg::{Document, node::element as svg_element};

use typescope_core::geometry::{Point, Size};

use crate::{
    config::Theme,
    export,
    headless::{HeadlessSurface, HeadlessViewport},
    surface::{EdgeHandle, Element, NodeHandle, PanZoom, Surface},
};

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const TITLE_FONT_SIZE: f32 = 18.0;
const ROW_FONT_SIZE: f32 = 14.0;
const TEXT_PADDING: f32 = 12.0;

/// Margin around the content when no viewport frames it.
const MARGIN: f32 = 50.0;

/// Renders drawn graphs to SVG documents.
#[derive(Debug, Clone, Copy)]
pub struct SvgExporter<'a> {
    theme: &'a Theme,
}

impl<'a> SvgExporter<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    /// Renders the drawn graph of `surface`.
    ///
    /// With a viewport the document has the viewport's size and shows the
    /// graph through its pan and zoom. Without one the document is sized to
    /// the content plus a margin.
    pub fn render(&self, surface: &HeadlessSurface, viewport: Option<&HeadlessViewport>) -> Document {
        let (size, transform) = match viewport {
            Some(viewport) => {
                let pan = viewport.pan_position();
                (
                    viewport.sizes(),
                    format!(
                        "translate({} {}) scale({})",
                        pan.x(),
                        pan.y(),
                        viewport.zoom_level()
                    ),
                )
            }
            None => {
                let content = surface.content_bounds().unwrap_or_default();
                let size = Size::new(
                    MARGIN.mul_add(2.0, content.width()),
                    MARGIN.mul_add(2.0, content.height()),
                );
                (
                    size,
                    format!(
                        "translate({} {})",
                        MARGIN - content.min_x(),
                        MARGIN - content.min_y()
                    ),
                )
            }
        };
        debug!(width = size.width(), height = size.height(); "SVG dimensions");

        let mut graph = svg_element::Group::new()
            .set("class", "graph")
            .set("transform", transform);
        for element in surface.z_order() {
            match element {
                Element::Node(node) => {
                    if let Some(rendered) = self.render_node(surface, *node) {
                        graph = graph.add(rendered);
                    }
                }
                Element::Edge(edge) => {
                    if let Some(rendered) = self.render_edge(surface, *edge) {
                        graph = graph.add(rendered);
                    }
                }
            }
        }

        let background = svg_element::Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", &self.theme.background());

        Document::new()
            .set(
                "viewBox",
                format!("0 0 {} {}", size.width(), size.height()),
            )
            .set("width", size.width())
            .set("height", size.height())
            .add(background)
            .add(graph)
    }

    /// Writes the rendered graph of `surface` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`export::Error::Io`] when the file cannot be written.
    pub fn write(
        &self,
        surface: &HeadlessSurface,
        viewport: Option<&HeadlessViewport>,
        path: &Path,
    ) -> Result<(), export::Error> {
        let doc = self.render(surface, viewport);
        info!(path:? = path; "Writing SVG snapshot");
        fs::write(path, doc.to_string()).map_err(|err| {
            error!(path:? = path, err:err; "Failed to write SVG snapshot");
            export::Error::Io(err)
        })
    }

    fn render_node(&self, surface: &HeadlessSurface, node: NodeHandle) -> Option<svg_element::Group> {
        let spec = surface.node_spec(node)?;
        let bounds = surface.bbox(node)?;
        let header_bottom = bounds.min_y() + self.theme.header_height();

        let mut group = svg_element::Group::new()
            .set("class", "node")
            .set("data-id", spec.id.to_text())
            .add(
                svg_element::Rectangle::new()
                    .set("x", bounds.min_x())
                    .set("y", bounds.min_y())
                    .set("width", bounds.width())
                    .set("height", bounds.height())
                    .set("rx", 4)
                    .set("fill", &self.theme.node())
                    .set("stroke", &self.theme.text()),
            )
            .add(self.text(
                &spec.title,
                Point::new(bounds.center().x(), bounds.min_y() + self.theme.header_height() / 2.0),
                "middle",
                TITLE_FONT_SIZE,
            ))
            .add(
                svg_element::Line::new()
                    .set("x1", bounds.min_x())
                    .set("y1", header_bottom)
                    .set("x2", bounds.max_x())
                    .set("y2", header_bottom)
                    .set("stroke", &self.theme.text()),
            );

        for (row, port) in spec.in_ports.iter().enumerate() {
            let y = (row as f32 + 0.5).mul_add(self.theme.row_height(), header_bottom);
            group = group.add(self.text(
                &port.label,
                Point::new(bounds.min_x() + TEXT_PADDING, y),
                "start",
                ROW_FONT_SIZE,
            ));

            let out_port = spec.out_ports.iter().find(|out| {
                out.target
                    .is_some_and(|target| out.id == format!("{}_{}_{}", spec.id, port.id, target))
            });
            if let Some(out_port) = out_port {
                group = group.add(
                    self.text(
                        &out_port.label,
                        Point::new(bounds.max_x() - TEXT_PADDING, y),
                        "end",
                        ROW_FONT_SIZE,
                    )
                    .set("class", "port")
                    .set("data-port", out_port.id.as_str()),
                );
            }
        }

        Some(group)
    }

    fn render_edge(&self, surface: &HeadlessSurface, edge: EdgeHandle) -> Option<svg_element::Path> {
        let spec = surface.edge_spec(edge)?;
        let source = surface.bbox(surface.drawn_node(spec.key.source())?)?;
        let target = surface.bbox(surface.drawn_node(spec.key.target())?)?;
        let start = spec.source_anchor.resolve(source);
        let end = spec.target_anchor.resolve(target);
        let mid_x = (start.x() + end.x()) / 2.0;

        let color = surface
            .edge_color(edge)
            .unwrap_or_else(|| self.theme.active_line());
        let fields: Vec<String> = spec.fields.iter().map(|field| field.to_text()).collect();

        Some(
            svg_element::Path::new()
                .set("class", "edge")
                .set("data-edge", spec.key.to_string())
                .set("data-fields", fields.join(","))
                .set(
                    "d",
                    format!(
                        "M {} {} C {} {}, {} {}, {} {}",
                        start.x(),
                        start.y(),
                        mid_x,
                        start.y(),
                        mid_x,
                        end.y(),
                        end.x(),
                        end.y()
                    ),
                )
                .set("fill", "none")
                .set("stroke", &color)
                .set("stroke-width", 2),
        )
    }

    fn text(&self, content: &str, position: Point, anchor: &str, font_size: f32) -> svg_element::Text {
        svg_element::Text::new(content)
            .set("x", position.x())
            .set("y", position.y())
            .set("text-anchor", anchor)
            .set("dominant-baseline", "middle")
            .set("font-family", FONT_FAMILY)
            .set("font-size", font_size)
            .set("fill", &self.theme.text())
    }
}
