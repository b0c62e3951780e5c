//! Typescope CLI library
//!
//! This module contains the core CLI logic: it loads a catalog, drives a
//! headless [`TypeGraph`] to the requested focus and writes an SVG snapshot.

mod args;
mod catalog;
mod config;
mod error;

pub use args::Args;
pub use error::CliError;

use std::path::Path;

use futures::executor::block_on;
use log::info;

use typescope::{
    TypeGraph, TypeGraphBuilder, TypeGraphError,
    export::svg::SvgExporter,
    geometry::Size,
    headless::HeadlessSurface,
};

/// Run the Typescope CLI application
///
/// Renders the catalog without animation, centered on `--focus` when given,
/// and writes the drawn graph as seen through the fitted viewport.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Catalog parsing errors
/// - Invalid focus, layout and rendering errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        catalog_path = args.catalog,
        output_path = args.output;
        "Processing catalog"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let theme = app_config.theme()?;
    let catalog = catalog::load_catalog(Path::new(&args.catalog))?;

    let graph: TypeGraph<HeadlessSurface> = TypeGraphBuilder::new(app_config).build()?;
    graph.disable_animation();
    block_on(graph.init((), Size::new(args.width, args.height), catalog))?;
    if let Some(focus) = &args.focus {
        block_on(graph.set_focus(focus))?;
    }

    let viewport = graph.with_viewport(|viewport| viewport.clone());
    let exporter = SvgExporter::new(&theme);
    graph
        .with_surface(|surface| exporter.write(surface, viewport.as_ref(), Path::new(&args.output)))
        .ok_or(TypeGraphError::NotInitialized)??;

    info!(
        focus = graph.focus(),
        nodes = graph.drawn_node_ids().len(),
        edges = graph.drawn_edge_keys().len(),
        output_file = args.output;
        "SVG exported successfully"
    );

    Ok(())
}
