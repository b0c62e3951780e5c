//! Typescope - Incremental rendering of type catalogs as graphs.
//!
//! A [`TypeGraph`] draws the entities of a type catalog around a focus
//! entity and keeps the drawing in sync as the focus or the catalog changes.
//! Each change runs the same pipeline:
//!
//! 1. [`filter`] selects the render set for the focus;
//! 2. [`reconcile`] diffs it against the drawn graph, reusing elements from
//!    the identity [`cache`];
//! 3. a [`layout`] engine computes layered positions;
//! 4. [`animation`] moves nodes there, tweening when enabled;
//! 5. [`viewport`] refits pan and zoom to the content.
//!
//! Drawing and pan/zoom are delegated to the [`surface::Surface`] and
//! [`surface::PanZoom`] collaborators; [`headless`] provides in-memory
//! implementations of both, and [`export::svg`] snapshots them as SVG.

pub mod animation;
pub mod cache;
pub mod clock;
pub mod config;
pub mod export;
pub mod filter;
pub mod headless;
pub mod interaction;
pub mod layout;
pub mod pipeline;
pub mod reconcile;
pub mod surface;
pub mod viewport;

mod controller;
mod error;

pub use typescope_core::{catalog, color, geometry, identifier, introspection};

pub use controller::{TypeGraph, TypeGraphBuilder};
pub use error::TypeGraphError;
pub use interaction::InteractionEvent;
pub use pipeline::{LoadingEvent, PipelineState, RenderOutcome};
