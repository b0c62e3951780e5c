//! Error types for type graph operations.
//!
//! [`TypeGraphError`] is what every public [`TypeGraph`](crate::TypeGraph)
//! operation returns. It wraps the errors of the collaborators the pipeline
//! drives so callers can tell a rejected focus apart from a layout or drawing
//! failure.

use thiserror::Error;

use typescope_core::catalog::CatalogError;

use crate::{animation::ApplyError, config::ConfigError, layout::LayoutError, surface::RenderError};

/// The main error type for type graph operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeGraphError {
    /// The requested focus is neither drawn nor the `root` overview.
    #[error("cannot focus `{id}`: it is not a drawn element")]
    InvalidFocus { id: String },

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Rendering error: {0}")]
    Rendering(#[from] RenderError),

    #[error("type graph is not initialized")]
    NotInitialized,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("unknown event `{0}`")]
    UnknownEvent(String),
}

impl From<ApplyError> for TypeGraphError {
    fn from(error: ApplyError) -> Self {
        match error {
            ApplyError::Layout(err) => Self::Layout(err),
            ApplyError::Rendering(err) => Self::Rendering(err),
        }
    }
}
