//! Errors reported by the CLI.
//!
//! Every variant carries a diagnostic code so `main` can render it through
//! miette's graphical handler.

use std::{io, path::PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use typescope::{TypeGraphError, config::ConfigError, export};

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(typescope::io))]
    Io(#[from] io::Error),

    #[error("Missing configuration file: {}", .0.display())]
    #[diagnostic(
        code(typescope::config),
        help("`--config` must point at an existing TOML file")
    )]
    MissingConfig(PathBuf),

    #[error("Failed to parse TOML configuration: {0}")]
    #[diagnostic(code(typescope::config))]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(typescope::config))]
    Config(#[from] ConfigError),

    #[error("Unsupported catalog format `{0}`")]
    #[diagnostic(
        code(typescope::catalog),
        help("catalogs are read from `.toml` or `.json` files")
    )]
    UnsupportedFormat(String),

    #[error("Failed to parse catalog {}: {message}", .path.display())]
    #[diagnostic(
        code(typescope::catalog),
        help("declare every type under `types` with a `kind` and its `fields`")
    )]
    CatalogParse { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(code(typescope::graph))]
    Graph(#[from] TypeGraphError),

    #[error("Export error: {0}")]
    #[diagnostic(code(typescope::export))]
    Export(#[from] export::Error),
}
