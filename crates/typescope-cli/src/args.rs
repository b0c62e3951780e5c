//! Command-line argument definitions for the Typescope CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the catalog, the focus, the snapshot size
//! and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Typescope snapshot tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the type catalog
    #[arg(help = "Path to the catalog file (.toml or .json)")]
    pub catalog: String,

    /// Entity to center the graph on; the overview when omitted
    #[arg(short, long)]
    pub focus: Option<String>,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Width of the snapshot in pixels
    #[arg(long, default_value_t = 1024.0)]
    pub width: f32,

    /// Height of the snapshot in pixels
    #[arg(long, default_value_t = 768.0)]
    pub height: f32,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
