//! Snapshots of a drawn graph.

pub mod svg;

use std::io;

use thiserror::Error;

/// A snapshot could not be written.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
