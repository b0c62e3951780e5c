//! Catalog file loading.

use std::{fs, path::Path};

use log::debug;

use typescope::catalog::TypeCatalog;

use crate::error::CliError;

/// Reads a type catalog, choosing the format from the file extension.
///
/// # Errors
///
/// Returns [`CliError::UnsupportedFormat`] for anything but `.toml` and
/// `.json`, [`CliError::Io`] when the file cannot be read and
/// [`CliError::CatalogParse`] when it does not describe a valid catalog.
pub fn load_catalog(path: &Path) -> Result<TypeCatalog, CliError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default();
    if !matches!(extension, "toml" | "json") {
        return Err(CliError::UnsupportedFormat(extension.to_string()));
    }

    let content = fs::read_to_string(path)?;
    let parsed = if extension == "toml" {
        toml::from_str::<TypeCatalog>(&content).map_err(|err| err.to_string())
    } else {
        serde_json::from_str::<TypeCatalog>(&content).map_err(|err| err.to_string())
    };

    let catalog = parsed.map_err(|message| CliError::CatalogParse {
        path: path.to_path_buf(),
        message,
    })?;
    debug!(path:? = path, types = catalog.len(); "Loaded catalog");
    Ok(catalog)
}
