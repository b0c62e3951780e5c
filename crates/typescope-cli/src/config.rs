//! Configuration file loading for the CLI
//!
//! The configuration comes from an explicit path, else from `config.toml` in
//! the platform configuration directory, else the defaults.

use std::{fs, path::Path};

use directories::ProjectDirs;
use log::{debug, info};

use typescope::config::AppConfig;

use crate::error::CliError;

/// Find and load the configuration
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path to config file
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CliError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let Some(proj_dirs) = ProjectDirs::from("dev", "typescope", "typescope") else {
        debug!("Could not determine platform-specific config directory");
        return Ok(AppConfig::default());
    };

    let system_config = proj_dirs.config_dir().join("config.toml");
    if system_config.exists() {
        info!(path = system_config.display().to_string(); "Loading configuration from system path");
        return load_config_file(&system_config);
    }

    debug!(
        path = system_config.display().to_string();
        "No configuration file found, using default configuration"
    );
    Ok(AppConfig::default())
}

fn load_config_file(path: &Path) -> Result<AppConfig, CliError> {
    if !path.exists() {
        return Err(CliError::MissingConfig(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|err| CliError::ConfigParse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[animation]\nenabled = false\ntransition_duration_ms = 250\n\n[layout]\nnode_separation = 120.0\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert!(!config.animation().enabled());
        assert_eq!(
            config.animation().transition_duration(),
            Duration::from_millis(250)
        );
        assert_eq!(config.layout().node_separation(), 120.0);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, CliError::MissingConfig(missing) if missing == path));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[layout]\nspacing = 3\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(CliError::ConfigParse(_))
        ));
    }
}
