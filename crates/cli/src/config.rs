//! CLI configuration utilities

use anyhow::{Context, Result};
use nomdoc_core::SessionConfig;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// State directory: `--data-dir`, then `NOMDOC_STATE_DIR`, then the system data dir
pub fn state_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        if let Ok(dir) = std::env::var("NOMDOC_STATE_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("nomdoc")
        }
    })
}

/// Load the session configuration
///
/// An explicit path must exist. Without one, `config.toml` in the state
/// directory is used when present, otherwise defaults plus `NOMDOC_*`
/// environment variables.
pub fn load_config(path: Option<&Path>, state_dir: &Path) -> Result<SessionConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = state_dir.join(CONFIG_FILE_NAME);
            if !default_path.exists() {
                return Ok(SessionConfig::from_env()?);
            }
            default_path
        }
    };
    SessionConfig::from_file(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Write a default configuration file, refusing to overwrite
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(&SessionConfig::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        write_default_config(&path).unwrap();
        let loaded = load_config(Some(&path), dir.path()).unwrap();
        assert_eq!(loaded.protected_path, "/graph");
        assert_eq!(loaded.cookie.max_age_secs, 2_592_000);

        assert!(write_default_config(&path).is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(load_config(Some(&missing), dir.path()).is_err());
    }
}
