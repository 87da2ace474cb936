//! Global user configuration.
//!
//! envlock reads an optional TOML config file for machine-level defaults
//! that don't belong in per-project environment files: which solver
//! executables to use, extra default channels, and the platform set to lock
//! when neither the CLI nor the environment files request one.
//!
//! Lookup order for the config path:
//! 1. `--config <PATH>` on the command line
//! 2. the `ENVLOCK_CONFIG` environment variable
//! 3. `~/.config/envlock/config.toml` (platform-appropriate config dir)
//!
//! A missing config file is not an error — defaults apply. CLI flags always
//! override config values.
//!
//! # File format
//!
//! ```toml
//! default-platforms = ["linux-64", "osx-arm64"]
//! channels = ["conda-forge"]
//! conda-exe = "/opt/conda/bin/mamba"
//! pip-exe = "pip3"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::CONFIG_ENV;
use crate::core::EnvlockError;

/// Machine-level envlock defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Platforms locked when neither CLI nor environment files name any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_platforms: Vec<String>,

    /// Channels appended after the channels declared by environment files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,

    /// Conda-family solver executable (path or bare name to look up on PATH).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conda_exe: Option<String>,

    /// Pip solver executable (path or bare name to look up on PATH).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pip_exe: Option<String>,
}

impl GlobalConfig {
    /// The default config location: `<config dir>/envlock/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| EnvlockError::ConfigError {
            message: "could not determine the user configuration directory".to_string(),
        })?;
        Ok(base.join("envlock").join("config.toml"))
    }

    /// Load configuration, preferring an explicit path over the environment
    /// variable over the default location.
    ///
    /// A missing file yields the default configuration; a present but
    /// malformed file is an error.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let path = match explicit {
            Some(path) => crate::utils::expand_path(path),
            None => match std::env::var(CONFIG_ENV).ok().filter(|v| !v.is_empty()) {
                Some(path) => crate::utils::expand_path(&path),
                None => Self::default_path()?,
            },
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no global config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| EnvlockError::ConfigError {
            message: format!("cannot read {}: {e}", path.display()),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| EnvlockError::ConfigError {
            message: format!("invalid config file {}: {e}", path.display()),
        })?;

        debug!(path = %path.display(), "loaded global config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = GlobalConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert!(config.default_platforms.is_empty());
        assert!(config.conda_exe.is_none());
    }

    #[test]
    fn parses_all_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
default-platforms = ["linux-64", "osx-arm64"]
channels = ["conda-forge", "bioconda"]
conda-exe = "mamba"
pip-exe = "/usr/bin/pip3"
"#,
        )
        .unwrap();

        let config = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(config.default_platforms, vec!["linux-64", "osx-arm64"]);
        assert_eq!(config.channels, vec!["conda-forge", "bioconda"]);
        assert_eq!(config.conda_exe.as_deref(), Some("mamba"));
        assert_eq!(config.pip_exe.as_deref(), Some("/usr/bin/pip3"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default-platforms = 42").unwrap();

        assert!(GlobalConfig::load_from(&path).is_err());
    }
}
