//! User configuration from ~/.config/rsmanifest/config.toml

use crate::manifest::USER_FILE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// User configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Manifest preferences.
    pub manifest: ManifestConfig,
}

/// Manifest preferences.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Manifest to read and write instead of `~/rsmanifest.json`.
    pub user_file: Option<PathBuf>,
    /// Virtualenv used when `add-code` is not given one.
    pub default_virtual_env: Option<String>,
}

/// Errors resolving configured paths.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot expand '{0}': home directory is unknown")]
    NoHomeDir(String),
}

impl UserConfig {
    /// Load user config from default path (~/.config/rsmanifest/config.toml).
    pub fn load() -> Self {
        Self::from_path(Self::default_path()).unwrap_or_default()
    }

    /// Load user config from a specific path.
    pub fn from_path(path: Option<PathBuf>) -> Option<Self> {
        let path = path?;
        let contents = std::fs::read_to_string(&path).ok()?;
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                None
            }
        }
    }

    /// Get the default config path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rsmanifest").join("config.toml"))
    }

    /// Resolve the user manifest path.
    ///
    /// An explicit path wins over the configured one, which wins over
    /// `~/rsmanifest.json`. A leading `~` is expanded in all three.
    pub fn user_manifest_path(&self, explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let path = explicit
            .or(self.manifest.user_file.as_deref())
            .unwrap_or(Path::new(USER_FILE));
        expand_user_path(path)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_user_path(path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
    let path = path.as_ref();
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home =
        dirs::home_dir().ok_or_else(|| ConfigError::NoHomeDir(path.display().to_string()))?;
    if rest.as_os_str().is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}
