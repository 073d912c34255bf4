//! Configuration loading and data root resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the data root
pub const DATA_DIR_ENV: &str = "RESONOTE_DATA_DIR";

/// Compiled fallback data root, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "data";

/// Optional TOML configuration file contents
///
/// ```toml
/// root_folder = "/srv/resonote/data"
/// public_dir = "/srv/resonote/public"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub public_dir: Option<PathBuf>,
}

impl TomlConfig {
    /// Parse a config file; a missing file is an error the caller may ignore
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Platform config file location (`~/.config/resonote/config.toml` on Linux)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("resonote").join("config.toml"))
}

/// Data root resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. Compiled default (fallback)
#[derive(Debug, Clone)]
pub struct DataRootResolver {
    cli_arg: Option<PathBuf>,
    env_var_name: String,
    config_file: Option<PathBuf>,
}

impl DataRootResolver {
    pub fn new() -> Self {
        Self {
            cli_arg: None,
            env_var_name: DATA_DIR_ENV.to_string(),
            config_file: default_config_file(),
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Resolve the data root; never fails, falls back to [`DEFAULT_DATA_DIR`]
    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(config) = self.load_config() {
            if let Some(root_folder) = config.root_folder {
                return root_folder;
            }
        }

        // Priority 4: Compiled default
        PathBuf::from(DEFAULT_DATA_DIR)
    }

    /// Load the TOML config if present; parse errors are logged and ignored
    pub fn load_config(&self) -> Option<TomlConfig> {
        let path = self.config_file.as_ref()?;
        if !path.exists() {
            return None;
        }
        match TomlConfig::load(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable config file");
                None
            }
        }
    }
}

impl Default for DataRootResolver {
    fn default() -> Self {
        Self::new()
    }
}
