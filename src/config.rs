//! Configuration file handling for batoms-build.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The configuration file name.
pub const CONFIG_FILE_NAME: &str = "batoms-build.toml";

/// Default optional-dependency group pinned for the extension.
pub const DEFAULT_DEPENDENCY_GROUP: &str = "blender-extension";

/// Default extension (and source package) name.
pub const DEFAULT_EXTENSION_NAME: &str = "batoms";

/// Configuration from batoms-build.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Path to the Blender executable
    pub blender_path: Option<PathBuf>,

    /// Package index URL passed to `pip wheel`
    pub index_url: Option<String>,

    /// Extension source directory, relative to the repository root
    pub source_dir: Option<PathBuf>,

    /// Optional-dependency group in pyproject.toml to pin
    pub dependency_group: Option<String>,

    /// Extension name (module suffix and archive prefix)
    pub extension_name: Option<String>,
}

impl Config {
    /// Load configuration from batoms-build.toml in the given directory or its parents.
    ///
    /// Returns `Ok(None)` if no configuration file is found.
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir
            .canonicalize()
            .unwrap_or_else(|_| start_dir.to_path_buf());

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "loading config");
                let content = std::fs::read_to_string(&config_path)?;
                let config: Self = toml::from_str(&content)?;
                return Ok(Some(config));
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load configuration from the current directory.
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn dependency_group(&self) -> &str {
        self.dependency_group
            .as_deref()
            .unwrap_or(DEFAULT_DEPENDENCY_GROUP)
    }

    pub fn extension_name(&self) -> &str {
        self.extension_name
            .as_deref()
            .unwrap_or(DEFAULT_EXTENSION_NAME)
    }
}
