//! Tool configuration
//!
//! Loaded from an explicit path, else from `broadcast.toml` in the project
//! root, else built from defaults. Every field has a default, so a partial
//! file only overrides what it names.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use broadcast_core::{EmitFormat, DEFAULT_MARKER_INTERFACE};

use crate::error::ConfigError;

/// File name looked up in the project root
pub const CONFIG_FILE_NAME: &str = "broadcast.toml";

/// Extra-key path flagging a package as shipping listeners
pub const DEFAULT_LISTENER_FLAG: &str = "wyrihaximus.broadcast.has-listeners";

/// Package that owns the provider template and the generated artifact
pub const DEFAULT_PACKAGE_NAME: &str = "wyrihaximus/broadcast";

/// Complete tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BroadcastConfig {
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
    pub bootstrap: BootstrapConfig,
}

/// Which classes are listeners and how many are reflected at once
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Fully-qualified marker interface
    pub marker_interface: String,
    /// Dot path into a package's `extra` section
    pub listener_flag: String,
    /// Maximum reflections in flight
    pub concurrency: usize,
}

/// Where the artifact comes from and goes to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub package_name: String,
    /// Template path, relative to the install path
    pub template: PathBuf,
    /// Artifact path, relative to the install path
    pub target: PathBuf,
    /// Unix permissions applied to the artifact
    pub file_mode: u32,
    pub format: EmitFormat,
}

/// Self-healing of missing autoload directories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapConfig {
    pub max_retries: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            marker_interface: DEFAULT_MARKER_INTERFACE.to_string(),
            listener_flag: DEFAULT_LISTENER_FLAG.to_string(),
            concurrency: num_cpus::get().max(1),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            template: PathBuf::from("etc/AbstractListenerProvider.php"),
            target: PathBuf::from("src/Generated/AbstractListenerProvider.php"),
            file_mode: 0o664,
            format: EmitFormat::Php,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { max_retries: 8 }
    }
}

impl BroadcastConfig {
    /// Load configuration for a project
    ///
    /// An explicit `path` must exist. Without one, `broadcast.toml` in
    /// `project_root` is used when present.
    pub fn load(path: Option<&Path>, project_root: &Path) -> Result<Self, ConfigError> {
        let candidate = match path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default = project_root.join(CONFIG_FILE_NAME);
                default.is_file().then_some(default)
            }
        };

        let config = match candidate {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No configuration file, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.concurrency".to_string(),
                value: "must be at least 1".to_string(),
            });
        }
        if self.discovery.marker_interface.trim_matches('\\').is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "discovery.marker_interface".to_string(),
                value: "must name an interface".to_string(),
            });
        }
        if self.discovery.listener_flag.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "discovery.listener_flag".to_string(),
                value: "must not be empty".to_string(),
            });
        }
        if self.output.file_mode > 0o7777 {
            return Err(ConfigError::InvalidValue {
                field: "output.file_mode".to_string(),
                value: format!("{:o} is not a permission mode", self.output.file_mode),
            });
        }
        Ok(())
    }
}
