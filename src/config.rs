//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/replytree/replytree.toml`
//! 3. Local config: `<dir>/.replytree.toml` (the working directory for the CLI)
//! 4. Environment variables: `REPLYTREE_*` prefix

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Thread file encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Json,
    Toml,
}

impl InputFormat {
    /// Format implied by a file extension, if recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim()).ok_or_else(|| format!("unknown input format: {}", s))
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Json => write!(f, "json"),
            InputFormat::Toml => write!(f, "toml"),
        }
    }
}

/// Unified configuration for replytree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Parent id meaning "no parent" (Moodle stores 0 for discussion starters)
    pub root_parent_id: u64,
    /// Spaces per depth level in flat listings
    pub indent: usize,
    /// Format assumed for thread files without extension
    pub default_format: InputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_parent_id: 0,
            indent: 2,
            default_format: InputFormat::Json,
        }
    }
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub root_parent_id: Option<u64>,
    pub indent: Option<usize>,
    pub default_format: Option<InputFormat>,
}

/// Get the XDG config directory for replytree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "replytree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("replytree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".replytree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

fn parse_env_value<T: FromStr>(key: &str, value: &str) -> Result<T, ApplicationError>
where
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ApplicationError::Config {
        message: format!("REPLYTREE_{}: {}", key.to_ascii_uppercase(), e),
    })
}

impl Settings {
    /// Overlay wins for every field it specifies.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            root_parent_id: overlay.root_parent_id.unwrap_or(self.root_parent_id),
            indent: overlay.indent.unwrap_or(self.indent),
            default_format: overlay.default_format.unwrap_or(self.default_format),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.replytree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply REPLYTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("REPLYTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("root_parent_id") {
            settings.root_parent_id = parse_env_value("root_parent_id", &val)?;
        }
        if let Ok(val) = config.get_string("indent") {
            settings.indent = parse_env_value("indent", &val)?;
        }
        if let Ok(val) = config.get_string("default_format") {
            settings.default_format = parse_env_value("default_format", &val)?;
        }

        Ok(settings)
    }

    /// Render as TOML, e.g. for `config show`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
