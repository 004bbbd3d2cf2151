use crate::domain::channel::ReleaseChannel;
use crate::error::{LibrarianError, Result};
use crate::release::bump::BumpMode;
use crate::release::coupling::{CatchUpStrategy, NextMinorPreview, NextPatchPreview};
use crate::release::scanner::TagMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name looked up in the current directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "librarian.toml";

/// Represents the complete configuration for librarian.
///
/// Contains the manifest location, channel branches, release behavior and hooks.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Manifest path relative to the repository root
    #[serde(default = "default_manifest")]
    pub manifest: String,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default)]
    pub channels: ChannelsConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub hooks: HooksConfig,
}

fn default_manifest() -> String {
    "librarian.yaml".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_stable_branch() -> String {
    "main".to_string()
}

fn default_preview_branch() -> String {
    "preview".to_string()
}

/// Branches backing the stable and preview channels, and which one this checkout is.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChannelsConfig {
    #[serde(default = "default_stable_branch")]
    pub stable_branch: String,

    #[serde(default = "default_preview_branch")]
    pub preview_branch: String,

    #[serde(default)]
    pub current: ReleaseChannel,
}

impl ChannelsConfig {
    pub fn branch_for(&self, channel: ReleaseChannel) -> &str {
        match channel {
            ReleaseChannel::Stable => &self.stable_branch,
            ReleaseChannel::Preview => &self.preview_branch,
        }
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        ChannelsConfig {
            stable_branch: default_stable_branch(),
            preview_branch: default_preview_branch(),
            current: ReleaseChannel::default(),
        }
    }
}

/// How a preview track restarts after the stable track reached it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatchUp {
    #[default]
    NextMinor,
    NextPatch,
}

impl CatchUp {
    pub fn strategy(&self) -> Box<dyn CatchUpStrategy> {
        match self {
            CatchUp::NextMinor => Box::new(NextMinorPreview),
            CatchUp::NextPatch => Box::new(NextPatchPreview),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ReleaseConfig {
    #[serde(default)]
    pub tag_mode: TagMode,

    #[serde(default)]
    pub bump_mode: BumpMode,

    #[serde(default)]
    pub catch_up: CatchUp,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct HooksConfig {
    /// Script run once per released library to write the new version into its files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_version: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            manifest: default_manifest(),
            remote: default_remote(),
            channels: ChannelsConfig::default(),
            release: ReleaseConfig::default(),
            hooks: HooksConfig::default(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `librarian.toml` in current directory
/// 3. `librarian.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);

    let config_str = if let Some(path) = config_path {
        read_config(Path::new(path))?
    } else if local.exists() {
        read_config(&local)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            read_config(&config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "loading config");
    fs::read_to_string(path).map_err(|e| {
        LibrarianError::config(format!("Cannot read config {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.manifest, "librarian.yaml");
        assert_eq!(config.remote, "origin");
        assert_eq!(config.channels.stable_branch, "main");
        assert_eq!(config.channels.preview_branch, "preview");
        assert_eq!(config.channels.current, ReleaseChannel::Stable);
        assert_eq!(config.release.tag_mode, TagMode::PerLibrary);
        assert_eq!(config.release.bump_mode, BumpMode::Precise);
        assert_eq!(config.release.catch_up, CatchUp::NextMinor);
        assert!(config.hooks.apply_version.is_none());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
[channels]
current = "preview"

[release]
bump_mode = "mechanical"
"#,
        )
        .unwrap();
        assert_eq!(config.channels.current, ReleaseChannel::Preview);
        assert_eq!(config.channels.stable_branch, "main");
        assert_eq!(config.release.bump_mode, BumpMode::Mechanical);
        assert_eq!(config.release.tag_mode, TagMode::PerLibrary);
    }

    #[test]
    fn test_branch_for_channel() {
        let channels = ChannelsConfig::default();
        assert_eq!(channels.branch_for(ReleaseChannel::Stable), "main");
        assert_eq!(channels.branch_for(ReleaseChannel::Preview), "preview");
    }

    #[test]
    fn test_catch_up_strategy_names() {
        assert_eq!(CatchUp::NextMinor.strategy().name(), "next-minor");
        assert_eq!(CatchUp::NextPatch.strategy().name(), "next-patch");
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[release]\ntag_mode = \"sometimes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_path() {
        let err = load_config(Some("/nonexistent/librarian.toml")).unwrap_err();
        assert!(matches!(err, LibrarianError::Config(_)));
    }
}
