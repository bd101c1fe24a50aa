//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/sensorseq/sensorseq.toml`
//! 3. Local config: a file passed by the caller (e.g. a project's `.sensorseq.toml`)
//! 4. Environment variables: `SENSORSEQ_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{ColorMode, Domain, FormatOptions};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("config error: {message}")]
    Config { message: String },

    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Defaults applied to domains created through `Settings::domain`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DomainDefaults {
    /// Whether new domains accept writes without opting in
    pub mutable: bool,
}

impl Default for DomainDefaults {
    fn default() -> Self {
        Self { mutable: false }
    }
}

/// Defaults for rendered sequences.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatDefaults {
    /// Wrap output as `5'-...-3'`
    pub labels: bool,
    /// Left-pad windows so they line up with the full sequence
    pub pad: bool,
}

/// Raw settings for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub color: Option<ColorMode>,
    pub domains: RawDomainDefaults,
    pub format: RawFormatDefaults,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDomainDefaults {
    pub mutable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFormatDefaults {
    pub labels: Option<bool>,
    pub pad: Option<bool>,
}

/// Unified configuration for sensorseq.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// When to color formatted sequences (default: auto)
    pub color: ColorMode,
    pub domains: DomainDefaults,
    pub format: FormatDefaults,
}

/// Get the XDG config directory for sensorseq.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sensorseq").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sensorseq.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| SettingsError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            color: overlay.color.unwrap_or(self.color),
            domains: DomainDefaults {
                mutable: overlay.domains.mutable.unwrap_or(self.domains.mutable),
            },
            format: FormatDefaults {
                labels: overlay.format.labels.unwrap_or(self.format.labels),
                pad: overlay.format.pad.unwrap_or(self.format.pad),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_config` - Optional project-level config file
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/sensorseq/sensorseq.toml`
    /// 3. Local config file, if given and present
    /// 4. Environment variables: `SENSORSEQ_*` prefix, `__` between sections
    #[instrument(level = "debug")]
    pub fn load(local_config: Option<&Path>) -> Result<Self, SettingsError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(local_path) = local_config {
            if local_path.exists() {
                debug!(path = %local_path.display(), "loading local config");
                current = current.merge_with(&load_raw_settings(local_path)?);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply SENSORSEQ_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("SENSORSEQ")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("color") {
            settings.color = parse_color_mode(&val)?;
        }
        if let Ok(val) = config.get_bool("domains.mutable") {
            settings.domains.mutable = val;
        }
        if let Ok(val) = config.get_bool("format.labels") {
            settings.format.labels = val;
        }
        if let Ok(val) = config.get_bool("format.pad") {
            settings.format.pad = val;
        }

        Ok(settings)
    }

    /// Install the color choice process-wide.
    ///
    /// `Auto` leaves `colored` to its own tty and env var detection.
    pub fn apply(&self) {
        match self.color {
            ColorMode::Auto => colored::control::unset_override(),
            ColorMode::Always => colored::control::set_override(true),
            ColorMode::Never => colored::control::set_override(false),
        }
    }

    /// Formatting options seeded from these settings.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions::default()
            .with_color(self.color)
            .with_labels(self.format.labels)
            .with_pad(self.format.pad)
    }

    /// New domain using the configured mutability default.
    pub fn domain(&self, name: impl Into<String>, sequence: impl Into<String>) -> Domain {
        Domain::new(name, sequence).with_mutable(self.domains.mutable)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# sensorseq configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/sensorseq/sensorseq.toml
#   Local:  a project file passed to Settings::load
#   Env:    SENSORSEQ_* environment variables (e.g. SENSORSEQ_FORMAT__LABELS=true)

# When to color formatted sequences: "auto", "always", "never"
# color = "auto"

[domains]
# New domains reject writes until made mutable
# mutable = false

[format]
# Wrap sequences as 5'-...-3'
# labels = false

# Left-pad windows so they line up with the full sequence
# pad = false
"#
        .to_string()
    }
}

fn parse_color_mode(value: &str) -> Result<ColorMode, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "auto" => Ok(ColorMode::Auto),
        "always" => Ok(ColorMode::Always),
        "never" => Ok(ColorMode::Never),
        other => Err(SettingsError::Config {
            message: format!("unknown color mode: {other}"),
        }),
    }
}

fn config_err(e: ConfigError) -> SettingsError {
    SettingsError::Config {
        message: e.to_string(),
    }
}
