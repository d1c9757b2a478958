//! TOML configuration for the daemon.
//!
//! Read from `$XDG_CONFIG_HOME/edgewarp/config.toml`, falling back to
//! `~/.config/edgewarp/config.toml`.  Example:
//!
//! ```toml
//! [daemon]
//! log_level = "debug"
//!
//! [edge]
//! edge_threshold_px = 2
//! motion_threshold = 0.1
//! ```
//!
//! Every field has a default (`#[serde(default = "...")]`), so a missing file,
//! a missing section and a missing key all behave the same way.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use warp_core::domain::transition::{EDGE_THRESHOLD, MIN_MOTION};
use warp_core::EdgeThresholds;

/// Largest accepted `edge.edge_threshold_px`.
pub const MAX_EDGE_THRESHOLD_PX: i32 = 4096;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub edge: EdgeConfig,
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Edge trigger tuning.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EdgeConfig {
    /// Distance in pixels from an edge that counts as touching it.
    #[serde(default = "default_edge_threshold_px")]
    pub edge_threshold_px: i32,
    /// Raw delta a motion component must exceed to count as a push.
    #[serde(default = "default_motion_threshold")]
    pub motion_threshold: f64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_edge_threshold_px() -> i32 {
    EDGE_THRESHOLD
}
fn default_motion_threshold() -> f64 {
    MIN_MOTION
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            edge_threshold_px: default_edge_threshold_px(),
            motion_threshold: default_motion_threshold(),
        }
    }
}

impl AppConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks that the thresholds are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let edge_px = self.edge.edge_threshold_px;
        if !(0..=MAX_EDGE_THRESHOLD_PX).contains(&edge_px) {
            return Err(ConfigError::Invalid(format!(
                "edge.edge_threshold_px must be in 0..={MAX_EDGE_THRESHOLD_PX}, got {edge_px}"
            )));
        }
        let motion = self.edge.motion_threshold;
        if !motion.is_finite() || motion < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "edge.motion_threshold must be a finite value >= 0, got {motion}"
            )));
        }
        Ok(())
    }

    /// Converts the `[edge]` section into engine thresholds.
    pub fn to_thresholds(&self) -> EdgeThresholds {
        EdgeThresholds {
            edge_px: self.edge.edge_threshold_px,
            min_motion: self.edge.motion_threshold,
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Determines the directory holding the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(base.join("edgewarp"))
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from its default location.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config at `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed and
/// [`ConfigError::Invalid`] if a value is out of range.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => AppConfig::from_toml(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
