//! TOML-based configuration for the master application.
//!
//! The default location is the platform config directory:
//! - Windows:  `%APPDATA%\AugmentedSandbox\config.toml`
//! - Linux:    `~/.config/augmented-sandbox/config.toml`
//! - macOS:    `~/Library/Application Support/AugmentedSandbox/config.toml`
//!
//! `--config <path>` on the command line replaces the default location.
//!
//! ```toml
//! [master]
//! log_level = "info"
//!
//! [network]
//! control_port = 24900
//! frame_port = 24901
//! bind_address = "0.0.0.0"
//!
//! [simulation]
//! screen_resolution_x = 1920
//! screen_resolution_y = 1080
//! height_shift = 0.0
//! height_scale = 1.0
//! map_offset_x = 0.0
//! map_offset_y = 0.0
//! map_zoom = 1.0
//! poll_interval_ms = 1000
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section and
//! a missing key all fall back to the values above.  The configuration is read
//! once at start-up and fixed for the lifetime of the process.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sandbox_core::CalibrationState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading and validation.
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

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub master: MasterConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasterConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Control-plane listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// TCP port for newline-delimited JSON requests.
    #[serde(default = "default_control_port")]
    pub control_port: u16,
    /// TCP port frame subscribers connect to.
    #[serde(default = "default_frame_port")]
    pub frame_port: u16,
    /// IP address both listeners bind to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Start-up parameters of the simulation loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_resolution_x")]
    pub screen_resolution_x: u32,
    #[serde(default = "default_resolution_y")]
    pub screen_resolution_y: u32,
    #[serde(default)]
    pub height_shift: f64,
    #[serde(default = "default_one")]
    pub height_scale: f64,
    /// Initial drag offset, applied after a drag reset.
    #[serde(default)]
    pub map_offset_x: f64,
    #[serde(default)]
    pub map_offset_y: f64,
    #[serde(default = "default_one")]
    pub map_zoom: f64,
    /// Idle sleep of the simulation loop.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_control_port() -> u16 {
    24900
}
fn default_frame_port() -> u16 {
    24901
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_resolution_x() -> u32 {
    1920
}
fn default_resolution_y() -> u32 {
    1080
}
fn default_one() -> f64 {
    1.0
}
fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            control_port: default_control_port(),
            frame_port: default_frame_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            screen_resolution_x: default_resolution_x(),
            screen_resolution_y: default_resolution_y(),
            height_shift: 0.0,
            height_scale: default_one(),
            map_offset_x: 0.0,
            map_offset_y: 0.0,
            map_zoom: default_one(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

impl AppConfig {
    /// Checks ranges that the TOML types cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.screen_resolution_x == 0 {
            return Err(invalid("simulation.screen_resolution_x", "must be positive"));
        }
        if sim.screen_resolution_y == 0 {
            return Err(invalid("simulation.screen_resolution_y", "must be positive"));
        }
        let floats = [
            ("simulation.height_shift", sim.height_shift),
            ("simulation.height_scale", sim.height_scale),
            ("simulation.map_offset_x", sim.map_offset_x),
            ("simulation.map_offset_y", sim.map_offset_y),
            ("simulation.map_zoom", sim.map_zoom),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(invalid(field, format!("{value} is not finite")));
            }
        }
        self.network.bind_ip()?;
        Ok(())
    }

    /// The calibration pushed into the engine at start-up.
    pub fn calibration_state(&self) -> CalibrationState {
        let sim = &self.simulation;
        CalibrationState {
            height_shift: sim.height_shift,
            height_scale: sim.height_scale,
            drag_offset_x: sim.map_offset_x,
            drag_offset_y: sim.map_offset_y,
            zoom: sim.map_zoom,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.poll_interval_ms)
    }

    pub fn resolution(&self) -> (u32, u32) {
        (
            self.simulation.screen_resolution_x,
            self.simulation.screen_resolution_y,
        )
    }
}

impl NetworkConfig {
    fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_address.parse().map_err(|_| {
            invalid(
                "network.bind_address",
                format!("{:?} is not an IP address", self.bind_address),
            )
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `bind_address` is not an IP address.
    pub fn control_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.bind_ip()?, self.control_port))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `bind_address` is not an IP address.
    pub fn frame_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.bind_ip()?, self.frame_port))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration from `path`, or from the default location when
/// `path` is `None`.
///
/// # Errors
///
/// See [`load_config_from`].  With no explicit path, an undeterminable
/// platform directory is treated like a missing file.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config_from(path),
        None => match config_file_path() {
            Ok(path) => load_config_from(&path),
            Err(ConfigError::NoPlatformConfigDir) => Ok(AppConfig::default()),
            Err(e) => Err(e),
        },
    }
}

/// Loads and validates `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed and
/// [`ConfigError::Invalid`] if a value is out of range.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("AugmentedSandbox"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("augmented-sandbox"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("AugmentedSandbox")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
