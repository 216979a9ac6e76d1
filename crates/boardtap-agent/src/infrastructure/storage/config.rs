//! TOML-based configuration persistence for the agent.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\boardtap\config.toml`
//! - Linux:    `~/.config/boardtap/config.toml`
//! - macOS:    `~/Library/Application Support/boardtap/config.toml`
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return
//! value of `some_fn()` when the field is absent from the TOML file, so the
//! agent works on first run (before a config file exists) and when upgrading
//! from an older file that is missing newer fields.
//!
//! The board section is the calibration table: the four pixel constants are
//! tied to one physical device and one target app layout, measured once by
//! hand. Change devices and these numbers must be re-measured.

use std::path::{Path, PathBuf};

use boardtap_core::BoardRect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

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

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level agent configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Remote inbox settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelegramConfig {
    /// API base endpoint.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bot credential. Usually supplied via `--token`/`BOARDTAP_BOT_TOKEN`
    /// instead of being written to disk.
    #[serde(default)]
    pub bot_token: String,
    /// Maximum updates requested per fetch.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u8,
    /// Long-poll hold time requested from the server, in seconds.
    #[serde(default = "default_long_poll_timeout")]
    pub long_poll_timeout_secs: u64,
    /// Delay between polls after a successful response, in milliseconds.
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
    /// Delay before retrying after a failed response, in milliseconds.
    #[serde(default = "default_failure_delay_ms")]
    pub failure_delay_ms: u64,
}

/// The calibrated board rectangle, in screen pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardConfig {
    #[serde(default = "default_board_left")]
    pub left: i32,
    #[serde(default = "default_board_top")]
    pub top: i32,
    #[serde(default = "default_board_right")]
    pub right: i32,
    #[serde(default = "default_board_bottom")]
    pub bottom: i32,
    /// Start with the board treated as rotated 180°.
    #[serde(default)]
    pub start_mirrored: bool,
}

impl BoardConfig {
    /// The calibration rectangle as a domain value.
    pub fn rect(&self) -> BoardRect {
        BoardRect {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
        }
    }
}

/// Tap timing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// Pause between the two taps of one move, in milliseconds.
    #[serde(default = "default_tap_interval_ms")]
    pub tap_interval_ms: u64,
    /// Delay between consecutive moves of a sequence, in milliseconds.
    #[serde(default = "default_move_delay_ms")]
    pub move_delay_ms: u64,
}

/// General agent behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Path to the `adb` binary.
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// Device serial for multi-device hosts. Absent means "the only device".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_serial: Option<String>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}
fn default_batch_limit() -> u8 {
    10
}
fn default_long_poll_timeout() -> u64 {
    30
}
fn default_idle_delay_ms() -> u64 {
    1000
}
fn default_failure_delay_ms() -> u64 {
    5000
}
fn default_board_left() -> i32 {
    25
}
fn default_board_top() -> i32 {
    660
}
fn default_board_right() -> i32 {
    1055
}
fn default_board_bottom() -> i32 {
    1690
}
fn default_tap_interval_ms() -> u64 {
    150
}
fn default_move_delay_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_adb_path() -> String {
    "adb".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            bot_token: String::new(),
            batch_limit: default_batch_limit(),
            long_poll_timeout_secs: default_long_poll_timeout(),
            idle_delay_ms: default_idle_delay_ms(),
            failure_delay_ms: default_failure_delay_ms(),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            left: default_board_left(),
            top: default_board_top(),
            right: default_board_right(),
            bottom: default_board_bottom(),
            start_mirrored: false,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tap_interval_ms: default_tap_interval_ms(),
            move_delay_ms: default_move_delay_ms(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            adb_path: default_adb_path(),
            device_serial: None,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config
/// base directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
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
    })?;
    Ok(())
}

/// Resolves the platform config base directory plus the `boardtap` segment.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("boardtap"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("boardtap"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("boardtap")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
