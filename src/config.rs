//! Agent configuration management.
//!
//! Handles the fontwarden configuration file at:
//! - Linux: ~/.config/fontwarden/config.toml
//! - macOS: ~/Library/Application Support/fontwarden/config.toml
//! - Windows: %APPDATA%\fontwarden\config.toml
//!
//! A missing file means defaults. Command-line flags override file values.

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FontError;
use crate::fonts::registrar::RegistrarKind;
use crate::fs_utils;
use crate::service::{ServiceSettings, DEFAULT_PORT};
use crate::socket_server::{DeletePolicy, DEFAULT_ENDPOINT_PATH};

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Every key accepted by [`AgentConfig::get`] and [`AgentConfig::set`]
pub const CONFIG_KEYS: &[&str] = &[
    "fonts.dir",
    "server.host",
    "server.port",
    "server.path",
    "shutdown.drain_timeout_ms",
    "shutdown.tick_ms",
    "delete.grace_ms",
    "delete.attempts",
    "delete.backoff_ms",
    "delete.max_wait_ms",
    "logging.level",
    "logging.json",
    "registrar.kind",
    "status.file",
];

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// Managed font directory
    #[serde(default)]
    pub fonts: FontsConfig,

    /// WebSocket endpoint
    #[serde(default)]
    pub server: ServerConfig,

    /// Shutdown behaviour
    #[serde(default)]
    pub shutdown: ShutdownConfig,

    /// Font file deletion retry policy
    #[serde(default)]
    pub delete: DeleteConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Platform font registrar
    #[serde(default)]
    pub registrar: RegistrarConfig,

    /// Status snapshot file
    #[serde(default)]
    pub status: StatusConfig,
}

/// Font directory configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FontsConfig {
    /// Managed directory; the per-user default when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path accepted for WebSocket upgrades
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_path() -> String {
    DEFAULT_ENDPOINT_PATH.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
        }
    }
}

/// Shutdown configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Bounded wait for open connections on stop
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Control loop liveness tick
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_drain_timeout_ms() -> u64 {
    5000
}

fn default_tick_ms() -> u64 {
    500
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_ms: default_drain_timeout_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

/// Deletion retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConfig {
    /// Wait after unregistering before the first delete attempt
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// First backoff between attempts; doubles each retry
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Overall bound on retrying
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

fn default_grace_ms() -> u64 {
    500
}

fn default_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    100
}

fn default_max_wait_ms() -> u64 {
    3000
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace_ms(),
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

impl DeleteConfig {
    pub fn policy(&self) -> DeletePolicy {
        DeletePolicy {
            grace: Duration::from_millis(self.grace_ms),
            attempts: self.attempts,
            initial_backoff: Duration::from_millis(self.backoff_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Registrar configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistrarConfig {
    #[serde(default)]
    pub kind: RegistrarKind,
}

/// Status file configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatusConfig {
    /// Where to mirror the lifecycle status; disabled when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl AgentConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, FontError> {
        Self::load_from(&fs_utils::config_file_path())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, FontError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| FontError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| FontError::ConfigError {
            message: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<(), FontError> {
        self.save_to(&fs_utils::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), FontError> {
        let content = toml::to_string_pretty(self).map_err(|e| FontError::ConfigError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs_utils::atomic_write(path, content.as_bytes()).map_err(|e| FontError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn is_known_key(key: &str) -> bool {
        CONFIG_KEYS.contains(&key)
    }

    /// Get a configuration value by key path (e.g., "server.port")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["fonts", "dir"] => self.fonts.dir.as_ref().map(|p| p.display().to_string()),
            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),
            ["server", "path"] => Some(self.server.path.clone()),
            ["shutdown", "drain_timeout_ms"] => Some(self.shutdown.drain_timeout_ms.to_string()),
            ["shutdown", "tick_ms"] => Some(self.shutdown.tick_ms.to_string()),
            ["delete", "grace_ms"] => Some(self.delete.grace_ms.to_string()),
            ["delete", "attempts"] => Some(self.delete.attempts.to_string()),
            ["delete", "backoff_ms"] => Some(self.delete.backoff_ms.to_string()),
            ["delete", "max_wait_ms"] => Some(self.delete.max_wait_ms.to_string()),
            ["logging", "level"] => Some(self.logging.level.clone()),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            ["registrar", "kind"] => Some(self.registrar.kind.as_str().to_string()),
            ["status", "file"] => self.status.file.as_ref().map(|p| p.display().to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key path
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), FontError> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["fonts", "dir"] => self.fonts.dir = optional_path(value),
            ["server", "host"] => {
                parse_host(value)?;
                self.server.host = value.to_string();
            }
            ["server", "port"] => self.server.port = parse_value(key, value)?,
            ["server", "path"] => {
                check_endpoint_path(value)?;
                self.server.path = value.to_string();
            }
            ["shutdown", "drain_timeout_ms"] => {
                self.shutdown.drain_timeout_ms = parse_value(key, value)?
            }
            ["shutdown", "tick_ms"] => {
                let tick: u64 = parse_value(key, value)?;
                if tick == 0 {
                    return Err(FontError::ConfigError {
                        message: "shutdown.tick_ms must be greater than 0".to_string(),
                    });
                }
                self.shutdown.tick_ms = tick;
            }
            ["delete", "grace_ms"] => self.delete.grace_ms = parse_value(key, value)?,
            ["delete", "attempts"] => self.delete.attempts = parse_value(key, value)?,
            ["delete", "backoff_ms"] => self.delete.backoff_ms = parse_value(key, value)?,
            ["delete", "max_wait_ms"] => self.delete.max_wait_ms = parse_value(key, value)?,
            ["logging", "level"] => {
                if !LOG_LEVELS.contains(&value) {
                    return Err(FontError::ConfigError {
                        message: format!(
                            "Invalid log level: {}. Must be one of: {}",
                            value,
                            LOG_LEVELS.join(", ")
                        ),
                    });
                }
                self.logging.level = value.to_string();
            }
            ["logging", "json"] => self.logging.json = parse_value(key, value)?,
            ["registrar", "kind"] => {
                self.registrar.kind =
                    RegistrarKind::parse(value).ok_or_else(|| FontError::ConfigError {
                        message: format!(
                            "Invalid registrar: {}. Must be one of: fontconfig, none",
                            value
                        ),
                    })?;
            }
            ["status", "file"] => self.status.file = optional_path(value),
            _ => {
                return Err(FontError::ConfigError {
                    message: format!("Unknown configuration key: {}", key),
                });
            }
        }
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Human-readable summary
    pub fn display(&self) -> String {
        let mut output = String::new();
        output.push_str("fontwarden configuration\n");
        output.push_str("════════════════════════\n\n");

        output.push_str("[fonts]\n");
        output.push_str(&format!(
            "  dir = {}\n\n",
            self.fonts
                .dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| format!("(default: {})", fs_utils::default_font_dir().display()))
        ));

        output.push_str("[server]\n");
        output.push_str(&format!("  host = {}\n", self.server.host));
        output.push_str(&format!("  port = {}\n", self.server.port));
        output.push_str(&format!("  path = {}\n\n", self.server.path));

        output.push_str("[shutdown]\n");
        output.push_str(&format!(
            "  drain_timeout_ms = {}\n",
            self.shutdown.drain_timeout_ms
        ));
        output.push_str(&format!("  tick_ms = {}\n\n", self.shutdown.tick_ms));

        output.push_str("[delete]\n");
        output.push_str(&format!("  grace_ms = {}\n", self.delete.grace_ms));
        output.push_str(&format!("  attempts = {}\n", self.delete.attempts));
        output.push_str(&format!("  backoff_ms = {}\n", self.delete.backoff_ms));
        output.push_str(&format!("  max_wait_ms = {}\n\n", self.delete.max_wait_ms));

        output.push_str("[logging]\n");
        output.push_str(&format!("  level = {}\n", self.logging.level));
        output.push_str(&format!("  json = {}\n\n", self.logging.json));

        output.push_str("[registrar]\n");
        output.push_str(&format!("  kind = {}\n\n", self.registrar.kind.as_str()));

        output.push_str("[status]\n");
        output.push_str(&format!(
            "  file = {}\n",
            self.status
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(disabled)".to_string())
        ));

        output
    }

    /// Managed font directory after applying defaults
    pub fn font_dir(&self) -> PathBuf {
        self.fonts
            .dir
            .clone()
            .unwrap_or_else(fs_utils::default_font_dir)
    }

    /// Build the control loop settings
    pub fn service_settings(&self) -> Result<ServiceSettings, FontError> {
        let ip = parse_host(&self.server.host)?;
        check_endpoint_path(&self.server.path)?;
        Ok(ServiceSettings {
            font_dir: self.font_dir(),
            listen_addr: SocketAddr::new(ip, self.server.port),
            endpoint_path: self.server.path.clone(),
            drain_timeout: Duration::from_millis(self.shutdown.drain_timeout_ms),
            tick_interval: Duration::from_millis(self.shutdown.tick_ms.max(1)),
            delete_policy: self.delete.policy(),
        })
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, FontError> {
    value.parse().map_err(|_| FontError::ConfigError {
        message: format!("Invalid value for {}: {}", key, value),
    })
}

fn parse_host(value: &str) -> Result<IpAddr, FontError> {
    value.parse().map_err(|_| FontError::InvalidAddress {
        value: value.to_string(),
    })
}

fn check_endpoint_path(value: &str) -> Result<(), FontError> {
    if value.starts_with('/') {
        Ok(())
    } else {
        Err(FontError::ConfigError {
            message: format!("Endpoint path must start with '/': {}", value),
        })
    }
}
