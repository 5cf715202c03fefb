//! Command modules for the fontwarden CLI
//!
//! - `run` - run the agent in the foreground
//! - `scan` - list the fonts in a directory
//! - `config` - show and edit the configuration file
//!
//! All command handlers take their respective `Args` struct from `cli.rs`
//! and a shared `CommandContext`.

pub mod config;
pub mod run;
pub mod scan;

pub use config::run_config;
pub use run::run_agent;
pub use scan::run_scan;

use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::fs_utils;

/// Shared context passed to all command handlers
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Output format (text or json)
    pub format: OutputFormat,
    /// Explicit configuration file, if any
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn new(format: OutputFormat, config_path: Option<PathBuf>) -> Self {
        Self {
            format,
            config_path,
        }
    }

    /// Configuration file in effect
    pub fn config_file(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(fs_utils::config_file_path)
    }

    pub fn load_config(&self) -> Result<AgentConfig> {
        AgentConfig::load_from(&self.config_file())
    }
}
