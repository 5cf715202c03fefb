//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Background font installation agent
#[derive(Parser, Debug)]
#[command(name = "fontwarden")]
#[command(about = "Installs, removes and lists user fonts on behalf of local web clients")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to scan and config show)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Configuration file (defaults to the per-user config path)
    #[arg(long, value_name = "FILE", global = true, env = "FONTWARDEN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands for fontwarden
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the agent in the foreground until signalled to stop
    Run(RunArgs),

    /// List the fonts in the managed directory
    #[command(visible_alias = "ls")]
    Scan(ScanArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

// ============================================
// Run Subcommand
// ============================================

/// Arguments for the run command. Each flag overrides the config file.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Managed font directory
    #[arg(long, value_name = "DIR")]
    pub font_dir: Option<PathBuf>,

    /// Mirror lifecycle status to this JSON file
    #[arg(long, value_name = "FILE")]
    pub status_file: Option<PathBuf>,

    /// Platform registrar (fontconfig, none)
    #[arg(long, value_name = "KIND")]
    pub registrar: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

// ============================================
// Scan Subcommand
// ============================================

/// Arguments for the scan command
#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Directory to scan (defaults to the managed font directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

// ============================================
// Config Subcommand
// ============================================

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config operation: show, get, set, reset
    #[command(subcommand)]
    pub operation: ConfigOperation,
}

/// Config subcommand operations
#[derive(Subcommand, Debug)]
pub enum ConfigOperation {
    /// Show current configuration
    Show,

    /// Print a single configuration value
    Get {
        /// Configuration key (e.g., server.port, fonts.dir)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., server.port, logging.level)
        key: String,
        /// Value to set; an empty string clears optional paths
        value: String,
    },

    /// Reset configuration to defaults
    Reset,
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    #[value(alias = "pretty")]
    Text,
    /// JSON for machine parsing
    Json,
}
