//! fontwarden: background font installation agent
//!
//! Web pages cannot install fonts. fontwarden runs as a long-lived user
//! agent that listens on a local WebSocket and installs, removes and lists
//! fonts on a client's behalf. Fonts live in a single managed directory;
//! the agent keeps an in-memory registry of that directory and asks a
//! platform registrar to make each font usable by other applications.
//!
//! # Layout
//!
//! - [`service`] - lifecycle state machine and signal host
//! - [`socket_server`] - WebSocket listener, connections and JSON protocol
//! - [`fonts`] - validator, registry and platform registrar
//! - [`config`] - TOML configuration
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fontwarden::fonts::NullRegistrar;
//! use fontwarden::service::{control_channel, ServiceController, ServiceSettings, TracingStatusSink};
//!
//! let (tx, rx) = control_channel();
//! let controller = ServiceController::new(
//!     ServiceSettings::default(),
//!     Arc::new(NullRegistrar),
//!     Arc::new(TracingStatusSink),
//! );
//! tokio::spawn(controller.run(rx));
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fonts;
pub mod fs_utils;
pub mod logging;
pub mod service;
pub mod socket_server;

// Re-export commonly used types
pub use cli::{Cli, Commands, OutputFormat};
pub use config::AgentConfig;
pub use error::{FontError, Result};
pub use fonts::{FontRecord, FontRegistrar, FontRegistry};
pub use service::{ControlRequest, ServiceController, ServiceSettings, ServiceState};
pub use socket_server::{CommandKind, Message, ProtocolHandler, StatusKind};
