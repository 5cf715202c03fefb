//! Service lifecycle types and status reporting
//!
//! The host environment delivers [`ControlRequest`]s and receives
//! [`ServiceStatus`] reports through a [`StatusSink`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::fs_utils;

/// Lifecycle of the whole agent process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    StartPending,
    Running,
    StopPending,
    Stopped,
}

impl ServiceState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartPending => "start_pending",
            Self::Running => "running",
            Self::StopPending => "stop_pending",
            Self::Stopped => "stopped",
        }
    }
}

/// Control request delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Report the current status, no transition
    Interrogate,
    /// Stop gracefully
    Stop,
    /// The machine is shutting down; same handling as `Stop`
    Shutdown,
    /// Any control code the service does not handle
    Other(u32),
}

impl From<u32> for ControlRequest {
    /// Map service-manager control codes (1 = stop, 4 = interrogate,
    /// 5 = shutdown)
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Stop,
            4 => Self::Interrogate,
            5 => Self::Shutdown,
            other => Self::Other(other),
        }
    }
}

/// Status reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub state: ServiceState,
    /// Whether stop/shutdown requests are currently accepted
    pub accepts_stop: bool,
    /// Bound listener address while running
    pub endpoint: Option<SocketAddr>,
}

impl ServiceStatus {
    pub fn new(state: ServiceState) -> Self {
        Self {
            state,
            accepts_stop: state == ServiceState::Running,
            endpoint: None,
        }
    }
}

/// Receiver of lifecycle status reports
pub trait StatusSink: Send + Sync {
    fn report(&self, status: &ServiceStatus);
}

/// Sink that logs every report
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn report(&self, status: &ServiceStatus) {
        match status.endpoint {
            Some(addr) => tracing::info!("Service {} on {}", status.state.as_str(), addr),
            None => tracing::info!("Service {}", status.state.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusSnapshot {
    state: ServiceState,
    pid: u32,
    timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
}

/// Sink that logs and mirrors the latest status to a JSON file.
///
/// The file is replaced atomically on every report and removed once the
/// service reports `Stopped`.
#[derive(Debug, Clone)]
pub struct StatusFileSink {
    path: PathBuf,
}

impl StatusFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn write(&self, status: &ServiceStatus) -> std::io::Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let snapshot = StatusSnapshot {
            state: status.state,
            pid: std::process::id(),
            timestamp,
            endpoint: status.endpoint.map(|addr| addr.to_string()),
        };
        let mut json = serde_json::to_vec(&snapshot)?;
        json.push(b'\n');
        fs_utils::atomic_write(&self.path, &json)
    }
}

impl StatusSink for StatusFileSink {
    fn report(&self, status: &ServiceStatus) {
        TracingStatusSink.report(status);

        if status.state == ServiceState::Stopped {
            match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    tracing::warn!("Failed to remove status file {}: {}", self.path.display(), e);
                }
                _ => {}
            }
            return;
        }

        if let Err(e) = self.write(status) {
            tracing::warn!("Failed to write status file {}: {}", self.path.display(), e);
        }
    }
}
