//! Service control loop
//!
//! ```text
//! StartPending ──► Running ──► StopPending ──► Stopped
//!                     │  ▲
//!                     └──┘  tick / Interrogate / unexpected codes
//! ```
//!
//! Entering `Running` opens the font registry and starts the listener. If
//! either fails the service goes straight to `StopPending` and `Stopped`
//! without serving anything.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::error::{FontError, Result};
use crate::fonts::{FontRegistrar, FontRegistry};
use crate::fs_utils;
use crate::socket_server::{
    ConnectionListener, DeletePolicy, ListenerHandle, ProtocolHandler, DEFAULT_ENDPOINT_PATH,
};

use super::state::{ControlRequest, ServiceState, ServiceStatus, StatusSink};

/// Default listener port
pub const DEFAULT_PORT: u16 = 42135;

/// Everything the control loop needs to bring the agent up
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Managed font directory
    pub font_dir: PathBuf,
    pub listen_addr: SocketAddr,
    /// Path accepted for WebSocket upgrades
    pub endpoint_path: String,
    /// Upper bound on waiting for connections during shutdown
    pub drain_timeout: Duration,
    /// Liveness tick of the control loop
    pub tick_interval: Duration,
    pub delete_policy: DeletePolicy,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            font_dir: fs_utils::default_font_dir(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            drain_timeout: Duration::from_secs(5),
            tick_interval: Duration::from_millis(500),
            delete_policy: DeletePolicy::default(),
        }
    }
}

/// Create the channel a host uses to deliver control requests
pub fn control_channel() -> (mpsc::Sender<ControlRequest>, mpsc::Receiver<ControlRequest>) {
    mpsc::channel(16)
}

/// Drives the service lifecycle
pub struct ServiceController {
    settings: ServiceSettings,
    registrar: Arc<dyn FontRegistrar>,
    sink: Arc<dyn StatusSink>,
    status: ServiceStatus,
}

impl ServiceController {
    pub fn new(
        settings: ServiceSettings,
        registrar: Arc<dyn FontRegistrar>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            settings,
            registrar,
            sink,
            status: ServiceStatus::new(ServiceState::Stopped),
        }
    }

    /// Run until a stop/shutdown request arrives or the control channel
    /// closes. Returns an error only when startup fails.
    pub async fn run(mut self, mut control: mpsc::Receiver<ControlRequest>) -> Result<()> {
        self.transition(ServiceState::StartPending);
        self.transition(ServiceState::Running);

        let listener = match self.start().await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!("Could not start font service: {}", e);
                self.transition(ServiceState::StopPending);
                self.transition(ServiceState::Stopped);
                return Err(e);
            }
        };
        self.status.endpoint = Some(listener.local_addr());
        self.sink.report(&self.status);

        let mut tick = tokio::time::interval(self.settings.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    tracing::trace!("Control loop alive");
                }
                request = control.recv() => match request {
                    Some(ControlRequest::Interrogate) => {
                        self.sink.report(&self.status);
                    }
                    Some(ControlRequest::Stop) | Some(ControlRequest::Shutdown) => {
                        tracing::info!("Received {:?}, shutting down gracefully", request);
                        break;
                    }
                    Some(ControlRequest::Other(code)) => {
                        tracing::warn!("Unexpected control request {}", code);
                    }
                    None => {
                        tracing::info!("Control channel closed, shutting down");
                        break;
                    }
                },
            }
        }

        self.transition(ServiceState::StopPending);
        listener.shutdown(self.settings.drain_timeout).await;
        tracing::info!("Font service shut down gracefully");
        self.transition(ServiceState::Stopped);
        Ok(())
    }

    async fn start(&self) -> Result<ListenerHandle> {
        let font_dir = self.settings.font_dir.clone();
        let registry = tokio::task::spawn_blocking(move || FontRegistry::open(&font_dir))
            .await
            .map_err(|e| FontError::Task {
                message: e.to_string(),
            })??;
        let registry = Arc::new(registry);
        let handler = ProtocolHandler::new(registry, Arc::clone(&self.registrar))
            .with_delete_policy(self.settings.delete_policy);
        let listener = ConnectionListener::bind(
            self.settings.listen_addr,
            &self.settings.endpoint_path,
            Arc::new(handler),
        )
        .await?;
        listener.spawn()
    }

    fn transition(&mut self, state: ServiceState) {
        self.status = ServiceStatus {
            state,
            accepts_stop: state == ServiceState::Running,
            endpoint: if state == ServiceState::Running {
                self.status.endpoint
            } else {
                None
            },
        };
        self.sink.report(&self.status);
    }
}
