//! Accept loop and graceful shutdown for the WebSocket endpoint

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use crate::error::{FontError, Result};
use crate::socket_server::connection::handle_connection;
use crate::socket_server::handler::ProtocolHandler;

/// Default upgrade path
pub const DEFAULT_ENDPOINT_PATH: &str = "/ws";

/// Outcome of [`ListenerHandle::shutdown`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Connections that finished within the drain window
    pub drained: usize,
    /// Connections aborted when the window ran out
    pub aborted: usize,
}

/// A bound, not yet accepting, listener
pub struct ConnectionListener {
    listener: TcpListener,
    endpoint_path: Arc<str>,
    handler: Arc<ProtocolHandler>,
}

impl ConnectionListener {
    /// Bind `addr`. Port 0 picks a free port; see [`Self::local_addr`].
    pub async fn bind(
        addr: SocketAddr,
        endpoint_path: &str,
        handler: Arc<ProtocolHandler>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| FontError::Bind { addr, source })?;
        Ok(Self {
            listener,
            endpoint_path: Arc::from(endpoint_path),
            handler,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start accepting connections on a background task
    pub fn spawn(self) -> Result<ListenerHandle> {
        let local_addr = self.local_addr()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tracing::info!(
            "Listening on ws://{}{}",
            local_addr,
            self.endpoint_path
        );
        let accept_task = tokio::spawn(accept_loop(
            self.listener,
            self.endpoint_path,
            Arc::clone(&self.handler),
            shutdown_rx,
        ));
        Ok(ListenerHandle {
            local_addr,
            shutdown_tx,
            accept_task,
            handler: self.handler,
        })
    }
}

/// Handle to a running listener
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<JoinSet<()>>,
    handler: Arc<ProtocolHandler>,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, ask every connection to finish, and wait at most
    /// `drain_timeout` for them before aborting the rest.
    ///
    /// Font mutations run detached from their connection, so they survive
    /// the abort. Returns only once every started AddFont/DelFont is done.
    pub async fn shutdown(self, drain_timeout: Duration) -> DrainReport {
        let report = drain(self.shutdown_tx, self.accept_task, drain_timeout).await;
        self.handler.settle().await;

        tracing::info!(
            "Listener stopped ({} drained, {} aborted)",
            report.drained,
            report.aborted
        );
        report
    }
}

async fn drain(
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<JoinSet<()>>,
    drain_timeout: Duration,
) -> DrainReport {
    // Receivers live in the accept loop and every connection
    let _ = shutdown_tx.send(true);

    let mut connections = match accept_task.await {
        Ok(set) => set,
        Err(e) => {
            tracing::error!("Accept loop ended abnormally: {}", e);
            return DrainReport::default();
        }
    };

    let mut report = DrainReport::default();
    let deadline = tokio::time::sleep(drain_timeout);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            joined = connections.join_next() => match joined {
                Some(_) => report.drained += 1,
                None => break,
            },
            _ = &mut deadline => break,
        }
    }

    report.aborted = connections.len();
    if report.aborted > 0 {
        tracing::warn!(
            "{} connections still busy after {:?}, aborting",
            report.aborted,
            drain_timeout
        );
        connections.abort_all();
        while connections.join_next().await.is_some() {}
    }
    report
}

async fn accept_loop(
    listener: TcpListener,
    endpoint_path: Arc<str>,
    handler: Arc<ProtocolHandler>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinSet<()> {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,

            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    tracing::info!("Accepted connection from {}", addr);
                    connections.spawn(handle_connection(
                        stream,
                        Arc::clone(&endpoint_path),
                        Arc::clone(&handler),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                }
            },

            // Reap finished connections so the set doesn't grow unbounded
            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = finished {
                    tracing::error!("Connection task failed: {}", e);
                }
            }
        }
    }
    connections
}
