//! Process-signal service host
//!
//! Translates OS signals into [`ControlRequest`]s for the control loop:
//!
//! | Signal  | Request       |
//! |---------|---------------|
//! | SIGTERM | `Stop`        |
//! | SIGINT  | `Stop`        |
//! | SIGQUIT | `Shutdown`    |
//! | SIGUSR1 | `Interrogate` |
//!
//! On non-Unix platforms only Ctrl-C is observed and maps to `Stop`.

use tokio::sync::mpsc;

use super::controller::control_channel;
use super::state::ControlRequest;

/// Signal-driven source of control requests
pub struct SignalHost;

impl SignalHost {
    /// Install signal handlers and return the control request receiver.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> std::io::Result<mpsc::Receiver<ControlRequest>> {
        let (tx, rx) = control_channel();
        spawn_forwarder(tx)?;
        Ok(rx)
    }
}

#[cfg(unix)]
fn spawn_forwarder(tx: mpsc::Sender<ControlRequest>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut usr1 = signal(SignalKind::user_defined1())?;

    tokio::spawn(async move {
        loop {
            let request = tokio::select! {
                _ = term.recv() => ControlRequest::Stop,
                _ = interrupt.recv() => ControlRequest::Stop,
                _ = quit.recv() => ControlRequest::Shutdown,
                _ = usr1.recv() => ControlRequest::Interrogate,
            };
            tracing::info!("Signal received, forwarding {:?}", request);
            if tx.send(request).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_forwarder(tx: mpsc::Sender<ControlRequest>) -> std::io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, forwarding Stop");
            if tx.send(ControlRequest::Stop).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}
