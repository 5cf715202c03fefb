//! WebSocket connection handler
//!
//! Pumps request/response pairs for a single client. Requests are handled
//! strictly in order; a malformed frame is logged and skipped without closing
//! the connection.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::{accept_hdr_async, tungstenite::Message as Frame, WebSocketStream};

use crate::socket_server::handler::ProtocolHandler;
use crate::socket_server::protocol::Message;

/// Handle a single WebSocket connection until the client leaves, the
/// transport fails, or shutdown is signalled.
pub async fn handle_connection(
    stream: TcpStream,
    endpoint_path: Arc<str>,
    handler: Arc<ProtocolHandler>,
    shutdown: watch::Receiver<bool>,
) {
    let addr = stream.peer_addr().ok();

    // Only upgrades on the configured path are accepted. Origin is not checked.
    let expected = Arc::clone(&endpoint_path);
    let check_path = move |request: &Request, response: Response| {
        if request.uri().path() == &*expected {
            Ok(response)
        } else {
            tracing::info!("Rejecting upgrade for path {}", request.uri().path());
            let mut rejection = ErrorResponse::new(Some("not found".to_string()));
            *rejection.status_mut() = StatusCode::NOT_FOUND;
            Err(rejection)
        }
    };

    let ws_stream = match accept_hdr_async(stream, check_path).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!("WebSocket handshake with {:?} failed: {}", addr, e);
            return;
        }
    };

    let mut conn = ConnectionState::new(ws_stream, handler, shutdown, addr);
    tracing::info!("[{}] Client connected from {:?}", conn.client_id, addr);
    conn.run().await;
    tracing::info!("[{}] Connection closed", conn.client_id);
}

/// State for a single connection
struct ConnectionState {
    ws: WebSocketStream<TcpStream>,
    handler: Arc<ProtocolHandler>,
    shutdown: watch::Receiver<bool>,
    client_id: String,
}

impl ConnectionState {
    fn new(
        ws: WebSocketStream<TcpStream>,
        handler: Arc<ProtocolHandler>,
        shutdown: watch::Receiver<bool>,
        addr: Option<SocketAddr>,
    ) -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        let client_id = format!("cli_{}", &uuid[..8]);
        tracing::debug!("Assigned {} to {:?}", client_id, addr);
        Self {
            ws,
            handler,
            shutdown,
            client_id,
        }
    }

    async fn run(&mut self) {
        loop {
            if *self.shutdown.borrow() {
                self.close().await;
                break;
            }

            tokio::select! {
                // Shutdown is only observed between frames, so a request in
                // flight always gets its response first.
                _ = self.shutdown.changed() => {
                    self.close().await;
                    break;
                }

                msg = self.ws.next() => {
                    match msg {
                        Some(Ok(Frame::Text(text))) => {
                            if !self.dispatch(text.as_bytes(), false).await {
                                break;
                            }
                        }
                        Some(Ok(Frame::Binary(data))) => {
                            if !self.dispatch(&data, true).await {
                                break;
                            }
                        }
                        Some(Ok(Frame::Ping(data))) => {
                            if let Err(e) = self.ws.send(Frame::Pong(data)).await {
                                tracing::warn!("[{}] Pong failed: {}", self.client_id, e);
                                break;
                            }
                        }
                        Some(Ok(Frame::Close(_))) => {
                            tracing::info!("Client {} requested close", self.client_id);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!("[{}] WebSocket error: {}", self.client_id, e);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
    }

    /// Decode, handle and answer one frame. Returns `false` when the
    /// connection can no longer be written to.
    async fn dispatch(&mut self, payload: &[u8], binary: bool) -> bool {
        let request: Message = match serde_json::from_slice(payload) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("[{}] Could not decode message: {}", self.client_id, e);
                return true;
            }
        };
        tracing::debug!("[{}] rcv: {:?}", self.client_id, request);

        let response = self.handler.handle(request).await;
        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("[{}] Could not encode response: {}", self.client_id, e);
                return true;
            }
        };

        // Answer in the same frame kind the client used
        let frame = if binary {
            Frame::Binary(json.into_bytes())
        } else {
            Frame::Text(json)
        };
        match self.ws.send(frame).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[{}] Send failed: {}", self.client_id, e);
                false
            }
        }
    }

    async fn close(&mut self) {
        tracing::info!("[{}] Closing for shutdown", self.client_id);
        if let Err(e) = self.ws.close(None).await {
            tracing::debug!("[{}] Close handshake failed: {}", self.client_id, e);
        }
    }
}
