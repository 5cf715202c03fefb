//! Running listener and WebSocket client for end-to-end tests

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use fontwarden::fonts::registrar::RegistrarError;
use fontwarden::fonts::{FontRegistrar, FontRegistry};
use fontwarden::socket_server::{
    ConnectionListener, DeletePolicy, DrainReport, ListenerHandle, Message, ProtocolHandler,
};

/// Registrar that only counts calls
#[derive(Default)]
pub struct CountingRegistrar {
    pub registered: AtomicUsize,
    pub unregistered: AtomicUsize,
}

impl CountingRegistrar {
    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn unregistered(&self) -> usize {
        self.unregistered.load(Ordering::SeqCst)
    }
}

impl FontRegistrar for CountingRegistrar {
    fn register(&self, _path: &Path) -> Result<(), RegistrarError> {
        self.registered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unregister(&self, _path: &Path) -> Result<(), RegistrarError> {
        self.unregistered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Delete policy without the production grace period
pub fn quick_policy() -> DeletePolicy {
    DeletePolicy {
        grace: Duration::from_millis(1),
        attempts: 3,
        initial_backoff: Duration::from_millis(5),
        max_wait: Duration::from_millis(200),
    }
}

/// A listener bound to an ephemeral port on loopback
pub struct TestAgent {
    pub handle: ListenerHandle,
    pub registry: Arc<FontRegistry>,
    pub registrar: Arc<CountingRegistrar>,
}

impl TestAgent {
    pub async fn start(font_dir: &Path) -> Self {
        Self::start_with_policy(font_dir, quick_policy()).await
    }

    pub async fn start_with_policy(font_dir: &Path, policy: DeletePolicy) -> Self {
        let registry = Arc::new(FontRegistry::open(font_dir).expect("Failed to open registry"));
        let registrar = Arc::new(CountingRegistrar::default());
        let handler = ProtocolHandler::new(Arc::clone(&registry), registrar.clone())
            .with_delete_policy(policy);
        let listener = ConnectionListener::bind(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            "/ws",
            Arc::new(handler),
        )
        .await
        .expect("Failed to bind");
        let handle = listener.spawn().expect("Failed to spawn listener");
        Self {
            handle,
            registry,
            registrar,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    pub fn url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr(), path)
    }

    pub async fn connect(&self) -> WsClient {
        WsClient::connect(&self.url("/ws")).await
    }

    pub async fn stop(self) -> DrainReport {
        self.handle.shutdown(Duration::from_secs(2)).await
    }
}

/// Thin request/response client
pub struct WsClient {
    pub ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.expect("Failed to connect");
        Self { ws }
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Frame::Text(text.to_string()))
            .await
            .expect("Failed to send");
    }

    /// Send `request` as a text frame and wait for the reply
    pub async fn request(&mut self, request: &Message) -> Message {
        let json = serde_json::to_string(request).expect("Failed to encode");
        self.send_text(&json).await;
        self.next_message().await
    }

    /// Next text or binary frame decoded as a message
    pub async fn next_message(&mut self) -> Message {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("Timed out waiting for a reply")
                .expect("Connection ended")
                .expect("WebSocket error");
            match frame {
                Frame::Text(text) => {
                    return serde_json::from_str(&text).expect("Reply is not a message")
                }
                Frame::Binary(data) => {
                    return serde_json::from_slice(&data).expect("Reply is not a message")
                }
                _ => continue,
            }
        }
    }

    /// Wait until the server closes the connection
    pub async fn expect_closed(&mut self) {
        loop {
            let next = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("Timed out waiting for close");
            match next {
                None | Some(Err(_)) | Some(Ok(Frame::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    }
}

pub fn font_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
