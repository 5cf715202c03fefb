//! Font agent socket server
//!
//! Serves the desktop client over a single WebSocket endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                 ConnectionListener (accept loop)                 │
//! │                                                                  │
//! │   ws://host:port/ws ──► handle_connection (one task per client)  │
//! │                              │                                   │
//! │                              ▼                                   │
//! │                       ProtocolHandler                            │
//! │                 ┌────────────┴────────────┐                      │
//! │                 ▼                         ▼                      │
//! │     FontRegistry (Arc, RwLock)     FontRegistrar (platform)      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol
//!
//! One JSON object per frame, requests and responses paired 1:1 in order:
//!
//! ```json
//! // Client -> Server
//! {"version": 1, "type": 0, "message": "", "status": 0, "fonts": [{"id": "", "path": "C:/Downloads/Inter.ttf", "name": ""}]}
//! {"version": 1, "type": 2, "message": "", "status": 0}
//!
//! // Server -> Client
//! {"version": 1, "type": 0, "message": "font C:/Downloads/Inter.ttf installed", "status": 0}
//! {"version": 1, "type": 2, "message": "", "status": 0, "fonts": [{"id": "…", "path": "…", "name": "Inter.ttf"}]}
//! ```
//!
//! `type`: 0=AddFont, 1=DelFont, 2=GetFont, 3=Heartbeat, 4=Unknown.
//! `status`: 0=OK, 1=Wait, 2=Failed.

pub mod connection;
pub mod handler;
pub mod listener;
pub mod protocol;

pub use connection::handle_connection;
pub use handler::{DeletePolicy, ProtocolHandler, RequestError};
pub use listener::{ConnectionListener, DrainReport, ListenerHandle, DEFAULT_ENDPOINT_PATH};
pub use protocol::{CommandKind, Message, StatusKind, PROTOCOL_VERSION};
