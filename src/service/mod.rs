//! Service lifecycle
//!
//! - `state` - lifecycle states, control requests and status sinks
//! - `controller` - the control loop that owns the registry and listener
//! - `host` - signal-driven delivery of control requests

pub mod controller;
pub mod host;
pub mod state;

pub use controller::{control_channel, ServiceController, ServiceSettings, DEFAULT_PORT};
pub use host::SignalHost;
pub use state::{
    ControlRequest, ServiceState, ServiceStatus, StatusFileSink, StatusSink, TracingStatusSink,
};
