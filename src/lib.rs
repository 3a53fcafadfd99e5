//! bebop-link - Ground-controller protocol engine for the Bebop quadcopter
//!
//! This library implements the vendor wire protocol over UDP: the TCP
//! discovery handshake, ARNetworkAL framing, typed ARCommands, per-buffer
//! sequencing, ack/pong reply state, the rate-limited piloting command
//! scheduler, FIFO waypoint execution, and a supervising session that
//! reconnects when the link goes quiet.
//!
//! Input devices, video forwarding and UIs live outside: they talk to the
//! engine through the [`input::InputAction`] channel, the
//! [`waypoint::WaypointQueue`] ingest handle, and the observer channel of
//! decoded drone events.

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod pcmd;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod waypoint;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use input::InputAction;
pub use session::{Session, SessionControl};
pub use waypoint::{Waypoint, WaypointQueue};
