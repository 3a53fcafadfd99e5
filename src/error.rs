//! Error types for bebop-link
//!
//! # Error Recovery Strategies
//!
//! Different error classes require different recovery approaches:
//!
//! ## Protocol Errors (Log and Continue)
//!
//! - **`TruncatedHeader`**, **`TruncatedFrame`**, **`InvalidDataType`**,
//!   **`DecodeArg`**: a malformed frame or argument record. The frame is
//!   logged and skipped; the session is unaffected. A frame that requested
//!   an ack is still acked even when its command payload cannot be decoded.
//!
//! ## Liveness Errors (Reconnect)
//!
//! - **`LivenessLost`**: no inbound traffic within the read deadline. The
//!   supervisor cancels all workers and restarts from discovery.
//!
//! ## Discovery Errors
//!
//! - **`DiscoveryIo`**, **`DiscoveryParse`**, **`DiscoveryRejected`**:
//!   retried with backoff, up to the attempt limit.
//! - **`DiscoveryFailed`**: all attempts exhausted. Terminates the session.
//!
//! ## Transport Errors
//!
//! - **`Bind`**, **`Dial`**: fatal for the connection attempt; the
//!   supervisor restarts the cycle from discovery.
//! - **`Read`**, **`Write`**: logged and retried unless they coincide with
//!   cancellation. The writer never tears the session down itself.
//!
//! ## State Errors (Recoverable Locally)
//!
//! - **`WaypointInvalid`**: rejected at ingest, logged, waypoint dropped.
//! - **`MoveToTimeout`**: the executor advances to the next waypoint.
//! - **`BufferEmpty`**: no waypoint available right now.
//!
//! ## Fatal
//!
//! - **`QuitRequested`**: operator asked to stop; propagates to the
//!   supervisor which tears everything down and returns.

use thiserror::Error;

/// Errors that can occur in bebop-link
///
/// See module-level documentation for recovery strategies.
#[derive(Error, Debug)]
pub enum Error {
    #[error("truncated frame header: {remaining} bytes remaining, need 7")]
    TruncatedHeader { remaining: usize },

    #[error("truncated frame: declared size {size}, {remaining} bytes remaining")]
    TruncatedFrame { size: u32, remaining: usize },

    #[error("invalid frame data type: 0x{0:02X}")]
    InvalidDataType(u8),

    #[error("argument decode failed: {0}")]
    DecodeArg(String),

    #[error("no inbound traffic within the read deadline")]
    LivenessLost,

    #[error("discovery I/O error: {0}")]
    DiscoveryIo(#[source] std::io::Error),

    #[error("discovery reply parse error: {0}")]
    DiscoveryParse(#[from] serde_json::Error),

    #[error("discovery rejected by drone: status {status}")]
    DiscoveryRejected { status: i32 },

    #[error("discovery failed after {attempts} attempts")]
    DiscoveryFailed { attempts: u32 },

    #[error("failed to bind UDP socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to dial drone: {0}")]
    Dial(#[source] std::io::Error),

    #[error("UDP read error: {0}")]
    Read(#[source] std::io::Error),

    #[error("UDP write error: {0}")]
    Write(#[source] std::io::Error),

    #[error(
        "invalid waypoint: lat={latitude}, lon={longitude}, alt={altitude} \
        (out of bounds or no GPS fix)"
    )]
    WaypointInvalid {
        latitude: f64,
        longitude: f64,
        altitude: f64,
    },

    #[error("moveTo completion not confirmed within the deadline")]
    MoveToTimeout,

    #[error("waypoint buffer is empty")]
    BufferEmpty,

    #[error("quit requested")]
    QuitRequested,

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
