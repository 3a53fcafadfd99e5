//! Discovery handshake over TCP.
//!
//! Before any UDP traffic, the controller connects to the drone's
//! discovery port and announces itself with a JSON object. The drone
//! answers with its own JSON descriptor, padded with trailing NULs,
//! which carries the controller-to-drone (C2D) UDP port the rest of the
//! session must use. The TCP connection is closed as soon as the reply is
//! parsed.
//!
//! Port fields in the request are transmitted as integer-valued strings;
//! the reply carries plain integers.

use crate::config::Config;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// TCP connect deadline for the handshake
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Maximum reply size; the drone pads with NULs well below this
const REPLY_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Serialize)]
struct HandshakeRequest<'a> {
    controller_type: &'a str,
    controller_name: &'a str,
    d2c_port: String,
    arstream2_client_stream_port: String,
    arstream2_client_control_port: String,
}

#[derive(Debug, Deserialize)]
struct HandshakeReply {
    status: i32,
    c2d_port: u16,
    #[serde(default)]
    c2d_update_port: i32,
    #[serde(default)]
    c2d_user_port: i32,
    #[serde(default)]
    qos_mode: i32,
    #[serde(default)]
    arstream2_server_stream_port: i32,
    #[serde(default)]
    arstream2_server_control_port: i32,
}

/// Run the discovery handshake and return the negotiated C2D port
pub fn discover(config: &Config) -> Result<u16> {
    let target = (config.drone.address.as_str(), config.drone.discovery_port);
    let addr = target
        .to_socket_addrs()
        .map_err(Error::DiscoveryIo)?
        .next()
        .ok_or_else(|| {
            Error::DiscoveryIo(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "discovery address did not resolve",
            ))
        })?;

    log::info!("Discovery: connecting to {}", addr);
    let mut stream =
        TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(Error::DiscoveryIo)?;
    stream
        .set_read_timeout(Some(CONNECT_TIMEOUT))
        .map_err(Error::DiscoveryIo)?;

    let request = HandshakeRequest {
        controller_type: &config.controller.controller_type,
        controller_name: &config.controller.controller_name,
        d2c_port: config.drone.d2c_port.to_string(),
        arstream2_client_stream_port: config.drone.rtp_stream_port.to_string(),
        arstream2_client_control_port: config.drone.rtp_control_port.to_string(),
    };
    let body = serde_json::to_vec(&request)?;
    stream.write_all(&body).map_err(Error::DiscoveryIo)?;

    let mut reply = [0u8; REPLY_BUFFER_SIZE];
    let n = stream.read(&mut reply).map_err(Error::DiscoveryIo)?;

    // The reply is padded with NULs; serde chokes on them.
    let trimmed: &[u8] = {
        let end = reply[..n]
            .iter()
            .rposition(|&b| b != 0)
            .map(|p| p + 1)
            .unwrap_or(0);
        &reply[..end]
    };
    let parsed: HandshakeReply = serde_json::from_slice(trimmed)?;

    log::debug!(
        "Discovery reply: status={} c2d={} update={} user={} qos={} stream={} control={}",
        parsed.status,
        parsed.c2d_port,
        parsed.c2d_update_port,
        parsed.c2d_user_port,
        parsed.qos_mode,
        parsed.arstream2_server_stream_port,
        parsed.arstream2_server_control_port,
    );

    if parsed.status != 0 {
        return Err(Error::DiscoveryRejected {
            status: parsed.status,
        });
    }

    log::info!("Discovery succeeded, C2D port {}", parsed.c2d_port);
    Ok(parsed.c2d_port)
}
