//! Configuration loading from TOML
//!
//! # Configuration File Format
//!
//! ```toml
//! [drone]
//! address = "192.168.42.1"
//! discovery_port = 44444
//! d2c_port = 43210
//! rtp_stream_port = 55004
//! rtp_control_port = 55005
//!
//! [controller]
//! controller_type = "computer"
//! controller_name = "bebop-link"
//!
//! # Optional preloaded route, flown in order when autostart is set
//! [route]
//! autostart = true
//! waypoints = [
//!     [59.93428, 10.71811, 30.0],
//!     [59.93445, 10.71930, 30.0],
//! ]
//! ```
//!
//! Every section is optional; missing fields fall back to the drone's
//! factory defaults above.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Network identity of the drone
#[derive(Debug, Clone, Deserialize)]
pub struct DroneConfig {
    /// Drone IP address (access-point mode default: 192.168.42.1)
    #[serde(default = "default_address")]
    pub address: String,

    /// TCP port for the discovery handshake
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,

    /// UDP port this controller listens on for drone-to-controller traffic
    #[serde(default = "default_d2c_port")]
    pub d2c_port: u16,

    /// RTP stream port advertised during discovery (video is handled
    /// externally; the engine only announces the port)
    #[serde(default = "default_rtp_stream_port")]
    pub rtp_stream_port: u16,

    /// RTP control port advertised during discovery
    #[serde(default = "default_rtp_control_port")]
    pub rtp_control_port: u16,
}

fn default_address() -> String {
    "192.168.42.1".to_string()
}
fn default_discovery_port() -> u16 {
    44444
}
fn default_d2c_port() -> u16 {
    43210
}
fn default_rtp_stream_port() -> u16 {
    55004
}
fn default_rtp_control_port() -> u16 {
    55005
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            discovery_port: default_discovery_port(),
            d2c_port: default_d2c_port(),
            rtp_stream_port: default_rtp_stream_port(),
            rtp_control_port: default_rtp_control_port(),
        }
    }
}

/// How this controller introduces itself during discovery
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_controller_type")]
    pub controller_type: String,

    #[serde(default = "default_controller_name")]
    pub controller_name: String,
}

fn default_controller_type() -> String {
    "computer".to_string()
}
fn default_controller_name() -> String {
    "bebop-link".to_string()
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_type: default_controller_type(),
            controller_name: default_controller_name(),
        }
    }
}

/// Optional preloaded waypoint route
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RouteConfig {
    /// Waypoints as `[latitude, longitude, altitude]` triples
    #[serde(default)]
    pub waypoints: Vec<[f64; 3]>,

    /// Start flying the route as soon as the session is up
    #[serde(default)]
    pub autostart: bool,
}

/// Root configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub drone: DroneConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub route: RouteConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;

        let config: Config = basic_toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.drone.address.is_empty() {
            return Err(Error::Config("drone address must not be empty".to_string()));
        }
        if self.drone.d2c_port == 0 {
            return Err(Error::Config(
                "d2c_port 0 would bind an ephemeral port the drone cannot reach".to_string(),
            ));
        }
        if self.controller.controller_name.is_empty() {
            return Err(Error::Config(
                "controller_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
