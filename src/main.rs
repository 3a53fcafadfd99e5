//! bebop-link - Ground-controller daemon for the Bebop quadcopter

use bebop_link::session::Session;
use bebop_link::{Config, Result};
use crossbeam_channel::unbounded;
use std::env;
use std::path::Path;
use std::thread;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("bebop-link v{} starting...", env!("CARGO_PKG_VERSION"));

    // Config from the first argument, a local bebop-link.toml, or defaults
    let config = match env::args().nth(1) {
        Some(path) => {
            log::info!("Using config: {}", path);
            Config::load(&path)?
        }
        None if Path::new("bebop-link.toml").exists() => {
            log::info!("Using config: bebop-link.toml");
            Config::load("bebop-link.toml")?
        }
        None => {
            log::info!("Using default configuration");
            Config::default()
        }
    };

    log::info!(
        "Drone: {} (discovery :{}, D2C :{})",
        config.drone.address,
        config.drone.discovery_port,
        config.drone.d2c_port
    );

    // The input device is an external collaborator; it would feed this
    // channel. The daemon keeps the sender alive for the whole run.
    let (_actions_tx, actions_rx) = unbounded();

    let (observer_tx, observer_rx) = unbounded();
    let mut session = Session::new(config.clone(), actions_rx, Some(observer_tx));

    // Preload the configured route before the link comes up
    let queue = session.waypoint_queue();
    for wp in &config.route.waypoints {
        if let Err(e) = queue.push(wp[0], wp[1], wp[2]) {
            log::warn!("route waypoint skipped: {}", e);
        }
    }
    if !config.route.waypoints.is_empty() {
        log::info!(
            "route loaded: {} waypoints (autostart: {})",
            config.route.waypoints.len(),
            config.route.autostart
        );
    }

    let control = session.control();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        control.quit();
    })
    .map_err(|e| bebop_link::Error::Config(format!("failed to set Ctrl-C handler: {}", e)))?;

    // Minimal observer: log decoded drone events
    thread::Builder::new()
        .name("observer".to_string())
        .spawn(move || {
            for event in observer_rx.iter() {
                log::info!("drone event: {:?}", event);
            }
        })
        .expect("failed to spawn observer thread");

    session.run()?;

    log::info!("bebop-link stopped");
    Ok(())
}
