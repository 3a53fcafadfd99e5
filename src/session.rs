//! Session supervisor.
//!
//! Owns the whole lifecycle of a controller-drone link:
//!
//! ```text
//! Disconnected ──▶ Discovery (≤20 × 2 s backoff) ──▶ bind D2C / dial C2D
//!      ▲                                                     │
//!      │ 3 s settle                                          ▼
//!      └──────────── teardown ◀── liveness lost /     spawn 6 workers
//!                       │         reconnect request
//!                       └──▶ return on quit
//! ```
//!
//! # Thread Model
//!
//! Each connection cycle spawns six named workers sharing one shutdown
//! flag rooted at the session:
//!
//! 1. **udp-reader**: datagrams → packet queue, arms the liveness deadline
//! 2. **udp-writer**: outbound queue → socket, single consumer
//! 3. **dispatcher**: packet queue → pong/ack replies + typed routing
//! 4. **pcmd-scheduler**: rate-limits piloting commands to one per 50 ms
//! 5. **waypoint-executor**: drives one moveTo at a time from the route
//! 6. **input-router**: abstract actions → encoded packets
//!
//! Every blocking wait in a worker is bounded, so cancellation converges
//! within a short grace period; the supervisor joins all handles before
//! starting the next cycle. Sequence counters live in a per-cycle
//! [`FrameEncoder`], so a reconnect starts a fresh sequence space.
//!
//! The waypoint buffer and the input action channel are owned by the
//! session itself and survive reconnects: a route keeps its remaining
//! targets across a link drop.

use crate::config::Config;
use crate::discovery;
use crate::dispatch::{self, Dispatcher};
use crate::error::{Error, Result};
use crate::input::{self, InputAction, RouterOutputs};
use crate::pcmd;
use crate::protocol::{CommandArgs, FrameEncoder, MoveToStatus};
use crate::transport;
use crate::waypoint::{Waypoint, WaypointExecutor, WaypointQueue};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Discovery attempts per connection cycle
const DISCOVERY_ATTEMPTS: u32 = 20;
/// Backoff between discovery attempts
const DISCOVERY_BACKOFF: Duration = Duration::from_secs(2);
/// Settle time between teardown and the next connection cycle
const RECONNECT_SETTLE: Duration = Duration::from_secs(3);
/// Supervisor wake-up granularity while waiting for events
const EVENT_POLL: Duration = Duration::from_millis(250);

/// Events that drive the supervisor's lifecycle decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The read deadline elapsed; the link is considered dead
    LivenessLost,
    /// Explicit operator request to drop and redo the connection
    Reconnect,
    /// Terminate the session
    Quit,
}

/// Handle for requesting lifecycle transitions from outside the session
#[derive(Debug, Clone)]
pub struct SessionControl {
    events_tx: Sender<SessionEvent>,
    quit: Arc<AtomicBool>,
}

impl SessionControl {
    pub fn quit(&self) {
        self.quit.store(true, Ordering::Relaxed);
        self.events_tx.send(SessionEvent::Quit).ok();
    }

    pub fn reconnect(&self) {
        self.events_tx.send(SessionEvent::Reconnect).ok();
    }
}

enum CycleEnd {
    Quit,
    Reconnect,
}

/// One controller-drone session: discovery, workers, liveness, reconnect
pub struct Session {
    config: Config,
    actions_rx: Receiver<InputAction>,
    observer_tx: Option<Sender<CommandArgs>>,
    waypoints_tx: Sender<Waypoint>,
    waypoints_rx: Receiver<Waypoint>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    quit: Arc<AtomicBool>,
}

impl Session {
    pub fn new(
        config: Config,
        actions_rx: Receiver<InputAction>,
        observer_tx: Option<Sender<CommandArgs>>,
    ) -> Self {
        let (waypoints_tx, waypoints_rx) = unbounded();
        let (events_tx, events_rx) = unbounded();
        Self {
            config,
            actions_rx,
            observer_tx,
            waypoints_tx,
            waypoints_rx,
            events_tx,
            events_rx,
            quit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Lifecycle handle usable from signal handlers and other threads
    pub fn control(&self) -> SessionControl {
        SessionControl {
            events_tx: self.events_tx.clone(),
            quit: Arc::clone(&self.quit),
        }
    }

    /// Validating ingest handle for the waypoint route
    pub fn waypoint_queue(&self) -> WaypointQueue {
        WaypointQueue::new(self.waypoints_tx.clone())
    }

    /// Run until quit. Discovery failures exhaust into an error; link
    /// drops reconnect forever.
    pub fn run(&mut self) -> Result<()> {
        loop {
            if self.quit.load(Ordering::Relaxed) {
                break;
            }

            let c2d_port = match self.discover_with_retry() {
                Ok(port) => port,
                Err(Error::QuitRequested) => break,
                Err(e) => return Err(e),
            };

            match self.run_connected(c2d_port) {
                Ok(CycleEnd::Quit) => break,
                Ok(CycleEnd::Reconnect) => {
                    log::info!("reconnecting in {:?}", RECONNECT_SETTLE);
                    thread::sleep(RECONNECT_SETTLE);
                }
                Err(e) => {
                    // Bind/dial failures are fatal for this attempt only.
                    log::error!("connection attempt failed: {}", e);
                    thread::sleep(RECONNECT_SETTLE);
                }
            }
        }

        log::info!("session terminated");
        Ok(())
    }

    fn discover_with_retry(&self) -> Result<u16> {
        for attempt in 1..=DISCOVERY_ATTEMPTS {
            if self.quit.load(Ordering::Relaxed) {
                return Err(Error::QuitRequested);
            }
            match discovery::discover(&self.config) {
                Ok(port) => return Ok(port),
                Err(e) => {
                    log::warn!(
                        "discovery attempt {}/{} failed: {}",
                        attempt,
                        DISCOVERY_ATTEMPTS,
                        e
                    );
                    if attempt < DISCOVERY_ATTEMPTS {
                        thread::sleep(DISCOVERY_BACKOFF);
                    }
                }
            }
        }
        Err(Error::DiscoveryFailed {
            attempts: DISCOVERY_ATTEMPTS,
        })
    }

    /// One connection cycle: sockets, workers, event wait, teardown
    fn run_connected(&mut self, c2d_port: u16) -> Result<CycleEnd> {
        let inbound = UdpSocket::bind(("0.0.0.0", self.config.drone.d2c_port)).map_err(Error::Bind)?;
        let outbound = UdpSocket::bind(("0.0.0.0", 0)).map_err(Error::Bind)?;
        outbound
            .connect((self.config.drone.address.as_str(), c2d_port))
            .map_err(Error::Dial)?;
        log::info!(
            "command plane up: D2C :{} ⇄ C2D {}:{}",
            self.config.drone.d2c_port,
            self.config.drone.address,
            c2d_port
        );

        // Fresh sequence space and channels for this cycle
        let shutdown = Arc::new(AtomicBool::new(false));
        let encoder = FrameEncoder::shared();
        let (outbound_tx, outbound_rx) = unbounded::<Vec<u8>>();
        let (pcmd_tx, pcmd_rx) = unbounded::<Vec<u8>>();
        let (packets_tx, packets_rx) = unbounded::<Vec<u8>>();
        let (completion_tx, completion_rx) = unbounded::<Waypoint>();
        let (status_tx, status_rx) = unbounded::<MoveToStatus>();
        let (execute_tx, execute_rx) = unbounded::<()>();
        let (cancel_tx, cancel_rx) = unbounded::<()>();

        // Events from a previous cycle's reader are stale by definition.
        while self.events_rx.try_recv().is_ok() {}

        let mut workers: Vec<(&'static str, JoinHandle<()>)> = Vec::with_capacity(6);

        {
            let events_tx = self.events_tx.clone();
            let shutdown = Arc::clone(&shutdown);
            workers.push((
                "udp-reader",
                spawn_worker("udp-reader", move || {
                    transport::reader_loop(inbound, packets_tx, events_tx, shutdown)
                }),
            ));
        }
        {
            let shutdown = Arc::clone(&shutdown);
            workers.push((
                "udp-writer",
                spawn_worker("udp-writer", move || {
                    transport::writer_loop(outbound, outbound_rx, shutdown)
                }),
            ));
        }
        {
            let dispatcher = Dispatcher::new(
                Arc::clone(&encoder),
                outbound_tx.clone(),
                completion_tx,
                status_tx,
                self.observer_tx.clone(),
            );
            let shutdown = Arc::clone(&shutdown);
            workers.push((
                "dispatcher",
                spawn_worker("dispatcher", move || {
                    dispatch::dispatcher_loop(dispatcher, packets_rx, shutdown)
                }),
            ));
        }
        {
            let outbound_tx = outbound_tx.clone();
            let shutdown = Arc::clone(&shutdown);
            workers.push((
                "pcmd-scheduler",
                spawn_worker("pcmd-scheduler", move || {
                    pcmd::scheduler_loop(pcmd_rx, outbound_tx, shutdown)
                }),
            ));
        }
        {
            let executor = WaypointExecutor::new(
                self.waypoints_rx.clone(),
                execute_rx,
                cancel_rx,
                completion_rx,
                status_rx,
                Arc::clone(&encoder),
                outbound_tx.clone(),
                Arc::clone(&shutdown),
            );
            workers.push((
                "waypoint-executor",
                spawn_worker("waypoint-executor", move || executor.run()),
            ));
        }
        {
            let outputs = RouterOutputs {
                encoder: Arc::clone(&encoder),
                pcmd_tx,
                outbound_tx: outbound_tx.clone(),
                execute_tx: execute_tx.clone(),
                cancel_tx,
            };
            let actions_rx = self.actions_rx.clone();
            let shutdown = Arc::clone(&shutdown);
            workers.push((
                "input-router",
                spawn_worker("input-router", move || {
                    input::router_loop(actions_rx, outputs, shutdown)
                }),
            ));
        }

        log::info!("all workers started");

        self.send_greeting(&encoder, &outbound_tx);

        if self.config.route.autostart {
            if self.waypoints_rx.is_empty() {
                log::warn!("route autostart skipped: {}", Error::BufferEmpty);
            } else {
                log::info!("route autostart: signalling waypoint executor");
                execute_tx.send(()).ok();
            }
        }

        // Wait for a lifecycle event
        let end = loop {
            match self.events_rx.recv_timeout(EVENT_POLL) {
                Ok(SessionEvent::Quit) => break CycleEnd::Quit,
                Ok(SessionEvent::Reconnect) => {
                    log::info!("reconnect requested");
                    break CycleEnd::Reconnect;
                }
                Ok(SessionEvent::LivenessLost) => {
                    log::warn!("liveness lost, tearing down for reconnect");
                    break CycleEnd::Reconnect;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.quit.load(Ordering::Relaxed) {
                        break CycleEnd::Quit;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break CycleEnd::Quit,
            }
        };

        // Teardown: flag first, then drop our channel ends so blocked
        // workers see the disconnect, then join everyone.
        shutdown.store(true, Ordering::Relaxed);
        drop(outbound_tx);
        drop(execute_tx);
        for (name, handle) in workers {
            if handle.join().is_err() {
                log::error!("worker {} panicked", name);
            }
        }
        log::info!("all workers stopped");

        Ok(end)
    }

    /// Post-connect pleasantries: ask for the full state dump and sync the
    /// drone's clock, the way any controller is expected to after
    /// discovery.
    fn send_greeting(&self, encoder: &crate::protocol::SharedEncoder, outbound_tx: &Sender<Vec<u8>>) {
        let now = chrono::Local::now();
        let greeting = [
            CommandArgs::AllStates,
            CommandArgs::CurrentDate {
                date: now.format("%Y-%m-%d").to_string(),
            },
            CommandArgs::CurrentTime {
                time: now.format("T%H%M%S%z").to_string(),
            },
        ];
        for args in greeting {
            let datagram = encoder.lock().command(&args);
            outbound_tx.send(datagram).ok();
        }
    }
}

fn spawn_worker<F>(name: &str, body: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .unwrap_or_else(|e| panic!("failed to spawn {} worker: {}", name, e))
}
