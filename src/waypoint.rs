//! Waypoint buffer and moveTo execution state machine.
//!
//! # Architecture
//!
//! Producers push GPS targets into a FIFO buffer through a validating
//! ingest handle; a single executor pops them and drives one moveTo at a
//! time. Completion is latch-based: the executor arms itself for exactly
//! one confirmation per leg and ignores anything stale.
//!
//! ```text
//!         Execute                 pop + emit moveTo
//! ┌──────┐ ──────▶ ┌─────────────┐ ──────────────▶ ┌────────────────────┐
//! │ Idle │         │ Dispatching │                 │ AwaitingCompletion │
//! └──────┘ ◀────── └─────────────┘ ◀────────────── └────────────────────┘
//!     ▲     Cancel        ▲        position fix /           │
//!     │                   │        5 s deadline             │ Cancel
//!     │             ┌────────────┐                          │
//!     └──────────── │ Cancelling │ ◀────────────────────────┘
//!       emit cancel └────────────┘
//! ```
//!
//! Cancel halts the current leg only; queued waypoints are preserved so a
//! single aborted leg does not silently discard the rest of the route. A
//! missing confirmation within the deadline advances best-effort; the
//! drone may well have reached the target without the terminal event
//! landing inside the window.

use crate::error::{Error, Result};
use crate::protocol::command::OrientationMode;
use crate::protocol::{CommandArgs, MoveToStatus, SharedEncoder};
use crossbeam_channel::{after, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wire sentinel the drone reports in every GPS field when it has no fix
pub const NO_GPS_SENTINEL: f64 = 500.0;

/// How long to wait for a moveTo confirmation before advancing
pub const MOVE_TO_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll granularity for cancellation checks in blocking waits
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A GPS target: latitude/longitude in degrees, altitude in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Waypoint {
    /// Validate a target at the ingest boundary. Rejects the no-GPS
    /// sentinel and anything outside latitude (-91, 91) / longitude
    /// (-181, 181).
    pub fn checked(latitude: f64, longitude: f64, altitude: f64) -> Result<Self> {
        let invalid = Error::WaypointInvalid {
            latitude,
            longitude,
            altitude,
        };
        if latitude == NO_GPS_SENTINEL
            || longitude == NO_GPS_SENTINEL
            || altitude == NO_GPS_SENTINEL
        {
            return Err(invalid);
        }
        if !(-91.0 < latitude && latitude < 91.0) {
            return Err(invalid);
        }
        if !(-181.0 < longitude && longitude < 181.0) {
            return Err(invalid);
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }

    /// Convert a position straight off the wire. The sentinel marks "no
    /// GPS" and becomes `None` here so no sentinel arithmetic leaks
    /// further in.
    pub fn from_fix(latitude: f64, longitude: f64, altitude: f64) -> Option<Self> {
        if latitude == NO_GPS_SENTINEL
            || longitude == NO_GPS_SENTINEL
            || altitude == NO_GPS_SENTINEL
        {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
            altitude,
        })
    }
}

/// Multi-producer ingest handle for the waypoint buffer. Clones share the
/// same buffer; the buffer outlives reconnects.
#[derive(Debug, Clone)]
pub struct WaypointQueue {
    tx: Sender<Waypoint>,
}

impl WaypointQueue {
    pub(crate) fn new(tx: Sender<Waypoint>) -> Self {
        Self { tx }
    }

    /// Validate and enqueue a target. Invalid targets are rejected here
    /// and never reach the executor.
    pub fn push(&self, latitude: f64, longitude: f64, altitude: f64) -> Result<()> {
        let waypoint = Waypoint::checked(latitude, longitude, altitude).map_err(|e| {
            log::warn!("waypoint rejected at ingest: {}", e);
            e
        })?;
        if self.tx.send(waypoint).is_err() {
            log::warn!("waypoint buffer is gone, dropping target");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Dispatching,
    AwaitingCompletion,
    Cancelling,
}

/// Drives queued waypoints, one moveTo in flight at a time
pub struct WaypointExecutor {
    waypoints: Receiver<Waypoint>,
    execute: Receiver<()>,
    cancel: Receiver<()>,
    /// Valid position fixes from the dispatcher; a fix confirms the leg
    completion: Receiver<Waypoint>,
    /// moveToChanged status reports from the dispatcher
    status: Receiver<MoveToStatus>,
    encoder: SharedEncoder,
    outbound: Sender<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
}

impl WaypointExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        waypoints: Receiver<Waypoint>,
        execute: Receiver<()>,
        cancel: Receiver<()>,
        completion: Receiver<Waypoint>,
        status: Receiver<MoveToStatus>,
        encoder: SharedEncoder,
        outbound: Sender<Vec<u8>>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            waypoints,
            execute,
            cancel,
            completion,
            status,
            encoder,
            outbound,
            shutdown,
        }
    }

    pub fn run(mut self) {
        let mut state = State::Idle;
        while !self.shutdown.load(Ordering::Relaxed) {
            state = match state {
                State::Idle => self.wait_for_execute(),
                State::Dispatching => self.dispatch_next(),
                State::AwaitingCompletion => self.await_completion(),
                State::Cancelling => self.cancel_current(),
            };
        }
        log::info!("Waypoint executor exiting");
    }

    fn wait_for_execute(&mut self) -> State {
        select! {
            recv(self.execute) -> msg => match msg {
                Ok(()) => State::Dispatching,
                Err(_) => State::Idle,
            },
            recv(self.cancel) -> _ => {
                // Nothing in flight; a cancel here is a no-op.
                State::Idle
            }
            default(POLL_INTERVAL) => State::Idle,
        }
    }

    /// Pop the next waypoint (blocking, cancellable) and emit its moveTo
    fn dispatch_next(&mut self) -> State {
        select! {
            recv(self.waypoints) -> msg => match msg {
                Ok(waypoint) => self.emit_move_to(waypoint),
                Err(_) => State::Idle,
            },
            recv(self.cancel) -> msg => match msg {
                // No leg in flight yet; stop pulling from the queue.
                Ok(()) => State::Idle,
                Err(_) => State::Idle,
            },
            default(POLL_INTERVAL) => State::Dispatching,
        }
    }

    fn emit_move_to(&mut self, waypoint: Waypoint) -> State {
        log::info!(
            "moveTo: lat={} lon={} alt={}",
            waypoint.latitude,
            waypoint.longitude,
            waypoint.altitude
        );
        let datagram = self.encoder.lock().command(&CommandArgs::MoveTo {
            latitude: waypoint.latitude,
            longitude: waypoint.longitude,
            altitude: waypoint.altitude,
            orientation_mode: OrientationMode::ToTarget,
            heading: 0.0,
        });
        if self.outbound.send(datagram).is_err() {
            return State::Idle;
        }
        // Reset the completion latch: fixes that arrived before this leg
        // must not confirm it.
        while self.completion.try_recv().is_ok() {}
        while self.status.try_recv().is_ok() {}
        State::AwaitingCompletion
    }

    fn await_completion(&mut self) -> State {
        let deadline = after(MOVE_TO_TIMEOUT);
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return State::AwaitingCompletion;
            }
            select! {
                recv(self.completion) -> msg => match msg {
                    Ok(fix) => {
                        log::info!(
                            "waypoint reached (position lat={} lon={})",
                            fix.latitude,
                            fix.longitude
                        );
                        return State::Dispatching;
                    }
                    Err(_) => return State::Idle,
                },
                recv(self.status) -> msg => match msg {
                    Ok(MoveToStatus::Done) => {
                        log::info!("moveTo reported done");
                        return State::Dispatching;
                    }
                    Ok(status) => {
                        log::debug!("moveTo status: {:?}", status);
                    }
                    Err(_) => return State::Idle,
                },
                recv(self.cancel) -> msg => match msg {
                    Ok(()) => return State::Cancelling,
                    Err(_) => return State::Idle,
                },
                recv(deadline) -> _ => {
                    log::warn!("{}", Error::MoveToTimeout);
                    return State::Dispatching;
                }
                default(POLL_INTERVAL) => {}
            }
        }
    }

    /// Halt the current leg. The queue is deliberately left untouched.
    fn cancel_current(&mut self) -> State {
        log::info!("cancelling current moveTo, route preserved");
        let datagram = self.encoder.lock().command(&CommandArgs::CancelMoveTo);
        if self.outbound.send(datagram).is_err() {
            return State::Idle;
        }
        // Collapse repeated cancel presses into one.
        while self.cancel.try_recv().is_ok() {}
        State::Idle
    }
}
