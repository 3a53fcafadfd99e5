//! Piloting command (PCMD) state and rate-limiting scheduler.
//!
//! The drone only processes so many commands per second; flooding it
//! with stick updates starves the ack-requesting buffers. All PCMD
//! packets therefore pass through a single-slot scheduler that forwards at
//! most one packet per 50 ms tick and coalesces anything faster: only the
//! latest stick position is worth sending, a backlog of stale positions is
//! not.

use crate::protocol::CommandArgs;
use crossbeam_channel::{select, tick, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scheduler period: bounds the PCMD rate at 20 Hz
pub const PCMD_INTERVAL: Duration = Duration::from_millis(50);

/// Per-keypress change applied to an axis
const AXIS_STEP: i16 = 1;

/// Current piloting axes. Owned and mutated by the input router only;
/// every axis is clamped to [-100, 100] at assignment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PcmdState {
    flag: u8,
    roll: i8,
    pitch: i8,
    yaw: i8,
    gaz: i8,
    timestamp_seq: u32,
}

fn clamp_axis(value: i16) -> i8 {
    value.clamp(-100, 100) as i8
}

impl PcmdState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the roll/pitch consideration flag
    pub fn toggle_flag(&mut self) {
        self.flag = if self.flag == 0 { 1 } else { 0 };
    }

    pub fn bump_roll(&mut self, direction: i16) {
        self.roll = clamp_axis(self.roll as i16 + direction * AXIS_STEP);
    }

    pub fn bump_pitch(&mut self, direction: i16) {
        self.pitch = clamp_axis(self.pitch as i16 + direction * AXIS_STEP);
    }

    pub fn bump_yaw(&mut self, direction: i16) {
        self.yaw = clamp_axis(self.yaw as i16 + direction * AXIS_STEP);
    }

    pub fn bump_gaz(&mut self, direction: i16) {
        self.gaz = clamp_axis(self.gaz as i16 + direction * AXIS_STEP);
    }

    /// Snapshot the current axes as a full PCMD command, advancing the
    /// packet sequence stamp.
    pub fn to_command(&mut self) -> CommandArgs {
        self.timestamp_seq = self.timestamp_seq.wrapping_add(1);
        CommandArgs::Pcmd {
            flag: self.flag,
            roll: self.roll,
            pitch: self.pitch,
            yaw: self.yaw,
            gaz: self.gaz,
            timestamp_seq: self.timestamp_seq,
        }
    }
}

/// Scheduler loop: forwards the most recent pending PCMD packet to the
/// outbound queue on each tick, dropping anything it superseded.
pub fn scheduler_loop(
    pcmd_rx: Receiver<Vec<u8>>,
    outbound_tx: Sender<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
) {
    let ticker = tick(PCMD_INTERVAL);
    let mut pending: Option<Vec<u8>> = None;

    while !shutdown.load(Ordering::Relaxed) {
        select! {
            recv(ticker) -> _ => {
                if let Some(packet) = pending.take() {
                    if outbound_tx.send(packet).is_err() {
                        break;
                    }
                }
            }
            recv(pcmd_rx) -> msg => match msg {
                Ok(packet) => {
                    if pending.replace(packet).is_some() {
                        log::trace!("PCMD coalesced: superseded before tick");
                    }
                }
                Err(_) => break,
            },
        }
    }

    log::info!("PCMD scheduler exiting");
}
