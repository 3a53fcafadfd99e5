//! Input action routing.
//!
//! Actions arrive on a channel from whatever drives the controller: a
//! keyboard reader, a gamepad, a mission script. The router owns the
//! piloting axis record: axis actions mutate it and feed the full PCMD
//! through the scheduler (never straight to the transport, which would
//! defeat the rate limit); navigation actions go to the waypoint executor;
//! everything else is encoded and queued for the writer directly.

use crate::pcmd::PcmdState;
use crate::protocol::{CommandArgs, SharedEncoder};
use crate::waypoint::Waypoint;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Abstract controller actions, decoupled from any input device
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    Takeoff,
    Landing,
    Emergency,
    FlatTrim,
    NavigateHome,
    MoveBy {
        dx: f32,
        dy: f32,
        dz: f32,
        dpsi: f32,
    },
    /// Start flying the queued route (one moveTo at a time)
    MoveTo,
    /// Halt the current moveTo leg; the queued route is preserved
    CancelMoveTo,
    StartPilotedPoi(Waypoint),
    StopPilotedPoi,
    CancelMoveBy,
    PcmdFlag,
    PcmdRollLeft,
    PcmdRollRight,
    PcmdPitchForward,
    PcmdPitchBackward,
    PcmdYawClockwise,
    PcmdYawCounterClockwise,
    PcmdGazInc,
    PcmdGazDec,
}

/// Channel ends the router forwards into
pub struct RouterOutputs {
    pub encoder: SharedEncoder,
    pub pcmd_tx: Sender<Vec<u8>>,
    pub outbound_tx: Sender<Vec<u8>>,
    pub execute_tx: Sender<()>,
    pub cancel_tx: Sender<()>,
}

/// Router loop: translate actions into encoded packets
pub fn router_loop(
    actions: Receiver<InputAction>,
    outputs: RouterOutputs,
    shutdown: Arc<AtomicBool>,
) {
    let mut pcmd = PcmdState::new();

    while !shutdown.load(Ordering::Relaxed) {
        match actions.recv_timeout(POLL_INTERVAL) {
            Ok(action) => handle_action(action, &mut pcmd, &outputs),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log::info!("Input router exiting");
}

fn handle_action(action: InputAction, pcmd: &mut PcmdState, outputs: &RouterOutputs) {
    use InputAction::*;

    log::debug!("input action: {:?}", action);
    match action {
        PcmdFlag => {
            pcmd.toggle_flag();
            push_pcmd(pcmd, outputs);
        }
        PcmdRollLeft => {
            pcmd.bump_roll(-1);
            push_pcmd(pcmd, outputs);
        }
        PcmdRollRight => {
            pcmd.bump_roll(1);
            push_pcmd(pcmd, outputs);
        }
        PcmdPitchForward => {
            pcmd.bump_pitch(1);
            push_pcmd(pcmd, outputs);
        }
        PcmdPitchBackward => {
            pcmd.bump_pitch(-1);
            push_pcmd(pcmd, outputs);
        }
        PcmdYawClockwise => {
            pcmd.bump_yaw(1);
            push_pcmd(pcmd, outputs);
        }
        PcmdYawCounterClockwise => {
            pcmd.bump_yaw(-1);
            push_pcmd(pcmd, outputs);
        }
        PcmdGazInc => {
            pcmd.bump_gaz(1);
            push_pcmd(pcmd, outputs);
        }
        PcmdGazDec => {
            pcmd.bump_gaz(-1);
            push_pcmd(pcmd, outputs);
        }

        MoveTo => {
            outputs.execute_tx.send(()).ok();
        }
        CancelMoveTo => {
            outputs.cancel_tx.send(()).ok();
        }

        Takeoff => send_command(&CommandArgs::TakeOff, outputs),
        Landing => send_command(&CommandArgs::Landing, outputs),
        Emergency => send_command(&CommandArgs::Emergency, outputs),
        FlatTrim => send_command(&CommandArgs::FlatTrim, outputs),
        NavigateHome => send_command(&CommandArgs::NavigateHome { start: 1 }, outputs),
        MoveBy { dx, dy, dz, dpsi } => {
            send_command(&CommandArgs::MoveBy { dx, dy, dz, dpsi }, outputs)
        }
        StartPilotedPoi(target) => send_command(
            &CommandArgs::StartPilotedPoi {
                latitude: target.latitude,
                longitude: target.longitude,
                altitude: target.altitude,
            },
            outputs,
        ),
        StopPilotedPoi => send_command(&CommandArgs::StopPilotedPoi, outputs),
        CancelMoveBy => send_command(&CommandArgs::CancelMoveBy, outputs),
    }
}

fn push_pcmd(pcmd: &mut PcmdState, outputs: &RouterOutputs) {
    let datagram = outputs.encoder.lock().command(&pcmd.to_command());
    outputs.pcmd_tx.send(datagram).ok();
}

fn send_command(args: &CommandArgs, outputs: &RouterOutputs) {
    let datagram = outputs.encoder.lock().command(args);
    outputs.outbound_tx.send(datagram).ok();
}
