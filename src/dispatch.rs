//! Inbound frame dispatcher.
//!
//! Walks every frame of every received UDP packet and, in order:
//!
//! 1. answers pings (buffers 0/1) with a pong echoing the payload,
//! 2. acks every `DataWithAck` frame on buffer 128+N with the received
//!    sequence number as payload,
//! 3. decodes the ARCommand payload; unknown commands are logged, never
//!    fatal, and have already been acked by step 2,
//! 4. routes decoded commands: position fixes confirm the waypoint
//!    executor's current leg, moveTo status reports feed its status hook,
//!    everything else goes to the observer for higher layers.
//!
//! Replies for a frame are enqueued before the walk advances to the next
//! frame of the same packet.

use crate::protocol::{decode_command, CommandArgs, Decoded, DataType, Frame, FrameCursor};
use crate::protocol::frame::{BUFFER_PING, BUFFER_PING_ALT};
use crate::protocol::{MoveToStatus, SharedEncoder};
use crate::waypoint::Waypoint;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Routes inbound frames; separate from the worker loop so packet
/// handling is testable without sockets or threads.
pub struct Dispatcher {
    encoder: SharedEncoder,
    outbound_tx: Sender<Vec<u8>>,
    /// Valid position fixes, confirming the executor's current leg
    completion_tx: Sender<Waypoint>,
    /// moveToChanged reports for the executor's status hook
    status_tx: Sender<MoveToStatus>,
    /// Decoded inbound commands for logging/UI
    observer_tx: Option<Sender<CommandArgs>>,
}

impl Dispatcher {
    pub fn new(
        encoder: SharedEncoder,
        outbound_tx: Sender<Vec<u8>>,
        completion_tx: Sender<Waypoint>,
        status_tx: Sender<MoveToStatus>,
        observer_tx: Option<Sender<CommandArgs>>,
    ) -> Self {
        Self {
            encoder,
            outbound_tx,
            completion_tx,
            status_tx,
            observer_tx,
        }
    }

    /// Walk all frames of one UDP packet
    pub fn handle_packet(&mut self, packet: &[u8]) {
        for item in FrameCursor::new(packet) {
            match item {
                Ok(frame) => self.handle_frame(&frame),
                Err(e) => log::warn!("frame skipped: {}", e),
            }
        }
    }

    fn handle_frame(&mut self, frame: &Frame<'_>) {
        // Ping channels: echo back and do not interpret further.
        if frame.buffer_id == BUFFER_PING || frame.buffer_id == BUFFER_PING_ALT {
            let pong = self.encoder.lock().pong(frame);
            self.outbound_tx.send(pong).ok();
            return;
        }

        if frame.data_type == DataType::DataWithAck {
            let ack = self.encoder.lock().ack(frame);
            self.outbound_tx.send(ack).ok();
        }

        match decode_command(frame.payload) {
            Ok(Decoded::Known(args)) => self.route(args),
            Ok(Decoded::Unknown { id, raw }) => {
                log::debug!(
                    "unknown command project={} class={} command={} ({} arg bytes)",
                    id.project,
                    id.class,
                    id.command,
                    raw.len()
                );
            }
            Err(e) => log::warn!("command skipped: {}", e),
        }
    }

    fn route(&mut self, args: CommandArgs) {
        match args {
            CommandArgs::PositionChanged {
                latitude,
                longitude,
                altitude,
            } => match Waypoint::from_fix(latitude, longitude, altitude) {
                Some(fix) => {
                    self.completion_tx.send(fix).ok();
                }
                None => log::trace!("position report without GPS fix"),
            },
            CommandArgs::MoveToChanged { status, .. } => {
                self.status_tx.send(status).ok();
            }
            other => {
                if let Some(observer) = &self.observer_tx {
                    observer.send(other).ok();
                }
            }
        }
    }
}

/// Worker loop feeding the dispatcher from the reader's packet queue
pub fn dispatcher_loop(
    mut dispatcher: Dispatcher,
    packets_rx: Receiver<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match packets_rx.recv_timeout(POLL_INTERVAL) {
            Ok(packet) => dispatcher.handle_packet(&packet),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    log::info!("Dispatcher exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{encode_frame, ACK_BUFFER_OFFSET};
    use crate::protocol::FrameEncoder;
    use crossbeam_channel::unbounded;

    struct Harness {
        dispatcher: Dispatcher,
        outbound_rx: Receiver<Vec<u8>>,
        completion_rx: Receiver<Waypoint>,
        status_rx: Receiver<MoveToStatus>,
        observer_rx: Receiver<CommandArgs>,
    }

    fn harness() -> Harness {
        let (outbound_tx, outbound_rx) = unbounded();
        let (completion_tx, completion_rx) = unbounded();
        let (status_tx, status_rx) = unbounded();
        let (observer_tx, observer_rx) = unbounded();
        Harness {
            dispatcher: Dispatcher::new(
                FrameEncoder::shared(),
                outbound_tx,
                completion_tx,
                status_tx,
                Some(observer_tx),
            ),
            outbound_rx,
            completion_rx,
            status_rx,
            observer_rx,
        }
    }

    #[test]
    fn test_ping_gets_exactly_one_pong() {
        let mut h = harness();
        // dataType=2, buffer=0, seq=0x7B, size=8, payload AA
        h.dispatcher
            .handle_packet(&[0x02, 0x00, 0x7B, 0x08, 0x00, 0x00, 0x00, 0xAA]);

        let pong = h.outbound_rx.try_recv().unwrap();
        assert_eq!(pong, vec![0x02, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0xAA]);
        assert!(h.outbound_rx.try_recv().is_err());
        // Pings are not interpreted as commands
        assert!(h.observer_rx.try_recv().is_err());
    }

    #[test]
    fn test_data_with_ack_gets_exactly_one_ack() {
        let mut h = harness();
        h.dispatcher.handle_packet(&[
            0x04, 0x0B, 0x42, 0x0B, 0x00, 0x00, 0x00, 0x12, 0x34, 0x56, 0x78,
        ]);

        let ack = h.outbound_rx.try_recv().unwrap();
        assert_eq!(ack, vec![0x01, 0x8B, 0x00, 0x08, 0x00, 0x00, 0x00, 0x42]);
        assert!(h.outbound_rx.try_recv().is_err());
    }

    #[test]
    fn test_unknown_command_is_still_acked() {
        let mut h = harness();
        // DataWithAck frame whose payload names a nonexistent project
        let packet = encode_frame(DataType::DataWithAck, 126, 9, &[0xEE, 0x00, 0x63, 0x00]);
        h.dispatcher.handle_packet(&packet);

        let ack = h.outbound_rx.try_recv().unwrap();
        assert_eq!(ack[1], ACK_BUFFER_OFFSET + 126);
        assert_eq!(ack[7], 9);
        assert!(h.observer_rx.try_recv().is_err());
    }

    #[test]
    fn test_position_fix_routes_to_completion() {
        let mut h = harness();
        let payload = CommandArgs::PositionChanged {
            latitude: 59.9,
            longitude: 10.7,
            altitude: 30.0,
        }
        .encode();
        h.dispatcher
            .handle_packet(&encode_frame(DataType::Data, 127, 1, &payload));

        let fix = h.completion_rx.try_recv().unwrap();
        assert_eq!(fix.latitude, 59.9);
        // Routed to the executor, not the observer
        assert!(h.observer_rx.try_recv().is_err());
    }

    #[test]
    fn test_sentinel_position_is_dropped() {
        let mut h = harness();
        let payload = CommandArgs::PositionChanged {
            latitude: 500.0,
            longitude: 500.0,
            altitude: 500.0,
        }
        .encode();
        h.dispatcher
            .handle_packet(&encode_frame(DataType::Data, 127, 1, &payload));

        assert!(h.completion_rx.try_recv().is_err());
    }

    #[test]
    fn test_move_to_status_routes_to_hook() {
        let mut h = harness();
        let payload = CommandArgs::MoveToChanged {
            latitude: 59.9,
            longitude: 10.7,
            altitude: 30.0,
            orientation_mode: crate::protocol::command::OrientationMode::ToTarget,
            heading: 0.0,
            status: MoveToStatus::Done,
        }
        .encode();
        h.dispatcher
            .handle_packet(&encode_frame(DataType::Data, 127, 2, &payload));

        assert_eq!(h.status_rx.try_recv().unwrap(), MoveToStatus::Done);
    }

    #[test]
    fn test_other_commands_reach_observer() {
        let mut h = harness();
        let payload = CommandArgs::BatteryStateChanged { percent: 87 }.encode();
        h.dispatcher
            .handle_packet(&encode_frame(DataType::Data, 127, 3, &payload));

        assert_eq!(
            h.observer_rx.try_recv().unwrap(),
            CommandArgs::BatteryStateChanged { percent: 87 }
        );
    }

    #[test]
    fn test_replies_keep_packet_order() {
        let mut h = harness();
        // One packet: ping frame followed by an ack-requesting frame
        let mut packet = encode_frame(DataType::Data, 0, 5, &[0x11]);
        packet.extend(encode_frame(
            DataType::DataWithAck,
            11,
            6,
            &CommandArgs::BatteryStateChanged { percent: 50 }.encode(),
        ));
        h.dispatcher.handle_packet(&packet);

        let first = h.outbound_rx.try_recv().unwrap();
        let second = h.outbound_rx.try_recv().unwrap();
        assert_eq!(first[0], DataType::Data as u8, "pong must be enqueued first");
        assert_eq!(second[0], DataType::Ack as u8);
    }
}
