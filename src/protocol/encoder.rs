//! Outbound frame construction with per-buffer sequencing.
//!
//! All locally originated frames funnel through one [`FrameEncoder`] so
//! that sequence numbers stay strictly monotonic per buffer across the
//! session. Workers share it behind a mutex; the critical section is a
//! counter bump plus a small buffer build.
//!
//! # Buffer policy
//!
//! Locally originated commands are classified by reliability:
//!
//! - buffer 10, `Data`: non-ack ARCommands, i.e. the periodic PCMD
//! - buffer 11, `DataWithAck`: setting and event ARCommands (takeoff,
//!   landing, moveTo, cancelMoveTo, ...)
//! - buffer 12, `DataWithAck`: emergency only
//!
//! Replies are not commands: acks travel on buffer 128+N of the frame they
//! acknowledge, pongs on the ping buffer they answer.

use super::command::CommandArgs;
use super::frame::{
    self, DataType, Frame, ACK_BUFFER_OFFSET, BUFFER_CMD_ACK, BUFFER_CMD_EMERGENCY,
    BUFFER_CMD_NO_ACK,
};
use super::sequencer::Sequencer;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Frame encoder shared by every worker that emits datagrams
pub type SharedEncoder = Arc<Mutex<FrameEncoder>>;

/// Builds outbound ARNetworkAL frames, owning the sequence counters
#[derive(Debug, Default)]
pub struct FrameEncoder {
    sequencer: Sequencer,
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedEncoder {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Encode a locally originated command as a complete datagram,
    /// choosing buffer and reliability class per the buffer policy.
    pub fn command(&mut self, args: &CommandArgs) -> Vec<u8> {
        let (buffer, data_type) = classify(args);
        let seq = self.sequencer.next(buffer);
        frame::encode_frame(data_type, buffer, seq, &args.encode())
    }

    /// Encode the ack for a received `DataWithAck` frame: Ack type, buffer
    /// 128 + the incoming buffer, payload = the incoming sequence number.
    pub fn ack(&mut self, incoming: &Frame<'_>) -> Vec<u8> {
        let buffer = ACK_BUFFER_OFFSET.wrapping_add(incoming.buffer_id);
        let seq = self.sequencer.next(buffer);
        frame::encode_frame(DataType::Ack, buffer, seq, &[incoming.sequence])
    }

    /// Encode the pong for a ping frame: Data type, same buffer, the
    /// received payload echoed verbatim.
    pub fn pong(&mut self, ping: &Frame<'_>) -> Vec<u8> {
        let seq = self.sequencer.next(ping.buffer_id);
        frame::encode_frame(DataType::Data, ping.buffer_id, seq, ping.payload)
    }

    /// Copy of the sequence counters, for diagnostics
    pub fn sequence_snapshot(&self) -> HashMap<u8, u8> {
        self.sequencer.snapshot()
    }
}

/// Reliability classification for locally originated commands
fn classify(args: &CommandArgs) -> (u8, DataType) {
    match args {
        CommandArgs::Pcmd { .. } => (BUFFER_CMD_NO_ACK, DataType::Data),
        CommandArgs::Emergency => (BUFFER_CMD_EMERGENCY, DataType::DataWithAck),
        _ => (BUFFER_CMD_ACK, DataType::DataWithAck),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::FrameCursor;

    #[test]
    fn test_takeoff_datagram() {
        let mut enc = FrameEncoder::new();
        let datagram = enc.command(&CommandArgs::TakeOff);

        // dataType=4, buffer=11, seq=0, size=11, payload 01 00 01 00
        assert_eq!(
            datagram,
            vec![0x04, 0x0B, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_buffer_policy() {
        let mut enc = FrameEncoder::new();

        let pcmd = enc.command(&CommandArgs::Pcmd {
            flag: 0,
            roll: 0,
            pitch: 0,
            yaw: 0,
            gaz: 0,
            timestamp_seq: 0,
        });
        assert_eq!(pcmd[0], DataType::Data as u8);
        assert_eq!(pcmd[1], BUFFER_CMD_NO_ACK);

        let emergency = enc.command(&CommandArgs::Emergency);
        assert_eq!(emergency[0], DataType::DataWithAck as u8);
        assert_eq!(emergency[1], BUFFER_CMD_EMERGENCY);

        let landing = enc.command(&CommandArgs::Landing);
        assert_eq!(landing[0], DataType::DataWithAck as u8);
        assert_eq!(landing[1], BUFFER_CMD_ACK);
    }

    #[test]
    fn test_ack_layout() {
        // Acknowledging "(hex) 04 0b 42 0b000000 12345678" must produce
        // "(hex) 01 8b <seq> 08000000 42".
        let packet = [0x04, 0x0B, 0x42, 0x0B, 0x00, 0x00, 0x00, 0x12, 0x34, 0x56, 0x78];
        let frame = FrameCursor::new(&packet).next().unwrap().unwrap();

        let mut enc = FrameEncoder::new();
        let ack = enc.ack(&frame);
        assert_eq!(ack, vec![0x01, 0x8B, 0x00, 0x08, 0x00, 0x00, 0x00, 0x42]);
    }

    #[test]
    fn test_pong_echoes_payload() {
        let packet = [0x02, 0x00, 0x7B, 0x08, 0x00, 0x00, 0x00, 0xAA];
        let frame = FrameCursor::new(&packet).next().unwrap().unwrap();

        let mut enc = FrameEncoder::new();
        let pong = enc.pong(&frame);
        assert_eq!(pong, vec![0x02, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0xAA]);
    }

    #[test]
    fn test_sequences_advance_per_buffer() {
        let mut enc = FrameEncoder::new();
        for expected in 0..4u8 {
            let datagram = enc.command(&CommandArgs::Landing);
            assert_eq!(datagram[2], expected);
        }
        // Buffer 10 has its own counter
        let pcmd = enc.command(&CommandArgs::Pcmd {
            flag: 0,
            roll: 0,
            pitch: 0,
            yaw: 0,
            gaz: 0,
            timestamp_seq: 0,
        });
        assert_eq!(pcmd[2], 0);

        let snap = enc.sequence_snapshot();
        assert_eq!(snap.get(&BUFFER_CMD_ACK), Some(&4));
        assert_eq!(snap.get(&BUFFER_CMD_NO_ACK), Some(&1));
    }
}
