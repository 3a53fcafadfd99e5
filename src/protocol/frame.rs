//! ARNetworkAL frame codec (transport framing, layer 1)
//!
//! Every UDP datagram exchanged with the drone is a concatenation of one or
//! more ARNetworkAL frames:
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬───────────────────┬───────────────┐
//! │ dataType │ bufferID │ seq      │ size              │ payload       │
//! │ 1 byte   │ 1 byte   │ 1 byte   │ 4 bytes, LE u32   │ size−7 bytes  │
//! └──────────┴──────────┴──────────┴───────────────────┴───────────────┘
//! ```
//!
//! `size` counts the 7-byte header. Example: the ack frame
//! `01 8B 01 08000000 42` is 8 bytes total with a single payload byte.
//!
//! ## Buffers
//!
//! The buffer ID selects a logical channel with its own reliability class
//! and sequence counter:
//!
//! - `[0; 9]`: reserved for ARNetwork internal use (0/1 are the ping
//!   channels; every frame received there is echoed back as a pong)
//! - `[10; 127]`: data buffers
//! - `[128; 255]`: acknowledge buffers (the ack for buffer N travels on
//!   buffer 128+N)

use crate::error::{Error, Result};

/// ARNetworkAL header length in bytes
pub const HEADER_LEN: usize = 7;

/// First ping channel (buffer 0)
pub const BUFFER_PING: u8 = 0;
/// Second ping channel (buffer 1)
pub const BUFFER_PING_ALT: u8 = 1;
/// Non-ack ARCommands, including the periodic PCMD
pub const BUFFER_CMD_NO_ACK: u8 = 10;
/// Ack-requesting ARCommands (events, settings, navigation)
pub const BUFFER_CMD_ACK: u8 = 11;
/// Emergency command buffer
pub const BUFFER_CMD_EMERGENCY: u8 = 12;
/// Ack for data buffer N travels on buffer N + 128
pub const ACK_BUFFER_OFFSET: u8 = 128;

/// ARNetworkAL frame reliability classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    /// Acknowledgment of previously received data
    Ack = 1,
    /// Normal data, no ack requested
    Data = 2,
    /// Treated as normal data on the network, higher priority internally
    LowLatency = 3,
    /// Data requesting an ack; the receiver must reply
    DataWithAck = 4,
}

impl DataType {
    /// Map a wire byte to a data type
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            1 => Some(DataType::Ack),
            2 => Some(DataType::Data),
            3 => Some(DataType::LowLatency),
            4 => Some(DataType::DataWithAck),
            _ => None,
        }
    }
}

/// A decoded ARNetworkAL frame, borrowing its payload from the packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    pub data_type: DataType,
    pub buffer_id: u8,
    pub sequence: u8,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Decode one frame at `pos` in `packet`.
    ///
    /// Returns the frame and the cursor position of the next frame. Callers
    /// walking a whole packet should prefer [`FrameCursor`], which also
    /// handles the end-of-packet condition.
    pub fn decode_at(packet: &'a [u8], pos: usize) -> Result<(Frame<'a>, usize)> {
        let remaining = packet.len().saturating_sub(pos);
        if remaining < HEADER_LEN {
            return Err(Error::TruncatedHeader { remaining });
        }

        let size = u32::from_le_bytes([
            packet[pos + 3],
            packet[pos + 4],
            packet[pos + 5],
            packet[pos + 6],
        ]);
        if (size as usize) < HEADER_LEN || size as usize > remaining {
            return Err(Error::TruncatedFrame { size, remaining });
        }

        let data_type = DataType::from_wire(packet[pos])
            .ok_or(Error::InvalidDataType(packet[pos]))?;

        let frame = Frame {
            data_type,
            buffer_id: packet[pos + 1],
            sequence: packet[pos + 2],
            payload: &packet[pos + HEADER_LEN..pos + size as usize],
        };

        Ok((frame, pos + size as usize))
    }

    /// Re-encode this frame to its wire representation
    pub fn encode(&self) -> Vec<u8> {
        encode_frame(self.data_type, self.buffer_id, self.sequence, self.payload)
    }
}

/// Build the wire bytes for a frame: 7-byte header followed by the payload
pub fn encode_frame(data_type: DataType, buffer_id: u8, sequence: u8, payload: &[u8]) -> Vec<u8> {
    let size = (HEADER_LEN + payload.len()) as u32;
    let mut out = Vec::with_capacity(size as usize);
    out.push(data_type as u8);
    out.push(buffer_id);
    out.push(sequence);
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Iterator over the frames of one UDP packet.
///
/// Yields each frame in order, advancing by the frame's declared size. The
/// walk ends when fewer than 7 bytes remain. A frame with an unknown data
/// type is reported as an error but the walk continues at the next frame;
/// a truncated size field ends the walk since the remainder of the packet
/// cannot be trusted.
pub struct FrameCursor<'a> {
    packet: &'a [u8],
    pos: usize,
    poisoned: bool,
}

impl<'a> FrameCursor<'a> {
    pub fn new(packet: &'a [u8]) -> Self {
        Self {
            packet,
            pos: 0,
            poisoned: false,
        }
    }
}

impl<'a> Iterator for FrameCursor<'a> {
    type Item = Result<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        let remaining = self.packet.len().saturating_sub(self.pos);
        if remaining < HEADER_LEN {
            if self.pos == 0 && remaining > 0 {
                // A packet too short to hold even one header is malformed;
                // trailing slack after at least one frame is end-of-packet.
                self.poisoned = true;
                return Some(Err(Error::TruncatedHeader { remaining }));
            }
            return None;
        }

        match Frame::decode_at(self.packet, self.pos) {
            Ok((frame, next)) => {
                self.pos = next;
                Some(Ok(frame))
            }
            Err(err @ Error::InvalidDataType(_)) => {
                // Size field was valid, so the next frame is still reachable.
                let size = u32::from_le_bytes([
                    self.packet[self.pos + 3],
                    self.packet[self.pos + 4],
                    self.packet[self.pos + 5],
                    self.packet[self.pos + 6],
                ]);
                self.pos += size as usize;
                Some(Err(err))
            }
            Err(err) => {
                self.poisoned = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ping_frame() {
        // dataType=2, buffer=0, seq=0x7B, size=8, one payload byte 0xAA
        let packet = [0x02, 0x00, 0x7B, 0x08, 0x00, 0x00, 0x00, 0xAA];
        let (frame, next) = Frame::decode_at(&packet, 0).unwrap();

        assert_eq!(frame.data_type, DataType::Data);
        assert_eq!(frame.buffer_id, 0);
        assert_eq!(frame.sequence, 0x7B);
        assert_eq!(frame.payload, &[0xAA]);
        assert_eq!(next, 8);
    }

    #[test]
    fn test_encode_roundtrip() {
        let packet = [0x04, 0x0B, 0x42, 0x0B, 0x00, 0x00, 0x00, 0x12, 0x34, 0x56, 0x78];
        let (frame, _) = Frame::decode_at(&packet, 0).unwrap();
        assert_eq!(frame.encode(), packet);
    }

    #[test]
    fn test_cursor_walks_multi_frame_packet() {
        let mut packet = encode_frame(DataType::Data, 127, 8, &[0x01, 0x02]);
        packet.extend(encode_frame(DataType::DataWithAck, 126, 9, &[0x03]));
        packet.extend(encode_frame(DataType::Ack, 0xBA, 0x27, &[0x42]));

        let frames: Vec<_> = FrameCursor::new(&packet)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].buffer_id, 127);
        assert_eq!(frames[1].data_type, DataType::DataWithAck);
        assert_eq!(frames[2].payload, &[0x42]);

        // Property: the concatenated sizes cover the whole packet, and each
        // frame re-encodes to its original byte range.
        let rebuilt: Vec<u8> = frames.iter().flat_map(|f| f.encode()).collect();
        assert_eq!(rebuilt, packet);
    }

    #[test]
    fn test_cursor_ignores_trailing_slack() {
        let mut packet = encode_frame(DataType::Data, 10, 0, &[0xFF]);
        packet.extend_from_slice(&[0x00, 0x00, 0x00]); // < 7 bytes left

        let frames: Vec<_> = FrameCursor::new(&packet).collect();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_ok());
    }

    #[test]
    fn test_truncated_header() {
        let packet = [0x02, 0x00, 0x01];
        assert!(matches!(
            Frame::decode_at(&packet, 0),
            Err(Error::TruncatedHeader { remaining: 3 })
        ));

        let errors: Vec<_> = FrameCursor::new(&packet).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_err());
    }

    #[test]
    fn test_truncated_frame() {
        // Declares 32 bytes but only 8 are present
        let packet = [0x02, 0x00, 0x01, 0x20, 0x00, 0x00, 0x00, 0xAA];
        assert!(matches!(
            Frame::decode_at(&packet, 0),
            Err(Error::TruncatedFrame { size: 32, .. })
        ));
    }

    #[test]
    fn test_size_below_header_rejected() {
        let packet = [0x02, 0x00, 0x01, 0x03, 0x00, 0x00, 0x00, 0xAA];
        assert!(matches!(
            Frame::decode_at(&packet, 0),
            Err(Error::TruncatedFrame { size: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_data_type_skips_frame_only() {
        let mut packet = encode_frame(DataType::Data, 10, 0, &[0x01]);
        packet[0] = 0x09; // not a known data type
        packet.extend(encode_frame(DataType::Data, 11, 1, &[0x02]));

        let items: Vec<_> = FrameCursor::new(&packet).collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(Error::InvalidDataType(0x09))));
        assert_eq!(items[1].as_ref().unwrap().buffer_id, 11);
    }
}
