//! ARCommands codec (typed command payloads, layer 2)
//!
//! An ARCommand payload starts with a 4-byte identifier of project (1 byte),
//! class (1 byte), command (2 bytes, little-endian), followed by the
//! command's argument record. Arguments are fixed ordered scalars emitted
//! in declaration order, little-endian; enumerations use their underlying
//! integer width; strings are NUL-terminated.
//!
//! The command registry is the [`CommandArgs`] sum type: each variant knows
//! its identifier and argument layout, [`decode_command`] maps an inbound
//! identifier to the matching variant constructor, and unknown identifiers
//! come back as [`Decoded::Unknown`], which is not an error, since the frame that
//! carried them must still be acked.

use crate::error::{Error, Result};

pub const PROJECT_COMMON: u8 = 0;
pub const PROJECT_ARDRONE3: u8 = 1;

// Project 1 (ardrone3) classes
const CLASS_PILOTING: u8 = 0;
const CLASS_PILOTING_STATE: u8 = 4;

// Project 0 (common) classes
const CLASS_COMMON: u8 = 4;
const CLASS_COMMON_STATE: u8 = 5;

// ardrone3.Piloting commands
const CMD_FLAT_TRIM: u16 = 0;
const CMD_TAKEOFF: u16 = 1;
const CMD_PCMD: u16 = 2;
const CMD_LANDING: u16 = 3;
const CMD_EMERGENCY: u16 = 4;
const CMD_NAVIGATE_HOME: u16 = 5;
const CMD_MOVE_BY: u16 = 7;
const CMD_MOVE_TO: u16 = 10;
const CMD_CANCEL_MOVE_TO: u16 = 11;
const CMD_START_PILOTED_POI: u16 = 12;
const CMD_STOP_PILOTED_POI: u16 = 13;
const CMD_CANCEL_MOVE_BY: u16 = 14;

// ardrone3.PilotingState commands
const CMD_FLYING_STATE_CHANGED: u16 = 1;
const CMD_POSITION_CHANGED: u16 = 4;
const CMD_SPEED_CHANGED: u16 = 5;
const CMD_ATTITUDE_CHANGED: u16 = 6;
const CMD_ALTITUDE_CHANGED: u16 = 8;
const CMD_MOVE_TO_CHANGED: u16 = 12;

// common.Common commands
const CMD_ALL_STATES: u16 = 0;
const CMD_CURRENT_DATE: u16 = 1;
const CMD_CURRENT_TIME: u16 = 2;

// common.CommonState commands
const CMD_BATTERY_STATE_CHANGED: u16 = 1;

/// Identifies a command kind: (project, class, command)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId {
    pub project: u8,
    pub class: u8,
    pub command: u16,
}

impl CommandId {
    pub const fn new(project: u8, class: u8, command: u16) -> Self {
        Self {
            project,
            class,
            command,
        }
    }
}

/// Orientation mode of a moveTo, u32 on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OrientationMode {
    /// Keep the current orientation
    None = 0,
    /// Turn towards the target before moving
    ToTarget = 1,
    /// Turn to the given heading before moving
    HeadingStart = 2,
    /// Turn to the given heading while moving
    HeadingDuring = 3,
}

impl OrientationMode {
    fn from_wire(value: u32) -> Result<Self> {
        match value {
            0 => Ok(OrientationMode::None),
            1 => Ok(OrientationMode::ToTarget),
            2 => Ok(OrientationMode::HeadingStart),
            3 => Ok(OrientationMode::HeadingDuring),
            other => Err(Error::DecodeArg(format!(
                "unknown orientation mode {}",
                other
            ))),
        }
    }
}

/// Status of a moveTo, reported by PilotingState.moveToChanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MoveToStatus {
    /// The drone is flying towards the target
    Running = 0,
    /// The target was reached
    Done = 1,
    /// Interrupted by a CancelMoveTo
    Canceled = 2,
    /// Aborted by the drone
    Error = 3,
}

impl MoveToStatus {
    fn from_wire(value: u32) -> Result<Self> {
        match value {
            0 => Ok(MoveToStatus::Running),
            1 => Ok(MoveToStatus::Done),
            2 => Ok(MoveToStatus::Canceled),
            3 => Ok(MoveToStatus::Error),
            other => Err(Error::DecodeArg(format!("unknown moveTo status {}", other))),
        }
    }
}

/// Flying state reported by PilotingState.flyingStateChanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FlyingState {
    Landed = 0,
    TakingOff = 1,
    Hovering = 2,
    Flying = 3,
    Landing = 4,
    Emergency = 5,
    UserTakeOff = 6,
}

impl FlyingState {
    fn from_wire(value: u32) -> Result<Self> {
        match value {
            0 => Ok(FlyingState::Landed),
            1 => Ok(FlyingState::TakingOff),
            2 => Ok(FlyingState::Hovering),
            3 => Ok(FlyingState::Flying),
            4 => Ok(FlyingState::Landing),
            5 => Ok(FlyingState::Emergency),
            6 => Ok(FlyingState::UserTakeOff),
            other => Err(Error::DecodeArg(format!("unknown flying state {}", other))),
        }
    }
}

/// Typed argument records for every command the engine understands.
///
/// Controller-to-drone commands come first, then the drone state events,
/// then the common project. Each variant's fields appear in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArgs {
    // ardrone3.Piloting, controller to drone
    FlatTrim,
    TakeOff,
    Pcmd {
        flag: u8,
        roll: i8,
        pitch: i8,
        yaw: i8,
        gaz: i8,
        timestamp_seq: u32,
    },
    Landing,
    Emergency,
    NavigateHome {
        start: u8,
    },
    MoveBy {
        dx: f32,
        dy: f32,
        dz: f32,
        dpsi: f32,
    },
    MoveTo {
        latitude: f64,
        longitude: f64,
        altitude: f64,
        orientation_mode: OrientationMode,
        heading: f32,
    },
    CancelMoveTo,
    StartPilotedPoi {
        latitude: f64,
        longitude: f64,
        altitude: f64,
    },
    StopPilotedPoi,
    CancelMoveBy,

    // ardrone3.PilotingState, drone to controller
    FlyingStateChanged {
        state: FlyingState,
    },
    PositionChanged {
        latitude: f64,
        longitude: f64,
        altitude: f64,
    },
    SpeedChanged {
        speed_x: f32,
        speed_y: f32,
        speed_z: f32,
    },
    AttitudeChanged {
        roll: f32,
        pitch: f32,
        yaw: f32,
    },
    AltitudeChanged {
        altitude: f64,
    },
    MoveToChanged {
        latitude: f64,
        longitude: f64,
        altitude: f64,
        orientation_mode: OrientationMode,
        heading: f32,
        status: MoveToStatus,
    },

    // common.Common / common.CommonState
    AllStates,
    CurrentDate {
        date: String,
    },
    CurrentTime {
        time: String,
    },
    BatteryStateChanged {
        percent: u8,
    },
}

impl CommandArgs {
    /// The (project, class, command) identifier of this command
    pub fn id(&self) -> CommandId {
        use CommandArgs::*;
        match self {
            FlatTrim => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_FLAT_TRIM),
            TakeOff => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_TAKEOFF),
            Pcmd { .. } => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_PCMD),
            Landing => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_LANDING),
            Emergency => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_EMERGENCY),
            NavigateHome { .. } => {
                CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_NAVIGATE_HOME)
            }
            MoveBy { .. } => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_MOVE_BY),
            MoveTo { .. } => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_MOVE_TO),
            CancelMoveTo => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_CANCEL_MOVE_TO),
            StartPilotedPoi { .. } => {
                CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_START_PILOTED_POI)
            }
            StopPilotedPoi => {
                CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_STOP_PILOTED_POI)
            }
            CancelMoveBy => CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING, CMD_CANCEL_MOVE_BY),

            FlyingStateChanged { .. } => CommandId::new(
                PROJECT_ARDRONE3,
                CLASS_PILOTING_STATE,
                CMD_FLYING_STATE_CHANGED,
            ),
            PositionChanged { .. } => {
                CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_POSITION_CHANGED)
            }
            SpeedChanged { .. } => {
                CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_SPEED_CHANGED)
            }
            AttitudeChanged { .. } => {
                CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_ATTITUDE_CHANGED)
            }
            AltitudeChanged { .. } => {
                CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_ALTITUDE_CHANGED)
            }
            MoveToChanged { .. } => {
                CommandId::new(PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_MOVE_TO_CHANGED)
            }

            AllStates => CommandId::new(PROJECT_COMMON, CLASS_COMMON, CMD_ALL_STATES),
            CurrentDate { .. } => CommandId::new(PROJECT_COMMON, CLASS_COMMON, CMD_CURRENT_DATE),
            CurrentTime { .. } => CommandId::new(PROJECT_COMMON, CLASS_COMMON, CMD_CURRENT_TIME),
            BatteryStateChanged { .. } => CommandId::new(
                PROJECT_COMMON,
                CLASS_COMMON_STATE,
                CMD_BATTERY_STATE_CHANGED,
            ),
        }
    }

    /// Encode the full command payload: identifier followed by arguments
    pub fn encode(&self) -> Vec<u8> {
        let id = self.id();
        let mut out = Vec::with_capacity(16);
        out.push(id.project);
        out.push(id.class);
        out.extend_from_slice(&id.command.to_le_bytes());
        self.write_args(&mut out);
        out
    }

    fn write_args(&self, out: &mut Vec<u8>) {
        use CommandArgs::*;
        match self {
            FlatTrim | TakeOff | Landing | Emergency | CancelMoveTo | StopPilotedPoi
            | CancelMoveBy | AllStates => {}
            Pcmd {
                flag,
                roll,
                pitch,
                yaw,
                gaz,
                timestamp_seq,
            } => {
                out.push(*flag);
                out.push(*roll as u8);
                out.push(*pitch as u8);
                out.push(*yaw as u8);
                out.push(*gaz as u8);
                out.extend_from_slice(&timestamp_seq.to_le_bytes());
            }
            NavigateHome { start } => out.push(*start),
            MoveBy { dx, dy, dz, dpsi } => {
                out.extend_from_slice(&dx.to_le_bytes());
                out.extend_from_slice(&dy.to_le_bytes());
                out.extend_from_slice(&dz.to_le_bytes());
                out.extend_from_slice(&dpsi.to_le_bytes());
            }
            MoveTo {
                latitude,
                longitude,
                altitude,
                orientation_mode,
                heading,
            } => {
                out.extend_from_slice(&latitude.to_le_bytes());
                out.extend_from_slice(&longitude.to_le_bytes());
                out.extend_from_slice(&altitude.to_le_bytes());
                out.extend_from_slice(&(*orientation_mode as u32).to_le_bytes());
                out.extend_from_slice(&heading.to_le_bytes());
            }
            StartPilotedPoi {
                latitude,
                longitude,
                altitude,
            } => {
                out.extend_from_slice(&latitude.to_le_bytes());
                out.extend_from_slice(&longitude.to_le_bytes());
                out.extend_from_slice(&altitude.to_le_bytes());
            }
            FlyingStateChanged { state } => {
                out.extend_from_slice(&(*state as u32).to_le_bytes());
            }
            PositionChanged {
                latitude,
                longitude,
                altitude,
            } => {
                out.extend_from_slice(&latitude.to_le_bytes());
                out.extend_from_slice(&longitude.to_le_bytes());
                out.extend_from_slice(&altitude.to_le_bytes());
            }
            SpeedChanged {
                speed_x,
                speed_y,
                speed_z,
            } => {
                out.extend_from_slice(&speed_x.to_le_bytes());
                out.extend_from_slice(&speed_y.to_le_bytes());
                out.extend_from_slice(&speed_z.to_le_bytes());
            }
            AttitudeChanged { roll, pitch, yaw } => {
                out.extend_from_slice(&roll.to_le_bytes());
                out.extend_from_slice(&pitch.to_le_bytes());
                out.extend_from_slice(&yaw.to_le_bytes());
            }
            AltitudeChanged { altitude } => {
                out.extend_from_slice(&altitude.to_le_bytes());
            }
            MoveToChanged {
                latitude,
                longitude,
                altitude,
                orientation_mode,
                heading,
                status,
            } => {
                out.extend_from_slice(&latitude.to_le_bytes());
                out.extend_from_slice(&longitude.to_le_bytes());
                out.extend_from_slice(&altitude.to_le_bytes());
                out.extend_from_slice(&(*orientation_mode as u32).to_le_bytes());
                out.extend_from_slice(&heading.to_le_bytes());
                out.extend_from_slice(&(*status as u32).to_le_bytes());
            }
            CurrentDate { date } => write_string(out, date),
            CurrentTime { time } => write_string(out, time),
            BatteryStateChanged { percent } => out.push(*percent),
        }
    }
}

fn write_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(value.as_bytes());
    out.push(0);
}

/// Outcome of decoding an inbound command payload
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A command the registry knows, with its typed arguments
    Known(CommandArgs),
    /// A command outside the registry. Not fatal: the carrying frame is
    /// still acked; the raw argument bytes are kept for diagnostics.
    Unknown { id: CommandId, raw: Vec<u8> },
}

/// Decode an inbound command payload (identifier + argument record)
pub fn decode_command(payload: &[u8]) -> Result<Decoded> {
    if payload.len() < 4 {
        return Err(Error::DecodeArg(format!(
            "command payload too short: {} bytes",
            payload.len()
        )));
    }

    let id = CommandId::new(
        payload[0],
        payload[1],
        u16::from_le_bytes([payload[2], payload[3]]),
    );
    let mut args = ArgReader::new(&payload[4..]);

    let known = match (id.project, id.class, id.command) {
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_FLAT_TRIM) => CommandArgs::FlatTrim,
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_TAKEOFF) => CommandArgs::TakeOff,
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_PCMD) => CommandArgs::Pcmd {
            flag: args.read_u8()?,
            roll: args.read_i8()?,
            pitch: args.read_i8()?,
            yaw: args.read_i8()?,
            gaz: args.read_i8()?,
            timestamp_seq: args.read_u32()?,
        },
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_LANDING) => CommandArgs::Landing,
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_EMERGENCY) => CommandArgs::Emergency,
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_NAVIGATE_HOME) => CommandArgs::NavigateHome {
            start: args.read_u8()?,
        },
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_MOVE_BY) => CommandArgs::MoveBy {
            dx: args.read_f32()?,
            dy: args.read_f32()?,
            dz: args.read_f32()?,
            dpsi: args.read_f32()?,
        },
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_MOVE_TO) => CommandArgs::MoveTo {
            latitude: args.read_f64()?,
            longitude: args.read_f64()?,
            altitude: args.read_f64()?,
            orientation_mode: OrientationMode::from_wire(args.read_u32()?)?,
            heading: args.read_f32()?,
        },
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_CANCEL_MOVE_TO) => CommandArgs::CancelMoveTo,
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_START_PILOTED_POI) => CommandArgs::StartPilotedPoi {
            latitude: args.read_f64()?,
            longitude: args.read_f64()?,
            altitude: args.read_f64()?,
        },
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_STOP_PILOTED_POI) => CommandArgs::StopPilotedPoi,
        (PROJECT_ARDRONE3, CLASS_PILOTING, CMD_CANCEL_MOVE_BY) => CommandArgs::CancelMoveBy,

        (PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_FLYING_STATE_CHANGED) => {
            CommandArgs::FlyingStateChanged {
                state: FlyingState::from_wire(args.read_u32()?)?,
            }
        }
        (PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_POSITION_CHANGED) => {
            CommandArgs::PositionChanged {
                latitude: args.read_f64()?,
                longitude: args.read_f64()?,
                altitude: args.read_f64()?,
            }
        }
        (PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_SPEED_CHANGED) => CommandArgs::SpeedChanged {
            speed_x: args.read_f32()?,
            speed_y: args.read_f32()?,
            speed_z: args.read_f32()?,
        },
        (PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_ATTITUDE_CHANGED) => {
            CommandArgs::AttitudeChanged {
                roll: args.read_f32()?,
                pitch: args.read_f32()?,
                yaw: args.read_f32()?,
            }
        }
        (PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_ALTITUDE_CHANGED) => {
            CommandArgs::AltitudeChanged {
                altitude: args.read_f64()?,
            }
        }
        (PROJECT_ARDRONE3, CLASS_PILOTING_STATE, CMD_MOVE_TO_CHANGED) => {
            CommandArgs::MoveToChanged {
                latitude: args.read_f64()?,
                longitude: args.read_f64()?,
                altitude: args.read_f64()?,
                orientation_mode: OrientationMode::from_wire(args.read_u32()?)?,
                heading: args.read_f32()?,
                status: MoveToStatus::from_wire(args.read_u32()?)?,
            }
        }

        (PROJECT_COMMON, CLASS_COMMON, CMD_ALL_STATES) => CommandArgs::AllStates,
        (PROJECT_COMMON, CLASS_COMMON, CMD_CURRENT_DATE) => CommandArgs::CurrentDate {
            date: args.read_string()?,
        },
        (PROJECT_COMMON, CLASS_COMMON, CMD_CURRENT_TIME) => CommandArgs::CurrentTime {
            time: args.read_string()?,
        },
        (PROJECT_COMMON, CLASS_COMMON_STATE, CMD_BATTERY_STATE_CHANGED) => {
            CommandArgs::BatteryStateChanged {
                percent: args.read_u8()?,
            }
        }

        _ => {
            return Ok(Decoded::Unknown {
                id,
                raw: payload[4..].to_vec(),
            });
        }
    };

    Ok(Decoded::Known(known))
}

/// Little-endian cursor over an argument record
struct ArgReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ArgReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.data.len() - self.pos < n {
            return Err(Error::DecodeArg(format!(
                "argument record too short: need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.data.len() - self.pos
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_f32(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_f64(&mut self) -> Result<f64> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a NUL-terminated string
    fn read_string(&mut self) -> Result<String> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::DecodeArg("unterminated string argument".to_string()))?;
        self.pos += end + 1;
        Ok(String::from_utf8_lossy(&rest[..end]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takeoff_encoding() {
        // project=1, class=0, command=0x0001 LE, no argument bytes
        assert_eq!(CommandArgs::TakeOff.encode(), vec![0x01, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_pcmd_encoding() {
        let pcmd = CommandArgs::Pcmd {
            flag: 1,
            roll: -100,
            pitch: 2,
            yaw: -3,
            gaz: 100,
            timestamp_seq: 0x01020304,
        };
        assert_eq!(
            pcmd.encode(),
            vec![
                0x01, 0x00, 0x02, 0x00, // id
                0x01, 0x9C, 0x02, 0xFD, 0x64, // flag + axes (two's complement)
                0x04, 0x03, 0x02, 0x01, // timestamp, little-endian
            ]
        );
    }

    #[test]
    fn test_move_to_roundtrip() {
        let cmd = CommandArgs::MoveTo {
            latitude: 59.9342,
            longitude: 10.7181,
            altitude: 30.0,
            orientation_mode: OrientationMode::ToTarget,
            heading: 0.0,
        };
        let payload = cmd.encode();
        assert_eq!(payload.len(), 4 + 8 + 8 + 8 + 4 + 4);
        assert_eq!(decode_command(&payload).unwrap(), Decoded::Known(cmd));
    }

    #[test]
    fn test_position_changed_roundtrip() {
        let cmd = CommandArgs::PositionChanged {
            latitude: -33.8688,
            longitude: 151.2093,
            altitude: 12.5,
        };
        let payload = cmd.encode();
        assert_eq!(decode_command(&payload).unwrap(), Decoded::Known(cmd));
    }

    #[test]
    fn test_string_argument_is_nul_terminated() {
        let cmd = CommandArgs::CurrentDate {
            date: "2016-04-29".to_string(),
        };
        let payload = cmd.encode();
        assert_eq!(payload.last(), Some(&0u8));
        assert_eq!(decode_command(&payload).unwrap(), Decoded::Known(cmd));
    }

    #[test]
    fn test_unknown_command_is_not_an_error() {
        // project 130 does not exist; the raw args must be preserved
        let payload = vec![0x82, 0x07, 0x2A, 0x00, 0xDE, 0xAD];
        match decode_command(&payload).unwrap() {
            Decoded::Unknown { id, raw } => {
                assert_eq!(id, CommandId::new(0x82, 0x07, 0x2A));
                assert_eq!(raw, vec![0xDE, 0xAD]);
            }
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_short_argument_record() {
        // moveTo with only 4 argument bytes
        let payload = vec![0x01, 0x00, 0x0A, 0x00, 0x01, 0x02, 0x03, 0x04];
        assert!(matches!(
            decode_command(&payload),
            Err(Error::DecodeArg(_))
        ));
    }

    #[test]
    fn test_move_to_changed_status() {
        let cmd = CommandArgs::MoveToChanged {
            latitude: 48.8789,
            longitude: 2.3679,
            altitude: 20.0,
            orientation_mode: OrientationMode::None,
            heading: 0.0,
            status: MoveToStatus::Done,
        };
        let payload = cmd.encode();
        match decode_command(&payload).unwrap() {
            Decoded::Known(CommandArgs::MoveToChanged { status, .. }) => {
                assert_eq!(status, MoveToStatus::Done);
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_bad_enum_value_rejected() {
        let mut payload = CommandArgs::FlyingStateChanged {
            state: FlyingState::Hovering,
        }
        .encode();
        payload[4] = 99;
        assert!(matches!(
            decode_command(&payload),
            Err(Error::DecodeArg(_))
        ));
    }
}
