//! Wire protocol: ARNetworkAL framing (layer 1) and ARCommands (layer 2)

pub mod command;
pub mod encoder;
pub mod frame;
pub mod sequencer;

pub use command::{decode_command, CommandArgs, CommandId, Decoded, MoveToStatus};
pub use encoder::{FrameEncoder, SharedEncoder};
pub use frame::{DataType, Frame, FrameCursor};
