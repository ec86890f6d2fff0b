//! Room orchestration: one actor per live game session plus the
//! process-wide registry that owns their addresses.

pub mod registry;
pub mod room;

pub use registry::RoomRegistry;
pub use room::{
    Connect, Disconnect, GameRoom, Inbound, JoinAck, JoinRejection, RoomTimings, SessionEvent,
};
