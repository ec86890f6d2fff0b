//! Websocket transport: the wire protocol and the per-connection session
//! actor bridging a client to its room.

pub mod protocol;
pub mod session;

pub use protocol::{ClientMsg, ErrorCode, ServerMsg};
pub use session::{join, WsSession};
