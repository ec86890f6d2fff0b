use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::role::Role;
use crate::domain::synced_state::SyncedState;

/// Inbound message envelope. `type` is the only field the orchestrator
/// interprets (the ready signal); everything else is stage-defined.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMsg {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub data: Value,
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Join acknowledged; the first state broadcast follows immediately.
    Connected { role: Role },

    /// Full synchronized state, pushed on join and on every mutation.
    State { state: SyncedState },

    Error { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    RoleTaken,
    RoomClosed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RoleTaken => "role_taken",
            ErrorCode::RoomClosed => "room_closed",
        }
    }
}
