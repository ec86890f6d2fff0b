//! Domain layer: pure orchestration logic, no I/O.

pub mod history;
pub mod phase;
pub mod questionnaire;
pub mod role;
pub mod room_core;
pub mod seeds;
pub mod stage;
pub mod synced_state;

#[cfg(test)]
mod tests_props_room;
#[cfg(test)]
mod tests_room_core;
#[cfg(test)]
pub(crate) mod test_stages;

// Re-exports for ergonomics
pub use history::{HistoryEntry, HistoryLog};
pub use phase::GamePhase;
pub use questionnaire::Questionnaire;
pub use role::Role;
pub use room_core::{RoomCore, RoomEffect, RosterSnapshot, READY_SIGNAL};
pub use seeds::derive_stage_seed;
pub use stage::{Stage, StageRegistry, DEFAULT_INTERIM_TITLE};
pub use synced_state::{SyncedState, STAGE_ENDED, STAGE_LOBBY};
