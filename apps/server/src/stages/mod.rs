//! The stage sequence: four mini-games behind the polymorphic [`Stage`]
//! contract. Stage payloads are serde structs serialized into the opaque
//! `stagePayloadJson` blob; only the owning stage deserializes them.

pub mod date_puzzle;
pub mod he_said_she_said;
pub mod word_match;
pub mod zoom_map;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::domain::room_core::RoomCore;
use crate::domain::stage::{Stage, StageRegistry};

use date_puzzle::DatePuzzle;
use he_said_she_said::HeSaidSheSaid;
use word_match::WordMatch;
use zoom_map::ZoomMap;

/// The production stage sequence. Built once; exhaustiveness (contiguous
/// 1-based indices) is checked at build time, so a misconfigured sequence
/// fails at startup rather than mid-session.
pub fn registry() -> &'static StageRegistry {
    static REGISTRY: Lazy<StageRegistry> = Lazy::new(|| {
        StageRegistry::build(vec![
            Box::new(HeSaidSheSaid),
            Box::new(DatePuzzle),
            Box::new(WordMatch),
            Box::new(ZoomMap),
        ])
        .expect("stage registry misconfigured")
    });
    &REGISTRY
}

/// Deserialize the active stage payload, falling back to the stage's
/// initial value when the blob is empty or malformed.
pub(crate) fn read_payload<T: DeserializeOwned + Default>(room: &RoomCore) -> T {
    let raw = room.stage_payload_json();
    if raw.is_empty() {
        return T::default();
    }
    serde_json::from_str(raw).unwrap_or_default()
}

/// Serialize and install a stage payload.
pub(crate) fn write_payload<T: Serialize>(room: &mut RoomCore, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => room.set_stage_payload(json),
        Err(err) => warn!(error = %err, "[STAGE] failed to serialize stage payload"),
    }
}
