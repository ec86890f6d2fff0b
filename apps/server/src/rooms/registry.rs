use std::sync::Arc;

use actix::{Actor, Addr};
use dashmap::DashMap;

use crate::domain::questionnaire::Questionnaire;
use crate::domain::stage::StageRegistry;
use crate::rooms::room::{GameRoom, RoomTimings};
use crate::validator::SessionValidator;

/// All live rooms in this process, keyed by session id.
///
/// Rooms are created on the first successful join for a session and remove
/// themselves when their actor stops. Sessions are fully isolated: the only
/// state shared across rooms is this map and the read-only stage registry.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Addr<GameRoom>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the room for a session, creating and starting it if this is the
    /// session's first successful join.
    pub fn get_or_create(
        self: &Arc<Self>,
        session_id: &str,
        questionnaire: Questionnaire,
        stage_registry: &'static StageRegistry,
        timings: RoomTimings,
        validator: Arc<dyn SessionValidator>,
    ) -> Addr<GameRoom> {
        self.rooms
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let base_seed = rand::random::<u64>();
                GameRoom::new(
                    session_id,
                    questionnaire,
                    stage_registry,
                    base_seed,
                    timings,
                    validator,
                    Arc::clone(self),
                )
                .start()
            })
            .clone()
    }

    /// Called by a room when its actor stops.
    pub fn remove(&self, session_id: &str) {
        self.rooms.remove(session_id);
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.rooms.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
