#![allow(dead_code)]

// tests/common/mod.rs
use std::sync::Arc;

use duet_server::config::GameConfig;
use duet_server::domain::questionnaire::Questionnaire;
use duet_server::state::app_state::AppState;
use duet_server::validator::{InMemorySessionValidator, SessionRecord, SessionStore};

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    duet_server::telemetry::init_test_logging();
}

pub const PLAYER1_TOKEN: &str = "p1-token";
pub const PLAYER2_TOKEN: &str = "p2-token";
pub const TV_TOKEN: &str = "tv-token";

pub fn test_questionnaire() -> Questionnaire {
    Questionnaire {
        partner1_name: "Dana".to_string(),
        partner2_name: "Noa".to_string(),
        how_long: "6 years".to_string(),
        how_met: "At a concert".to_string(),
        where_met: "Paris".to_string(),
    }
}

pub fn seeded_record(session_id: &str) -> SessionRecord {
    SessionRecord {
        session_id: session_id.to_string(),
        player1_token: PLAYER1_TOKEN.to_string(),
        player2_token: PLAYER2_TOKEN.to_string(),
        tv_token: TV_TOKEN.to_string(),
        questionnaire: test_questionnaire(),
        used: false,
    }
}

/// App state wired to an in-memory session store, returned alongside the
/// store so tests can seed and inspect sessions.
pub fn test_app_state() -> (AppState, Arc<SessionStore>) {
    let store = Arc::new(SessionStore::new());
    let validator = Arc::new(InMemorySessionValidator::new(store.clone()));
    let state = AppState::new(GameConfig::for_tests(), validator);
    (state, store)
}
