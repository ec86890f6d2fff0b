use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::questionnaire::Questionnaire;
use crate::domain::role::Role;
use crate::validator::{SessionValidator, ValidationOutcome};

/// One issued session with its three role-scoped tokens.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session_id: String,
    pub player1_token: String,
    pub player2_token: String,
    pub tv_token: String,
    pub questionnaire: Questionnaire,
    pub used: bool,
}

impl SessionRecord {
    fn token_for(&self, role: Role) -> &str {
        match role {
            Role::Player1 => &self.player1_token,
            Role::Player2 => &self.player2_token,
            Role::Tv => &self.tv_token,
        }
    }
}

/// Process-scoped session store with an explicit lifecycle:
/// create, query by credentials, invalidate. Injected into the validator
/// rather than reached through ambient global state.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, record: SessionRecord) {
        self.sessions
            .lock()
            .insert(record.session_id.clone(), record);
    }

    /// Validate credentials against a stored session. A consumed session
    /// never validates again.
    pub fn query(&self, session_id: &str, token: &str, role: Role) -> Option<Questionnaire> {
        let sessions = self.sessions.lock();
        let record = sessions.get(session_id)?;
        if record.used || record.token_for(role) != token {
            return None;
        }
        Some(record.questionnaire.clone())
    }

    /// Mark a session consumed. Unknown ids are ignored.
    pub fn invalidate(&self, session_id: &str) {
        if let Some(record) = self.sessions.lock().get_mut(session_id) {
            record.used = true;
        }
    }

    pub fn is_used(&self, session_id: &str) -> Option<bool> {
        self.sessions.lock().get(session_id).map(|r| r.used)
    }
}

/// Validator over an in-process [`SessionStore`]. Used by tests and local
/// development, where the web service is not running.
pub struct InMemorySessionValidator {
    store: std::sync::Arc<SessionStore>,
}

impl InMemorySessionValidator {
    pub fn new(store: std::sync::Arc<SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionValidator for InMemorySessionValidator {
    async fn validate(&self, session_id: &str, token: &str, role: Role) -> ValidationOutcome {
        match self.store.query(session_id, token, role) {
            Some(questionnaire) => ValidationOutcome::valid_with(questionnaire),
            None => ValidationOutcome::invalid(),
        }
    }

    async fn mark_used(&self, session_id: &str) {
        self.store.invalidate(session_id);
    }
}
