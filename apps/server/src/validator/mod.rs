//! Session validation against the web service that owns sessions.
//!
//! The game server never mints or stores sessions; it asks the session
//! authority whether a (session, token, role) triple is valid at join time
//! and reports the session as consumed when the game ends.

pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::domain::questionnaire::Questionnaire;
use crate::domain::role::Role;

pub use http::HttpSessionValidator;
pub use memory::{InMemorySessionValidator, SessionRecord, SessionStore};

/// Result of a join-time credential check.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub questionnaire: Option<Questionnaire>,
}

impl ValidationOutcome {
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn valid_with(questionnaire: Questionnaire) -> Self {
        Self {
            valid: true,
            questionnaire: Some(questionnaire),
        }
    }
}

/// Boundary to the external session authority.
///
/// `validate` never fails loudly: transport or parse problems degrade to an
/// invalid outcome so a flaky authority looks like a bad link to the client,
/// not a crash. `mark_used` is best-effort fire-and-forget.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, session_id: &str, token: &str, role: Role) -> ValidationOutcome;

    async fn mark_used(&self, session_id: &str);
}
