use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::questionnaire::Questionnaire;
use crate::domain::role::Role;
use crate::validator::{SessionValidator, ValidationOutcome};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    valid: bool,
    #[serde(default)]
    questionnaire: Option<Questionnaire>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsedRequest<'a> {
    session_id: &'a str,
}

/// Validator backed by the web service's session API.
pub struct HttpSessionValidator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSessionValidator {
    pub fn new(base_url: impl Into<String>) -> Result<Self, crate::error::AppError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| {
                crate::error::AppError::config(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl SessionValidator for HttpSessionValidator {
    async fn validate(&self, session_id: &str, token: &str, role: Role) -> ValidationOutcome {
        let url = format!("{}/api/session/validate", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("sessionId", session_id),
                ("token", token),
                ("role", role.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            Err(err) => {
                warn!(
                    session_id,
                    role = %role,
                    error = %err,
                    "[VALIDATOR] validate request failed"
                );
                return ValidationOutcome::invalid();
            }
        };

        if !response.status().is_success() {
            return ValidationOutcome::invalid();
        }

        match response.json::<ValidateResponse>().await {
            Ok(body) if body.valid => ValidationOutcome {
                valid: true,
                questionnaire: body.questionnaire,
            },
            Ok(_) => ValidationOutcome::invalid(),
            Err(err) => {
                warn!(
                    session_id,
                    role = %role,
                    error = %err,
                    "[VALIDATOR] validate response was not valid JSON"
                );
                ValidationOutcome::invalid()
            }
        }
    }

    async fn mark_used(&self, session_id: &str) {
        let url = format!("{}/api/session/used", self.base_url);
        let result = self
            .client
            .post(&url)
            .json(&UsedRequest { session_id })
            .send()
            .await;

        if let Err(err) = result {
            warn!(
                session_id,
                error = %err,
                "[VALIDATOR] mark_used notification failed"
            );
        }
    }
}
