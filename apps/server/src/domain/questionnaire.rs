use serde::{Deserialize, Serialize};

/// Free-text personalization data collected before the session starts.
///
/// Snapshot is copied into the room at creation and immutable during play;
/// stages read it for display text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Questionnaire {
    pub partner1_name: String,
    pub partner2_name: String,
    pub how_long: String,
    pub how_met: String,
    pub where_met: String,
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self {
            partner1_name: "Partner 1".to_string(),
            partner2_name: "Partner 2".to_string(),
            how_long: String::new(),
            how_met: String::new(),
            where_met: String::new(),
        }
    }
}

impl Questionnaire {
    /// Display name for a player role. Viewers have no name; callers should
    /// not ask for one.
    pub fn name_for(&self, role: crate::domain::Role) -> &str {
        match role {
            crate::domain::Role::Player1 => &self.partner1_name,
            crate::domain::Role::Player2 => &self.partner2_name,
            crate::domain::Role::Tv => "",
        }
    }
}
