use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One completed stage's outcome. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub stage_index: u32,
    pub payload: Value,
}

/// Append-only record of completed stages, ordered by completion time.
///
/// The orchestrator appends and re-serializes; it never interprets entries.
/// Stages construct their own summaries.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, stage_index: u32, payload: Value) {
        self.entries.push(HistoryEntry {
            stage_index,
            payload,
        });
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialized form mirrored into the synchronized state.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }
}
