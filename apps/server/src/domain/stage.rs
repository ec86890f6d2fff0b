use serde_json::Value;

use crate::domain::role::Role;
use crate::domain::room_core::RoomCore;

/// Title used for the ready screen when the target stage supplies none.
pub const DEFAULT_INTERIM_TITLE: &str = "Get ready for the next stage!";

/// One mini-game in the fixed ordered sequence.
///
/// The orchestrator knows nothing about a stage's rules: it selects the
/// active stage solely by `currentStageIndex`, hands it every inbound
/// message while the game is `IN_PROGRESS`, and otherwise only observes the
/// opaque payload blob the stage maintains inside the synchronized state.
pub trait Stage: Send + Sync {
    /// 1-based position in the stage sequence.
    fn stage_index(&self) -> u32;

    /// Called exactly once per stage activation. Must install a fresh
    /// initial payload and set the display texts; nothing from a previous
    /// stage's payload survives into this one.
    fn on_enter(&self, room: &mut RoomCore);

    /// Handle one inbound message while this stage is active.
    ///
    /// Must validate the sender's role before mutating the payload. Returns
    /// `false` when the message type is not recognized by this stage; the
    /// orchestrator drops such messages silently, since late or stray
    /// messages are expected noise. A stage signals completion by calling
    /// [`RoomCore::advance_to_interim`] or [`RoomCore::advance_to_end`],
    /// never via the return value.
    fn on_message(&self, room: &mut RoomCore, sender: Role, msg_type: &str, data: &Value) -> bool;

    /// Text for the "get ready" screen leading into this stage.
    fn interim_title(&self) -> Option<&str> {
        None
    }
}

/// Static ordered list of stages, read-only after process start.
pub struct StageRegistry {
    stages: Vec<Box<dyn Stage>>,
}

impl StageRegistry {
    /// Build a registry, enforcing exhaustiveness up front: stage indices
    /// must be exactly `1..=n` in order. Lookup can then never observe a
    /// gap or duplicate.
    pub fn build(stages: Vec<Box<dyn Stage>>) -> Result<Self, String> {
        if stages.is_empty() {
            return Err("stage registry must contain at least one stage".to_string());
        }
        for (slot, stage) in stages.iter().enumerate() {
            let expected = (slot + 1) as u32;
            if stage.stage_index() != expected {
                return Err(format!(
                    "stage registry slot {slot} holds stage index {}, expected {expected}",
                    stage.stage_index()
                ));
            }
        }
        Ok(Self { stages })
    }

    pub fn get(&self, index: u32) -> Option<&dyn Stage> {
        if index == 0 {
            return None;
        }
        self.stages.get((index - 1) as usize).map(|b| b.as_ref())
    }

    pub fn count(&self) -> u32 {
        self.stages.len() as u32
    }

    /// Ready-screen title for the stage at `index`, falling back to the
    /// generic default when the stage is absent or supplies none.
    pub fn interim_title_for(&self, index: u32) -> &str {
        self.get(index)
            .and_then(|stage| stage.interim_title())
            .unwrap_or(DEFAULT_INTERIM_TITLE)
    }
}
