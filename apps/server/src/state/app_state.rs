use std::sync::Arc;

use crate::config::GameConfig;
use crate::rooms::RoomRegistry;
use crate::validator::SessionValidator;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    config: GameConfig,
    validator: Arc<dyn SessionValidator>,
    rooms: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(config: GameConfig, validator: Arc<dyn SessionValidator>) -> Self {
        Self {
            config,
            validator,
            rooms: Arc::new(RoomRegistry::new()),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn validator(&self) -> Arc<dyn SessionValidator> {
        self.validator.clone()
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }
}
