#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod domain;
pub mod error;
pub mod health;
pub mod middleware;
pub mod rooms;
pub mod routes;
pub mod stages;
pub mod state;
pub mod telemetry;
pub mod validator;
pub mod ws;

// Re-exports for public API
pub use config::GameConfig;
pub use error::AppError;
pub use middleware::cors::cors_middleware;
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    telemetry::init_test_logging();
}
