use std::env;
use std::time::Duration;

use crate::error::AppError;

/// Server configuration, read from the environment at startup.
///
/// Environment variables must be set by the runtime environment (compose
/// env_file, or sourced manually for local dev). Everything has a local-dev
/// default except nothing: a misconfigured value fails startup with a
/// `Config` error rather than limping along.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Bind host for the HTTP/websocket listener.
    pub host: String,
    /// Bind port for the HTTP/websocket listener.
    pub port: u16,
    /// Base URL of the web service that owns sessions (the validator).
    pub web_base_url: String,
    /// Grace window granted to an unintentionally disconnected client.
    pub reconnect_window: Duration,
    /// Delay between the game ending and the room tearing itself down,
    /// so clients can read the final screen.
    pub end_teardown: Duration,
}

impl GameConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let host = env::var("GAME_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("GAME_PORT", 2567)?;
        let web_base_url = env::var("WEB_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let reconnect_window = Duration::from_secs(parse_var("RECONNECT_WINDOW_SECS", 60)?);
        let end_teardown = Duration::from_secs(parse_var("END_TEARDOWN_SECS", 30)?);

        Ok(Self {
            host,
            port,
            web_base_url,
            reconnect_window,
            end_teardown,
        })
    }

    /// Configuration for tests: no network defaults, short timers.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            web_base_url: "http://localhost:3000".to_string(),
            reconnect_window: Duration::from_millis(100),
            end_teardown: Duration::from_millis(100),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{name} must be a valid value, got: {raw}"))),
    }
}
