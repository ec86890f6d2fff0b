use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use duet_server::config::GameConfig;
use duet_server::middleware::cors::cors_middleware;
use duet_server::routes;
use duet_server::state::app_state::AppState;
use duet_server::telemetry;
use duet_server::validator::HttpSessionValidator;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: via compose env_file
    // - Local dev: source env files manually (e.g., set -a; . ./.env; set +a)
    let config = match GameConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let validator = match HttpSessionValidator::new(config.web_base_url.clone()) {
        Ok(validator) => Arc::new(validator),
        Err(e) => {
            eprintln!("❌ Failed to build session validator: {e}");
            std::process::exit(1);
        }
    };

    let host = config.host.clone();
    let port = config.port;
    println!("🚀 Starting Duet game server on http://{}:{}", host, port);

    let data = web::Data::new(AppState::new(config, validator));

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
