//! # Palisade API Server
//!
//! Actix-web composition root: wires configuration, telemetry, the rate
//! limiter, and the authorization cache, then serves the admin API.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::rate_limit::RateLimitMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = AppConfig::from_env();
    let state = AppState::new(&config).await;

    // Hold a handle for shutdown: the server factory closure consumes its
    // copy of the state.
    let limiter = state.rate_limiter.clone();

    tracing::info!(host = %config.host, port = config.port, "Starting API server");

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RateLimitMiddleware::new(state.rate_limiter.clone()))
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    // Release the remote rate-limit connection on the way out.
    limiter.close().await;

    Ok(())
}
