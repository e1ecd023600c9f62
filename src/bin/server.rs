//! Standalone HTTP server for the lectern engine.
//!
//! Configuration comes from the environment; see [`lectern::config`].
//! `BIND_ADDR` overrides the default listen address of `0.0.0.0:8000`.

use std::error::Error;

use lectern::config::Settings;
use lectern::server::{AppState, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::from_env();
    init_tracing(&settings);

    let state = AppState::from_settings(&settings);
    let app = router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, environment = %settings.environment, "lectern server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` wins when set; otherwise the configured level applies to
/// this crate only.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lectern={}", settings.log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
