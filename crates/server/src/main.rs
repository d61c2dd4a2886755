mod api;
mod auth;
mod bootstrap;
mod error;
mod health;

use anyhow::Result;
use cartwise_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use cartwise_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(event_name = "system.server.started", bind_address = %address, "cartwise-server listening");

    let router = axum::Router::new()
        .merge(health::router(app.db_pool.clone()))
        .nest("/v1", api::router(api::AppState::new(app.db_pool.clone(), app.classifier.clone())));

    let grace = std::time::Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let server = axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown());
    tokio::select! {
        result = server => { result?; }
        _ = async {
            wait_for_shutdown().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("graceful shutdown window elapsed; aborting in-flight requests");
        }
    }

    tracing::info!(event_name = "system.server.stopping", "cartwise-server stopping");
    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
