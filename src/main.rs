//! Fraud Scoring Service - Main Entry Point
//!
//! Loads the schema and model artifacts once, then serves the transaction
//! form and the predict endpoint until interrupted.

use anyhow::{Context, Result};
use fraud_scoring::{
    config::AppConfig, handlers::AppState, model::inference::InferenceEngine,
    schema::FeatureSchema, server::create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging (RUST_LOG wins over the configured level)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "fraud_scoring={}",
                    config.logging.level
                ))
            }),
        )
        .init();

    info!("Starting Fraud Scoring Service");

    // Load artifacts: the ordered column schema, then the classifier,
    // probed once against the schema width before any request is served.
    let schema = FeatureSchema::load(&config.artifacts.columns_path)
        .context("Failed to load schema artifact")?;
    info!(columns = schema.len(), "Feature schema ready");

    let engine =
        InferenceEngine::new(&config, &schema).context("Failed to initialize inference engine")?;
    info!(model = %engine.model_name(), "Inference engine ready");

    let state = Arc::new(AppState::new(schema, engine));
    let router = create_router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Serving form on / and predictions on /api/predict");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Print final summary
    info!("Shutting down...");
    state.metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal");
}
