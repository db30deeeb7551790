//! Application entry point for the `mhealth-activity` service.
//!
//! This binary orchestrates the full startup sequence for the activity
//! recognition API, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Loading the fitted scaler and forest artifacts (fatal if missing)
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `MODEL_DIR` (optional) – artifact directory (default: `ml`)
//! - `PORT` (optional) – listen port (default: 8080)
//! - `MAX_UPLOAD_BYTES` (optional) – upload size cap (default: 64 MiB)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use dotenvy::dotenv;

use mhealth_activity::{config, routes, telemetry, ModelState};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Loading model artifacts from {}", cfg.model_dir.display());

    // No degraded mode: the service does not start without a model
    let state = ModelState::load(&cfg.model_dir).with_context(|| {
        format!(
            "Failed to load model from '{}'; run `train-model` first",
            cfg.model_dir.display()
        )
    })?;

    tracing::info!("Model trained at {} loaded", state.trained_at);

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(Arc::new(state), cfg.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
