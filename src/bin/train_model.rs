//! Offline trainer for the `mhealth-activity` service.
//!
//! Downloads the MHEALTH dataset when it is not already on disk, fits the
//! feature scaler and random forest, reports hold-out accuracy and F1, and
//! writes `scaler.bin` / `rf_model.bin` into `MODEL_DIR` for the service to
//! load at startup. See [`mhealth_activity::config::load_train_from_env`]
//! for the environment variables it reads.
use anyhow::Result;
use dotenvy::dotenv;

use mhealth_activity::{config, telemetry, training};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init_tracing();

    let cfg = config::load_train_from_env()?;
    cfg.log_config();

    let report = training::run(&cfg).await?;

    tracing::info!(
        "Rows: {} total, {} train, {} test",
        report.rows_total,
        report.rows_train,
        report.rows_test
    );
    tracing::info!(
        "[RESULTS] Accuracy: {:.3} | F1: {:.3}",
        report.accuracy,
        report.f1_weighted
    );
    tracing::info!("Models saved in {}", report.model_dir.display());

    Ok(())
}
