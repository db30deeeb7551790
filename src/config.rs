//! Configuration loader for the `mhealth-activity` service and trainer.
//!
//! Both binaries read their settings from environment variables (a `.env`
//! file is loaded by the caller first). Every `env::var` lookup lives here,
//! with its default next to it.
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::forest::ForestParams;

/// Parse an optional numeric environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional numeric environment variable with no default.
macro_rules! parse_env_opt {
    ($var_name:expr, $ty:ty) => {
        env::var($var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
    };
}

/// Read a string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Default location of the scaler and forest artifacts.
pub const DEFAULT_MODEL_DIR: &str = "ml";

/// Public MHEALTH dataset archive.
pub const DEFAULT_DATA_URL: &str = "https://archive.ics.uci.edu/static/public/319/mhealth+dataset.zip";

/// Strongly typed service configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Directory holding `scaler.bin` and `rf_model.bin`.
    pub model_dir: PathBuf,

    /// TCP port the HTTP server binds on all interfaces.
    pub port: u16,

    /// Largest accepted request body for uploads, in bytes.
    pub max_upload_bytes: usize,
}

/// Load service configuration from environment variables with defaults.
///
/// Optional:
/// - `MODEL_DIR` – artifact directory (default: `ml`)
/// - `PORT` – listen port (default: 8080)
/// - `MAX_UPLOAD_BYTES` – upload size cap (default: 64 MiB)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let model_dir = PathBuf::from(env_or!("MODEL_DIR", DEFAULT_MODEL_DIR));
    let port = parse_env!("PORT", u16, 8080);
    let max_upload_bytes = parse_env!("MAX_UPLOAD_BYTES", usize, 64 * 1024 * 1024);

    Ok(Config {
        model_dir,
        port,
        max_upload_bytes,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  MODEL_DIR        : {}", self.model_dir.display());
        tracing::info!("  PORT             : {}", self.port);
        tracing::info!("  MAX_UPLOAD_BYTES : {}", self.max_upload_bytes);
    }
}

/// Configuration for the offline `train-model` binary.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    // ---
    /// Dataset archive URL, fetched only when the raw data is absent.
    pub data_url: String,

    /// Directory the archive is extracted into.
    pub data_dir: PathBuf,

    /// Output directory for artifacts.
    pub model_dir: PathBuf,

    /// Held-out share of rows for evaluation, in percent.
    pub test_split_percent: u32,

    pub forest: ForestParams,
}

/// Load trainer configuration from environment variables with defaults.
///
/// Optional:
/// - `MHEALTH_DATA_URL` – dataset archive (default: UCI archive)
/// - `DATA_DIR` – extraction directory (default: `data`)
/// - `MODEL_DIR` – artifact directory (default: `ml`)
/// - `TEST_SPLIT_PERCENT` – held-out share (default: 30)
/// - `RF_N_ESTIMATORS` – trees in the forest (default: 100)
/// - `RF_MAX_DEPTH` – depth limit (default: unlimited)
/// - `RF_MIN_SAMPLES_SPLIT` – smallest splittable node (default: 2)
/// - `RF_SEED` – RNG seed for split and forest (default: 42)
pub fn load_train_from_env() -> Result<TrainConfig> {
    // ---
    let defaults = ForestParams::default();

    let test_split_percent = parse_env!("TEST_SPLIT_PERCENT", u32, 30);
    if !(1..100).contains(&test_split_percent) {
        return Err(anyhow!(
            "Invalid TEST_SPLIT_PERCENT: {} (must be 1..=99)",
            test_split_percent
        ));
    }

    let forest = ForestParams {
        n_estimators: parse_env!("RF_N_ESTIMATORS", usize, defaults.n_estimators),
        max_depth: parse_env_opt!("RF_MAX_DEPTH", usize),
        min_samples_split: parse_env!("RF_MIN_SAMPLES_SPLIT", usize, defaults.min_samples_split),
        max_features: defaults.max_features,
        seed: parse_env!("RF_SEED", u64, defaults.seed),
    };
    if forest.n_estimators == 0 {
        return Err(anyhow!("Invalid RF_N_ESTIMATORS: must be at least 1"));
    }

    Ok(TrainConfig {
        data_url: env_or!("MHEALTH_DATA_URL", DEFAULT_DATA_URL),
        data_dir: PathBuf::from(env_or!("DATA_DIR", "data")),
        model_dir: PathBuf::from(env_or!("MODEL_DIR", DEFAULT_MODEL_DIR)),
        test_split_percent,
        forest,
    })
}

impl TrainConfig {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Training configuration loaded:");
        tracing::info!("  MHEALTH_DATA_URL     : {}", self.data_url);
        tracing::info!("  DATA_DIR             : {}", self.data_dir.display());
        tracing::info!("  MODEL_DIR            : {}", self.model_dir.display());
        tracing::info!("  TEST_SPLIT_PERCENT   : {}", self.test_split_percent);
        tracing::info!("  RF_N_ESTIMATORS      : {}", self.forest.n_estimators);
        tracing::info!("  RF_MAX_DEPTH         : {:?}", self.forest.max_depth);
        tracing::info!("  RF_MIN_SAMPLES_SPLIT : {}", self.forest.min_samples_split);
        tracing::info!("  RF_SEED              : {}", self.forest.seed);
    }
}
