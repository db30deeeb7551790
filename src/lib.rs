//! Activity recognition over MHEALTH wearable sensor logs.
//!
//! The crate is the library behind two binaries:
//! - `mhealth-activity`: the HTTP service that classifies uploaded logs
//! - `train-model`: the offline job that fits and persists the model
//!
//! Serving path: [`parser`] → [`features`] → [`scaler`] → [`forest`] →
//! [`summary`], orchestrated by [`pipeline::predict_from_log`] over a
//! [`ModelState`] loaded once at startup.
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP): sibling
//! modules reach each other through the re-exports below rather than deep
//! paths, so moving code between modules only touches this gateway.

pub mod activity;
pub mod config;
pub mod error;
pub mod features;
pub mod forest;
pub mod metrics;
pub mod model;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod routes;
pub mod scaler;
pub mod schema;
pub mod summary;
pub mod telemetry;
pub mod training;

pub use config::{Config, TrainConfig};
pub use error::{ArtifactLoadError, DetectError};
pub use model::ModelState;
pub use models::{DetectResponse, PredictionSummary, SensorLog, SensorRecord};
pub use pipeline::predict_from_log;
