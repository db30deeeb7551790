// src/routes/health.rs
//! Liveness check for the activity service.
//!
//! `GET /health` answers without touching the model, so orchestrators can
//! poll it cheaply. The gateway (`mod.rs`) merges this subrouter; nothing
//! outside `routes` knows about it.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

/// Handle `GET /health`.
///
/// Returns a static JSON object indicating the API is reachable. The model
/// is loaded before the server binds, so a reachable service always has one.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "MHEALTH activity service running",
    })
}

/// Create a subrouter containing the `/health` route.
///
/// This router is generic over the application state so it can merge cleanly
/// with the gateway router, regardless of the state type.
///
/// # Type Parameters
/// - `S`: Application state type shared by all routes in the gateway.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
