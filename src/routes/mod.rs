use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};

use crate::ModelState;

mod detect;
mod health;

// ---

pub fn router(state: Arc<ModelState>, max_upload_bytes: usize) -> Router {
    // ---
    Router::new()
        .merge(detect::router())
        .merge(health::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
