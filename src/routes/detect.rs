// src/routes/detect.rs
//! Activity detection endpoint.
//!
//! `POST /detect` takes a multipart upload with a `file` part holding an
//! MHEALTH `.log` file and answers with the prediction summary for it. All
//! input problems are answered with `400` and a `detail` message; the shared
//! model state is only ever read.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{predict_from_log, DetectError, DetectResponse, ModelState};

// ---

/// Required suffix of uploaded file names.
const LOG_SUFFIX: &str = ".log";

const FILE_FIELD: &str = "file";

pub fn router() -> Router<Arc<ModelState>> {
    // ---
    Router::new().route("/detect", post(handler))
}

async fn handler(State(state): State<Arc<ModelState>>, multipart: Multipart) -> Response {
    // ---
    let request_id = Uuid::new_v4();
    info!("POST /detect [{}] - Starting pipeline", request_id);

    // Step 1: Pull the upload out of the form
    let (filename, bytes) = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("POST /detect [{}] - Rejected upload: {}", request_id, e);
            return e.into_response();
        }
    };
    debug!(
        "POST /detect [{}] - Received '{}' ({} bytes)",
        request_id,
        filename,
        bytes.len()
    );

    // Step 2: Parse, scale, classify and summarize off the async workers
    let result = tokio::task::spawn_blocking(move || predict_from_log(&state, &bytes)).await;

    match result {
        Ok(Ok(summary)) => {
            info!(
                "POST /detect [{}] - {} rows, dominant activity {}",
                request_id, summary.rows_evaluated, summary.predicted_activity_id
            );
            (StatusCode::OK, Json(DetectResponse { filename, summary })).into_response()
        }
        Ok(Err(e)) => {
            warn!("POST /detect [{}] - Invalid log '{}': {}", request_id, filename, e);
            e.into_response()
        }
        Err(e) => {
            error!("POST /detect [{}] - Prediction task failed: {}", request_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Prediction failed"),
            )
                .into_response()
        }
    }
}

/// Find the `file` part, check its name and read its content.
///
/// The name is checked before the body is read so a wrong upload is
/// rejected without buffering it.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), DetectError> {
    // ---
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DetectError::Upload(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        check_filename(&filename)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| DetectError::Upload(e.body_text()))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(DetectError::MissingFile)
}

fn check_filename(filename: &str) -> Result<(), DetectError> {
    // ---
    if filename.ends_with(LOG_SUFFIX) {
        Ok(())
    } else {
        Err(DetectError::Filename {
            filename: filename.to_string(),
            expected: LOG_SUFFIX,
        })
    }
}
