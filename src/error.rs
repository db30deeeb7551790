//! Error types for the detection pipeline and model artifacts.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::schema::N_COLUMNS;

// ---

/// Request-scoped failures. Everything but [`DetectError::Inference`] maps to
/// `400 Bad Request`.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Uploaded filename does not carry the log suffix.
    #[error("File must have a {expected} extension, got '{filename}'")]
    Filename {
        filename: String,
        expected: &'static str,
    },

    /// No `file` part in the multipart body.
    #[error("Missing multipart field 'file'")]
    MissingFile,

    /// The multipart body itself could not be read.
    #[error("Failed to read upload: {0}")]
    Upload(String),

    /// Content is not valid UTF-8.
    #[error("log content is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// The tab-separated reader gave up on the content.
    #[error("malformed log: {0}")]
    Malformed(#[from] csv::Error),

    /// Column count across the file is not the expected one.
    #[error("expected {expected} columns in .log, found {observed}", expected = N_COLUMNS)]
    Schema { observed: usize },

    /// A feature field is not numeric.
    #[error("invalid numeric value '{value}' at line {line}, column '{column}'")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },

    /// The loaded forest could not classify valid rows. Server-side fault.
    #[error("classification failed: {0}")]
    Inference(String),
}

impl DetectError {
    /// Message surfaced to the client.
    ///
    /// Parsing and validation failures are wrapped so the client can tell
    /// they came from processing the file contents.
    pub fn client_message(&self) -> String {
        // ---
        match self {
            DetectError::Filename { .. } | DetectError::MissingFile | DetectError::Upload(_) => {
                self.to_string()
            }
            _ => format!("Error processing file: {self}"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        // ---
        let status = match &self {
            DetectError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody {
            detail: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failures loading or validating a persisted artifact. Fatal at startup.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode artifact {path}: {source}")]
    Decode {
        path: PathBuf,
        source: bincode::Error,
    },

    #[error("artifact {path} has format version {found}, expected {expected}")]
    Version {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("artifact {path} holds a {found} model, expected {expected}")]
    KindMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    #[error("artifact {path} was fitted on columns {found:?}, which do not match the serving columns")]
    ColumnMismatch { path: PathBuf, found: Vec<String> },

    #[error("artifact {path} is inconsistent: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
