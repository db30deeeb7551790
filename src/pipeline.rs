//! Serving pipeline: parse → extract → scale → classify → summarize.

use crate::error::DetectError;
use crate::features::extract_features;
use crate::model::ModelState;
use crate::models::PredictionSummary;
use crate::parser::parse_log;
use crate::summary::summarize;

// ---

/// Run the full inference pipeline over raw log bytes.
///
/// Pure with respect to `state`: the same bytes always produce the same
/// summary, and nothing is retained between calls.
pub fn predict_from_log(state: &ModelState, bytes: &[u8]) -> Result<PredictionSummary, DetectError> {
    // ---
    let log = parse_log(bytes)?;
    let features = extract_features(&log);
    let scaled = state.scaler.transform(&features);
    let predictions = state
        .forest
        .predict(&scaled)
        .map_err(|e| DetectError::Inference(e.to_string()))?;

    let summary = summarize(&predictions);
    tracing::debug!(
        "Predicted {} rows, dominant activity {} ({})",
        summary.rows_evaluated,
        summary.predicted_activity_id,
        summary.predicted_activity_name
    );
    Ok(summary)
}
