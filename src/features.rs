//! Feature extraction: projects model inputs out of a parsed log.

use crate::activity::ActivityId;
use crate::models::SensorLog;
use crate::schema::FeatureRow;

// ---

/// Feature rows for every record, label column dropped.
pub fn extract_features(log: &SensorLog) -> Vec<FeatureRow> {
    // ---
    log.records.iter().map(|r| r.features()).collect()
}

/// Feature rows paired with their recorded labels, for training.
///
/// Returns the 1-based row number of the first record without a valid label
/// as the error.
pub fn extract_labelled(log: &SensorLog) -> Result<(Vec<FeatureRow>, Vec<ActivityId>), usize> {
    // ---
    let mut rows = Vec::with_capacity(log.len());
    let mut labels = Vec::with_capacity(log.len());

    for (i, record) in log.records.iter().enumerate() {
        let label = record.activity.ok_or(i + 1)?;
        rows.push(record.features());
        labels.push(label);
    }
    Ok((rows, labels))
}
