//! Activity identifiers and their display names (UCI MHEALTH labelling).

// ---

/// Activity class id as produced by the classifier and stored in log files.
pub type ActivityId = u8;

/// Number of activity classes, ids `0..N_ACTIVITIES`.
pub const N_ACTIVITIES: usize = 13;

/// Label used for the "no activity" class and for the anomaly heuristic.
pub const NULL_ACTIVITY: ActivityId = 0;

/// Returned by [`activity_name`] for ids outside the table.
pub const UNKNOWN_ACTIVITY: &str = "Unknown activity";

const ACTIVITY_NAMES: [&str; N_ACTIVITIES] = [
    "Null / no defined activity",
    "Standing still",
    "Sitting and relaxing",
    "Lying down",
    "Walking",
    "Climbing stairs",
    "Waist bends forward",
    "Frontal elevation of arms",
    "Knees bending (crouching)",
    "Cycling",
    "Jogging",
    "Running",
    "Jump front & back",
];

/// Human-readable name for an activity id.
pub fn activity_name(id: ActivityId) -> &'static str {
    // ---
    ACTIVITY_NAMES
        .get(id as usize)
        .copied()
        .unwrap_or(UNKNOWN_ACTIVITY)
}

/// Parse a label field into an activity id, accepting integral floats
/// such as `4.0`. Returns `None` for anything outside `0..=12`.
pub fn parse_activity(text: &str) -> Option<ActivityId> {
    // ---
    let value: f64 = text.trim().parse().ok()?;
    if value.fract() != 0.0 || value < 0.0 || value >= N_ACTIVITIES as f64 {
        return None;
    }
    Some(value as ActivityId)
}

/// Serde adapter for a raw label field: reads its text and keeps it only if
/// [`parse_activity`] accepts it, so a bad label never fails the row.
pub fn deserialize_label<'de, D>(deserializer: D) -> Result<Option<ActivityId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // ---
    let text = <String as serde::Deserialize>::deserialize(deserializer)?;
    Ok(parse_activity(&text))
}
