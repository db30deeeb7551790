//! Column schema for MHEALTH sensor logs.
//!
//! The column order defined here is the single source of truth for both the
//! serving path and the training binary. Scaler and forest artifacts record
//! [`FEATURE_COLUMNS`] when they are fitted and are refused at load time if
//! the list differs, so a reordering here forces a retrain instead of
//! silently producing wrong predictions.

// ---

/// Total number of tab-separated fields in every log row.
pub const N_COLUMNS: usize = 24;

/// Number of numeric model inputs (all columns except the label).
pub const N_FEATURES: usize = N_COLUMNS - 1;

/// Index of the activity label column.
pub const LABEL_INDEX: usize = N_COLUMNS - 1;

/// All log columns in file order.
pub const COLUMNS: [&str; N_COLUMNS] = [
    "acc_chest_x",
    "acc_chest_y",
    "acc_chest_z",
    "ecg_1",
    "ecg_2",
    "acc_left_ankle_x",
    "acc_left_ankle_y",
    "acc_left_ankle_z",
    "gyro_left_ankle_x",
    "gyro_left_ankle_y",
    "gyro_left_ankle_z",
    "mag_left_ankle_x",
    "mag_left_ankle_y",
    "mag_left_ankle_z",
    "acc_right_arm_x",
    "acc_right_arm_y",
    "acc_right_arm_z",
    "gyro_right_arm_x",
    "gyro_right_arm_y",
    "gyro_right_arm_z",
    "mag_right_arm_x",
    "mag_right_arm_y",
    "mag_right_arm_z",
    "activity",
];

/// Model input columns, in the order features are fed to scaler and forest.
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = {
    let mut out = [""; N_FEATURES];
    let mut i = 0;
    while i < N_FEATURES {
        out[i] = COLUMNS[i];
        i += 1;
    }
    out
};

/// One feature vector in [`FEATURE_COLUMNS`] order.
pub type FeatureRow = [f64; N_FEATURES];

/// Owned copy of [`FEATURE_COLUMNS`] for embedding in artifact headers.
pub fn feature_column_names() -> Vec<String> {
    // ---
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}
