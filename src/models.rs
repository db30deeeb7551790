//! Data models for sensor logs and prediction results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::activity::ActivityId;
use crate::schema::{FeatureRow, N_FEATURES};

// ---

/// One validated row of an MHEALTH log.
///
/// Field order matches [`crate::schema::COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    // ---
    pub acc_chest_x: f64,
    pub acc_chest_y: f64,
    pub acc_chest_z: f64,
    pub ecg_1: f64,
    pub ecg_2: f64,
    pub acc_left_ankle_x: f64,
    pub acc_left_ankle_y: f64,
    pub acc_left_ankle_z: f64,
    pub gyro_left_ankle_x: f64,
    pub gyro_left_ankle_y: f64,
    pub gyro_left_ankle_z: f64,
    pub mag_left_ankle_x: f64,
    pub mag_left_ankle_y: f64,
    pub mag_left_ankle_z: f64,
    pub acc_right_arm_x: f64,
    pub acc_right_arm_y: f64,
    pub acc_right_arm_z: f64,
    pub gyro_right_arm_x: f64,
    pub gyro_right_arm_y: f64,
    pub gyro_right_arm_z: f64,
    pub mag_right_arm_x: f64,
    pub mag_right_arm_y: f64,
    pub mag_right_arm_z: f64,
    /// Recorded label; `None` when the field is not an id in `0..=12`.
    #[serde(deserialize_with = "crate::activity::deserialize_label")]
    pub activity: Option<ActivityId>,
}

impl SensorRecord {
    // ---
    /// Build a record from feature values in column order.
    pub fn from_features(v: FeatureRow, activity: Option<ActivityId>) -> Self {
        // ---
        SensorRecord {
            acc_chest_x: v[0],
            acc_chest_y: v[1],
            acc_chest_z: v[2],
            ecg_1: v[3],
            ecg_2: v[4],
            acc_left_ankle_x: v[5],
            acc_left_ankle_y: v[6],
            acc_left_ankle_z: v[7],
            gyro_left_ankle_x: v[8],
            gyro_left_ankle_y: v[9],
            gyro_left_ankle_z: v[10],
            mag_left_ankle_x: v[11],
            mag_left_ankle_y: v[12],
            mag_left_ankle_z: v[13],
            acc_right_arm_x: v[14],
            acc_right_arm_y: v[15],
            acc_right_arm_z: v[16],
            gyro_right_arm_x: v[17],
            gyro_right_arm_y: v[18],
            gyro_right_arm_z: v[19],
            mag_right_arm_x: v[20],
            mag_right_arm_y: v[21],
            mag_right_arm_z: v[22],
            activity,
        }
    }

    /// Project the model inputs in [`crate::schema::FEATURE_COLUMNS`] order,
    /// dropping the label.
    pub fn features(&self) -> FeatureRow {
        // ---
        let row: [f64; N_FEATURES] = [
            self.acc_chest_x,
            self.acc_chest_y,
            self.acc_chest_z,
            self.ecg_1,
            self.ecg_2,
            self.acc_left_ankle_x,
            self.acc_left_ankle_y,
            self.acc_left_ankle_z,
            self.gyro_left_ankle_x,
            self.gyro_left_ankle_y,
            self.gyro_left_ankle_z,
            self.mag_left_ankle_x,
            self.mag_left_ankle_y,
            self.mag_left_ankle_z,
            self.acc_right_arm_x,
            self.acc_right_arm_y,
            self.acc_right_arm_z,
            self.gyro_right_arm_x,
            self.gyro_right_arm_y,
            self.gyro_right_arm_z,
            self.mag_right_arm_x,
            self.mag_right_arm_y,
            self.mag_right_arm_z,
        ];
        row
    }
}

/// A parsed log file: rows in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorLog {
    pub records: Vec<SensorRecord>,
}

impl SensorLog {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Aggregated classifier output for one uploaded log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    // ---
    pub predicted_activity_id: ActivityId,
    pub predicted_activity_name: String,
    /// Fraction of rows per observed activity id, rounded to 3 decimals.
    pub activity_distribution: BTreeMap<ActivityId, f64>,
    pub rows_evaluated: usize,
    pub is_anomaly: bool,
}

/// Response body for `POST /detect`.
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    // ---
    pub filename: String,
    #[serde(flatten)]
    pub summary: PredictionSummary,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::schema::FEATURE_COLUMNS;

    fn ramp() -> FeatureRow {
        // ---
        let mut row = [0.0; N_FEATURES];
        for (i, v) in row.iter_mut().enumerate() {
            *v = i as f64 * 1.5 - 3.0;
        }
        row
    }

    #[test]
    fn test_features_preserve_column_order() {
        // ---
        let row = ramp();
        let record = SensorRecord::from_features(row, Some(7));

        assert_eq!(record.features(), row);
        assert_eq!(record.acc_chest_x, row[0]);
        assert_eq!(record.ecg_2, row[4]);
        assert_eq!(record.mag_right_arm_z, row[FEATURE_COLUMNS.len() - 1]);
        assert_eq!(record.activity, Some(7));
    }

    #[test]
    fn test_detect_response_flattens_summary() {
        // ---
        let mut distribution = BTreeMap::new();
        distribution.insert(0, 0.4);
        distribution.insert(4, 0.6);

        let response = DetectResponse {
            filename: "mHealth_subject1.log".to_string(),
            summary: PredictionSummary {
                predicted_activity_id: 4,
                predicted_activity_name: "Walking".to_string(),
                activity_distribution: distribution,
                rows_evaluated: 1000,
                is_anomaly: false,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["filename"], "mHealth_subject1.log");
        assert_eq!(json["predicted_activity_id"], 4);
        assert_eq!(json["predicted_activity_name"], "Walking");
        assert_eq!(json["activity_distribution"]["4"], 0.6);
        assert_eq!(json["rows_evaluated"], 1000);
        assert_eq!(json["is_anomaly"], false);
    }
}
