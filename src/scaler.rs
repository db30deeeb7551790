//! Per-column standardization fitted offline and applied at serving time.

use serde::{Deserialize, Serialize};

use crate::schema::{FeatureRow, N_FEATURES};

// ---

/// Fitted `(x - mean) / std` transform over the feature columns.
///
/// `std` is the population standard deviation. Columns with zero or
/// non-finite deviation are stored with a scale of 1.0, so such a column is
/// only centered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; N_FEATURES],
    pub scale: [f64; N_FEATURES],
    pub n_samples: usize,
}

impl StandardScaler {
    // ---
    /// Fit column means and deviations. An empty input yields the identity
    /// transform.
    pub fn fit(rows: &[FeatureRow]) -> Self {
        // ---
        let mut mean = [0.0; N_FEATURES];
        let mut m2 = [0.0; N_FEATURES];
        let mut count = 0.0_f64;

        // Welford update, stable over the ~1.2M dataset rows
        for row in rows {
            count += 1.0;
            for i in 0..N_FEATURES {
                let delta = row[i] - mean[i];
                mean[i] += delta / count;
                m2[i] += delta * (row[i] - mean[i]);
            }
        }

        let mut scale = [1.0; N_FEATURES];
        if count > 0.0 {
            for i in 0..N_FEATURES {
                let std = (m2[i] / count).sqrt();
                scale[i] = if std.is_finite() && std > 0.0 { std } else { 1.0 };
            }
        }

        StandardScaler {
            mean,
            scale,
            n_samples: rows.len(),
        }
    }

    pub fn transform_row(&self, row: &FeatureRow) -> FeatureRow {
        // ---
        let mut out = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            out[i] = (row[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    pub fn transform(&self, rows: &[FeatureRow]) -> Vec<FeatureRow> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Reject parameters that would make the transform divide by zero.
    pub fn validate(&self) -> Result<(), String> {
        // ---
        for (i, s) in self.scale.iter().enumerate() {
            if !s.is_finite() || *s <= 0.0 {
                return Err(format!("scale for feature {i} is {s}"));
            }
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("non-finite mean".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn rows_with_first_column(values: &[f64]) -> Vec<FeatureRow> {
        // ---
        values
            .iter()
            .map(|v| {
                let mut row = [5.0; N_FEATURES];
                row[0] = *v;
                row
            })
            .collect()
    }

    #[test]
    fn test_fit_mean_and_population_std() {
        // ---
        let rows = rows_with_first_column(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let scaler = StandardScaler::fit(&rows);

        assert!((scaler.mean[0] - 5.0).abs() < 1e-12);
        assert!((scaler.scale[0] - 2.0).abs() < 1e-12);
        assert_eq!(scaler.n_samples, 8);
    }

    #[test]
    fn test_transform_standardizes() {
        // ---
        let rows = rows_with_first_column(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform(&rows);

        assert_eq!(scaled.len(), rows.len());
        assert!((scaled[0][0] - (-1.5)).abs() < 1e-12);
        assert!((scaled[7][0] - 2.0).abs() < 1e-12);

        let mean: f64 = scaled.iter().map(|r| r[0]).sum::<f64>() / scaled.len() as f64;
        assert!(mean.abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_uses_unit_scale() {
        // ---
        let rows = rows_with_first_column(&[1.0, 2.0, 3.0]);
        let scaler = StandardScaler::fit(&rows);

        // Column 1 is constant 5.0
        assert_eq!(scaler.scale[1], 1.0);
        let out = scaler.transform_row(&rows[0]);
        assert_eq!(out[1], 0.0);
        assert!(out.iter().all(|v| v.is_finite()));
        assert!(scaler.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_scale() {
        // ---
        let mut scaler = StandardScaler::fit(&rows_with_first_column(&[1.0, 2.0]));
        scaler.scale[3] = 0.0;
        assert!(scaler.validate().is_err());
    }
}
