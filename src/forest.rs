//! Random forest classifier over the 23 scaled sensor features.
//!
//! Training and voting are delegated to smartcore's
//! [`RandomForestClassifier`]; this module maps the trainer's settings onto
//! its parameters and keeps the class ids inside the activity table.

use anyhow::{anyhow, bail, ensure, Result};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::activity::{ActivityId, N_ACTIVITIES};
use crate::schema::{FeatureRow, N_FEATURES};

// ---

type Classifier = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Hyperparameters for [`RandomForest::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    // ---
    pub n_estimators: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples become leaves.
    pub min_samples_split: usize,
    /// Candidate features per split; `None` means `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn to_smartcore(&self) -> Result<RandomForestClassifierParameters> {
        // ---
        let n_trees = u16::try_from(self.n_estimators)
            .map_err(|_| anyhow!("n_estimators {} exceeds {}", self.n_estimators, u16::MAX))?;

        let mut params = RandomForestClassifierParameters::default()
            .with_n_trees(n_trees)
            .with_min_samples_split(self.min_samples_split.max(2))
            .with_seed(self.seed);

        if let Some(depth) = self.max_depth {
            params = params.with_max_depth(u16::try_from(depth).unwrap_or(u16::MAX));
        }
        if let Some(m) = self.max_features {
            params = params.with_m(m.clamp(1, N_FEATURES));
        }
        Ok(params)
    }
}

/// Fitted forest plus the tree count it was built with.
#[derive(Serialize, Deserialize)]
pub struct RandomForest {
    n_trees: usize,
    classifier: Classifier,
}

impl std::fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomForest")
            .field("n_trees", &self.n_trees)
            .finish_non_exhaustive()
    }
}

impl RandomForest {
    // ---
    /// Fit a forest on scaled feature rows and their labels.
    ///
    /// The same rows, labels and seed always produce the same forest.
    pub fn fit(rows: &[FeatureRow], labels: &[ActivityId], params: &ForestParams) -> Result<Self> {
        // ---
        ensure!(!rows.is_empty(), "cannot fit a forest on zero rows");
        ensure!(
            rows.len() == labels.len(),
            "row count {} does not match label count {}",
            rows.len(),
            labels.len()
        );
        ensure!(params.n_estimators > 0, "n_estimators must be at least 1");
        if let Some(bad) = labels.iter().find(|l| (**l as usize) >= N_ACTIVITIES) {
            bail!("label {bad} is outside 0..{N_ACTIVITIES}");
        }

        tracing::debug!(
            "Fitting {} trees on {} rows (max_features={:?}, max_depth={:?})",
            params.n_estimators,
            rows.len(),
            params.max_features,
            params.max_depth
        );

        let x = to_matrix(rows);
        let y: Vec<i32> = labels.iter().map(|l| i32::from(*l)).collect();
        let classifier = Classifier::fit(&x, &y, params.to_smartcore()?)
            .map_err(|e| anyhow!("random forest fit failed: {e}"))?;

        Ok(RandomForest {
            n_trees: params.n_estimators,
            classifier,
        })
    }

    /// One predicted class per row, each in `0..N_ACTIVITIES`.
    pub fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<ActivityId>> {
        // ---
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let predicted = self
            .classifier
            .predict(&to_matrix(rows))
            .map_err(|e| anyhow!("random forest prediction failed: {e}"))?;

        predicted
            .into_iter()
            .map(|class| {
                ActivityId::try_from(class)
                    .ok()
                    .filter(|id| (*id as usize) < N_ACTIVITIES)
                    .ok_or_else(|| anyhow!("forest predicted class {class} outside 0..{N_ACTIVITIES}"))
            })
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    pub fn validate(&self) -> Result<(), String> {
        // ---
        if self.n_trees == 0 {
            return Err("forest has no trees".to_string());
        }
        Ok(())
    }
}

fn to_matrix(rows: &[FeatureRow]) -> DenseMatrix<f64> {
    // ---
    let values: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
    DenseMatrix::from_2d_vec(&values)
}
