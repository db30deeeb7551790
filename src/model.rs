//! Persisted model state: the fitted scaler and forest.
//!
//! Both artifacts are bincode files with a small header in front of the
//! payload. The header records the feature columns the artifact was fitted
//! on, and loading refuses an artifact whose columns differ from
//! [`FEATURE_COLUMNS`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ArtifactLoadError;
use crate::forest::RandomForest;
use crate::scaler::StandardScaler;
use crate::schema::{feature_column_names, FEATURE_COLUMNS};

// ---

/// File name of the scaler artifact inside the model directory.
pub const SCALER_FILE: &str = "scaler.bin";

/// File name of the forest artifact inside the model directory.
pub const MODEL_FILE: &str = "rf_model.bin";

/// Bumped whenever the serialized layout of either artifact changes.
pub const FORMAT_VERSION: u32 = 2;

const SCALER_KIND: &str = "standard_scaler";
const FOREST_KIND: &str = "random_forest";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactHeader {
    format_version: u32,
    kind: String,
    feature_columns: Vec<String>,
    trained_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct Artifact<T> {
    header: ArtifactHeader,
    payload: T,
}

/// Read-only model state shared by all requests.
#[derive(Debug)]
pub struct ModelState {
    pub scaler: StandardScaler,
    pub forest: RandomForest,
    pub trained_at: DateTime<Utc>,
}

impl ModelState {
    // ---
    pub fn new(scaler: StandardScaler, forest: RandomForest) -> Self {
        Self {
            scaler,
            forest,
            trained_at: Utc::now(),
        }
    }

    /// Load both artifacts from `dir`.
    ///
    /// Any missing, unreadable, corrupt or column-mismatched artifact is an
    /// error; there is no partial state.
    pub fn load(dir: &Path) -> Result<Self, ArtifactLoadError> {
        // ---
        let scaler_path = dir.join(SCALER_FILE);
        let (scaler, header) = read_artifact::<StandardScaler>(&scaler_path, SCALER_KIND)?;
        scaler
            .validate()
            .map_err(|reason| ArtifactLoadError::Invalid {
                path: scaler_path.clone(),
                reason,
            })?;

        let model_path = dir.join(MODEL_FILE);
        let (forest, _) = read_artifact::<RandomForest>(&model_path, FOREST_KIND)?;
        forest
            .validate()
            .map_err(|reason| ArtifactLoadError::Invalid {
                path: model_path.clone(),
                reason,
            })?;

        tracing::info!(
            "Loaded scaler ({} samples) from {} and forest ({} trees) from {}",
            scaler.n_samples,
            scaler_path.display(),
            forest.n_trees(),
            model_path.display()
        );

        Ok(ModelState {
            scaler,
            forest,
            trained_at: header.trained_at,
        })
    }

    /// Write both artifacts into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<()> {
        // ---
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create model dir {}", dir.display()))?;

        write_artifact(&dir.join(SCALER_FILE), SCALER_KIND, self.trained_at, &self.scaler)?;
        write_artifact(&dir.join(MODEL_FILE), FOREST_KIND, self.trained_at, &self.forest)?;

        tracing::info!("Saved model artifacts to {}", dir.display());
        Ok(())
    }
}

fn write_artifact<T: Serialize>(
    path: &Path,
    kind: &str,
    trained_at: DateTime<Utc>,
    payload: &T,
) -> Result<()> {
    // ---
    let artifact = Artifact {
        header: ArtifactHeader {
            format_version: FORMAT_VERSION,
            kind: kind.to_string(),
            feature_columns: feature_column_names(),
            trained_at,
        },
        payload,
    };
    let bytes = bincode::serialize(&artifact)
        .with_context(|| format!("failed to encode artifact {}", path.display()))?;
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(
    path: &Path,
    kind: &'static str,
) -> Result<(T, ArtifactHeader), ArtifactLoadError> {
    // ---
    let bytes = fs::read(path).map_err(|source| ArtifactLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let decode_err = |source| ArtifactLoadError::Decode {
        path: path.to_path_buf(),
        source,
    };

    // Header first, so a wrong file gets a precise error instead of a
    // payload decode failure
    let header: ArtifactHeader = bincode::deserialize(&bytes).map_err(decode_err)?;
    check_header(path, &header, kind)?;

    let artifact: Artifact<T> = bincode::deserialize(&bytes).map_err(decode_err)?;
    Ok((artifact.payload, header))
}

fn check_header(
    path: &Path,
    header: &ArtifactHeader,
    kind: &'static str,
) -> Result<(), ArtifactLoadError> {
    // ---
    let path: PathBuf = path.to_path_buf();
    if header.format_version != FORMAT_VERSION {
        return Err(ArtifactLoadError::Version {
            path,
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }
    if header.kind != kind {
        return Err(ArtifactLoadError::KindMismatch {
            path,
            found: header.kind.clone(),
            expected: kind,
        });
    }
    if !header.feature_columns.iter().eq(FEATURE_COLUMNS.iter()) {
        return Err(ArtifactLoadError::ColumnMismatch {
            path,
            found: header.feature_columns.clone(),
        });
    }
    Ok(())
}
