//! Offline training: fetch the MHEALTH dataset, fit scaler and forest,
//! evaluate on a held-out split and persist the artifacts.
//!
//! Rows go through the same parser and feature projection as the serving
//! path, so training and serving always agree on column order.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::activity::ActivityId;
use crate::config::TrainConfig;
use crate::features::extract_labelled;
use crate::forest::{ForestParams, RandomForest};
use crate::metrics::{accuracy, weighted_f1};
use crate::model::ModelState;
use crate::parser::parse_log_str;
use crate::scaler::StandardScaler;
use crate::schema::FeatureRow;

// ---

/// Directory name the dataset archive extracts to.
pub const RAW_DIR_NAME: &str = "MHEALTHDATASET";

/// Labelled feature rows from every log in the dataset.
#[derive(Debug, Default)]
pub struct Dataset {
    pub rows: Vec<FeatureRow>,
    pub labels: Vec<ActivityId>,
    pub files: usize,
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows_total: usize,
    pub rows_train: usize,
    pub rows_test: usize,
    pub accuracy: f64,
    pub f1_weighted: f64,
    pub n_trees: usize,
    pub model_dir: PathBuf,
}

/// Run the full training pipeline described by `cfg`.
pub async fn run(cfg: &TrainConfig) -> Result<TrainingReport> {
    // ---
    let raw_dir = cfg.data_dir.join(RAW_DIR_NAME);
    download_dataset(&cfg.data_url, &cfg.data_dir, &raw_dir).await?;

    let dataset = load_dataset(&raw_dir)?;
    let test_fraction = cfg.test_split_percent as f64 / 100.0;
    let params = cfg.forest.clone();

    // Fitting is CPU bound; keep it off the runtime workers
    let (state, mut report) =
        tokio::task::spawn_blocking(move || train(&dataset, test_fraction, &params))
            .await
            .context("training task panicked")??;

    state.save(&cfg.model_dir)?;
    report.model_dir = cfg.model_dir.clone();

    tracing::info!(
        "Training finished: accuracy {:.3} | F1 {:.3} | {} trees saved to {}",
        report.accuracy,
        report.f1_weighted,
        report.n_trees,
        report.model_dir.display()
    );
    Ok(report)
}

/// Download and extract the dataset unless `raw_dir` already exists.
pub async fn download_dataset(url: &str, data_dir: &Path, raw_dir: &Path) -> Result<()> {
    // ---
    if raw_dir.exists() {
        tracing::info!("Dataset already present in {}", raw_dir.display());
        return Ok(());
    }

    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

    tracing::info!("Downloading MHEALTH dataset from {}", url);
    let bytes = reqwest::get(url)
        .await
        .with_context(|| format!("failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("dataset download from {url} failed"))?
        .bytes()
        .await
        .context("failed to read dataset body")?;
    tracing::debug!("Downloaded {} bytes", bytes.len());

    let extracted = extract_zip(&bytes, data_dir)?;
    tracing::info!("Extracted {} files into {}", extracted, data_dir.display());

    if !raw_dir.exists() {
        bail!(
            "archive from {url} did not contain {}",
            raw_dir.display()
        );
    }
    Ok(())
}

/// Extract a zip archive held in memory into `dest`; returns the number of
/// files written.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<usize> {
    // ---
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("failed to open dataset archive")?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("failed to read archive entry {i}"))?;

        let name = file.name().to_string();
        if name.split(['/', '\\']).any(|part| part == "..") {
            bail!("rejecting archive path with directory traversal: {name}");
        }

        let out_path = dest.join(&name);
        if file.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("failed to create directory {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create parent dir {}", parent.display()))?;
        }

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .with_context(|| format!("failed to read {name} from archive"))?;
        fs::write(&out_path, &buf)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        written += 1;
    }
    Ok(written)
}

/// Parse every `*.log` file in `raw_dir`, in file name order.
///
/// Every row must carry a valid activity label.
pub fn load_dataset(raw_dir: &Path) -> Result<Dataset> {
    // ---
    let mut paths: Vec<PathBuf> = fs::read_dir(raw_dir)
        .with_context(|| format!("failed to list {}", raw_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "log"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("no .log files found in {}", raw_dir.display());
    }

    let mut dataset = Dataset::default();
    for path in &paths {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let log = parse_log_str(&text).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
        let (rows, labels) = extract_labelled(&log)
            .map_err(|row| anyhow!("{}: row {} has no valid activity label", path.display(), row))?;

        tracing::debug!("Loaded {} rows from {}", rows.len(), path.display());
        dataset.rows.extend(rows);
        dataset.labels.extend(labels);
        dataset.files += 1;
    }

    tracing::info!(
        "Combined dataset: {} rows from {} files",
        dataset.rows.len(),
        dataset.files
    );
    Ok(dataset)
}

/// Fit scaler and forest on `dataset` and score the forest on a stratified
/// hold-out of `test_fraction` of the rows.
///
/// The scaler is fitted on all rows before the split.
pub fn train(
    dataset: &Dataset,
    test_fraction: f64,
    params: &ForestParams,
) -> Result<(ModelState, TrainingReport)> {
    // ---
    let scaler = StandardScaler::fit(&dataset.rows);
    let scaled = scaler.transform(&dataset.rows);

    let (train_idx, test_idx) = stratified_split(&dataset.labels, test_fraction, params.seed);
    let pick_rows = |idx: &[usize]| idx.iter().map(|&i| scaled[i]).collect::<Vec<_>>();
    let pick_labels = |idx: &[usize]| idx.iter().map(|&i| dataset.labels[i]).collect::<Vec<_>>();

    let (x_train, y_train) = (pick_rows(&train_idx), pick_labels(&train_idx));
    let (x_test, y_test) = (pick_rows(&test_idx), pick_labels(&test_idx));

    tracing::info!(
        "Training random forest on {} rows ({} held out)",
        x_train.len(),
        x_test.len()
    );
    let forest = RandomForest::fit(&x_train, &y_train, params)?;

    let (acc, f1) = if x_test.is_empty() {
        tracing::warn!("Hold-out split is empty, skipping evaluation");
        (0.0, 0.0)
    } else {
        let y_pred = forest.predict(&x_test)?;
        (accuracy(&y_test, &y_pred), weighted_f1(&y_test, &y_pred))
    };
    tracing::info!("Results: accuracy {:.3} | F1 {:.3}", acc, f1);

    let report = TrainingReport {
        rows_total: dataset.rows.len(),
        rows_train: x_train.len(),
        rows_test: x_test.len(),
        accuracy: acc,
        f1_weighted: f1,
        n_trees: forest.n_trees(),
        model_dir: PathBuf::new(),
    };
    Ok((ModelState::new(scaler, forest), report))
}

/// Split row indices into (train, test), holding out `test_fraction` of each
/// class (rounded) so class proportions are preserved.
pub fn stratified_split(
    labels: &[ActivityId],
    test_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    // ---
    let mut by_class: BTreeMap<ActivityId, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for indices in by_class.values_mut() {
        indices.shuffle(&mut rng);
        let n_test = (indices.len() as f64 * test_fraction).round() as usize;
        let n_test = n_test.min(indices.len().saturating_sub(1));
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    (train, test)
}
