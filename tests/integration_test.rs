use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tokio_test::assert_ok;

use mhealth_activity::forest::{ForestParams, RandomForest};
use mhealth_activity::scaler::StandardScaler;
use mhealth_activity::schema::{FeatureRow, N_FEATURES};
use mhealth_activity::{routes, ModelState};

#[derive(Debug, PartialEq, Deserialize)]
struct DetectBody {
    filename: String,
    predicted_activity_id: u8,
    predicted_activity_name: String,
    activity_distribution: BTreeMap<u8, f64>,
    rows_evaluated: usize,
    is_anomaly: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Chest x reading that the test model maps to each activity.
const WALKING_X: f64 = 8.0;
const NULL_X: f64 = -8.0;
const STANDING_X: f64 = 20.0;

// ---

/// Fit a small model where chest x alone decides the activity, persist it
/// and load it back the way the service does at startup.
fn trained_state(model_dir: &Path) -> Result<ModelState> {
    // ---
    let mut rows: Vec<FeatureRow> = Vec::new();
    let mut labels = Vec::new();
    for (label, center) in [(4u8, WALKING_X), (0u8, NULL_X), (1u8, STANDING_X)] {
        for k in 0..60 {
            let mut row = [0.5; N_FEATURES];
            row[0] = center + (k % 5) as f64 * 0.1;
            rows.push(row);
            labels.push(label);
        }
    }

    let scaler = StandardScaler::fit(&rows);
    let params = ForestParams {
        n_estimators: 8,
        max_features: Some(N_FEATURES),
        ..ForestParams::default()
    };
    let forest = RandomForest::fit(&scaler.transform(&rows), &labels, &params)?;

    ModelState::new(scaler, forest).save(model_dir)?;
    Ok(ModelState::load(model_dir)?)
}

async fn spawn_server() -> Result<(String, tempfile::TempDir)> {
    // ---
    let dir = tempfile::tempdir()?;
    let state = trained_state(dir.path())?;
    let app = routes::router(Arc::new(state), 1024 * 1024);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok((format!("http://{}", addr), dir))
}

fn log_body(groups: &[(f64, usize)], width: usize) -> Vec<u8> {
    // ---
    let mut lines = Vec::new();
    for (x, n) in groups {
        for _ in 0..*n {
            let mut fields = vec![x.to_string()];
            fields.extend((1..width - 1).map(|_| "0.5".to_string()));
            fields.push("0".to_string());
            lines.push(fields.join("\t"));
        }
    }
    (lines.join("\n") + "\n").into_bytes()
}

async fn upload(base: &str, filename: &str, body: Vec<u8>) -> Result<reqwest::Response> {
    // ---
    let part = multipart::Part::bytes(body).file_name(filename.to_string());
    let form = multipart::Form::new().part("file", part);
    let response = Client::new()
        .post(format!("{}/detect", base))
        .multipart(form)
        .send()
        .await?;
    Ok(response)
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    // ---
    let (base, _dir) = spawn_server().await?;

    let body: serde_json::Value = Client::new()
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn detect_summarizes_walking_log() -> Result<()> {
    // ---
    let (base, _dir) = spawn_server().await?;

    let body = log_body(&[(WALKING_X, 600), (NULL_X, 400)], 24);
    let response = upload(&base, "mHealth_subject1.log", body).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let result: DetectBody = response.json().await?;
    assert_eq!(result.filename, "mHealth_subject1.log");
    assert_eq!(result.predicted_activity_id, 4);
    assert_eq!(result.predicted_activity_name, "Walking");
    assert_eq!(
        result.activity_distribution,
        BTreeMap::from([(0, 0.4), (4, 0.6)])
    );
    assert_eq!(result.rows_evaluated, 1000);
    assert!(!result.is_anomaly);

    Ok(())
}

#[tokio::test]
async fn detect_flags_null_majority() -> Result<()> {
    // ---
    let (base, _dir) = spawn_server().await?;

    let body = log_body(&[(NULL_X, 600), (STANDING_X, 400)], 24);
    let result: DetectBody = upload(&base, "null.log", body).await?.json().await?;

    assert_eq!(result.predicted_activity_id, 0);
    assert_eq!(result.activity_distribution.get(&1), Some(&0.4));
    assert!(result.is_anomaly);

    // Distribution covers every row, within rounding
    let sum: f64 = result.activity_distribution.values().sum();
    assert!((sum - 1.0).abs() <= 0.003 * result.activity_distribution.len() as f64);

    Ok(())
}

#[tokio::test]
async fn detect_is_deterministic() -> Result<()> {
    // ---
    let (base, _dir) = spawn_server().await?;

    let body = log_body(&[(WALKING_X, 7), (STANDING_X, 7), (NULL_X, 3)], 24);
    let first: DetectBody = upload(&base, "a.log", body.clone()).await?.json().await?;
    let second: DetectBody = upload(&base, "a.log", body).await?.json().await?;

    assert_eq!(first, second);
    // Tie between walking and standing goes to the smaller id
    assert_eq!(first.predicted_activity_id, 1);
    assert_eq!(first.rows_evaluated, 17);

    Ok(())
}

#[tokio::test]
async fn detect_rejects_wrong_suffix() -> Result<()> {
    // ---
    let (base, _dir) = spawn_server().await?;

    let body = log_body(&[(WALKING_X, 5)], 24);
    let response = upload(&base, "subject1.csv", body).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorBody = response.json().await?;
    assert!(error.detail.contains(".log"), "{}", error.detail);

    Ok(())
}

#[tokio::test]
async fn detect_rejects_wrong_column_count() -> Result<()> {
    // ---
    let (base, _dir) = spawn_server().await?;

    for width in [23, 25] {
        let response = upload(&base, "bad.log", log_body(&[(WALKING_X, 5)], width)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ErrorBody = response.json().await?;
        assert!(
            error.detail.contains(&format!("found {width}")),
            "{}",
            error.detail
        );
    }

    Ok(())
}

#[tokio::test]
async fn detect_rejects_binary_content() -> Result<()> {
    // ---
    let (base, _dir) = spawn_server().await?;

    let response = assert_ok!(upload(&base, "blob.log", vec![0xff, 0xfe, 0x00, 0x81]).await);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorBody = response.json().await?;
    assert!(error.detail.starts_with("Error processing file"), "{}", error.detail);

    Ok(())
}

#[tokio::test]
async fn detect_requires_file_field() -> Result<()> {
    // ---
    let (base, _dir) = spawn_server().await?;

    let form = multipart::Form::new().text("note", "no file here");
    let response = Client::new()
        .post(format!("{}/detect", base))
        .multipart(form)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
