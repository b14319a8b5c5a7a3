//! Test helpers for prediction-service integration tests.
//!
//! Routers are driven in-process with `tower::ServiceExt::oneshot`; classifier
//! doubles stand in for the artifact model where call counts matter.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use prediction_service::{
    build_router,
    config::{
        CorsConfig, Environment, ModelConfig, PredictionConfig, ServerConfig, SwaggerConfig,
    },
    models::{FeatureRecord, LabelCode},
    services::{load_model, Classifier, ModelError, ModelInfo},
    AppState,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tower::util::ServiceExt;

pub fn shipped_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts/diabetes_model.json")
}

pub fn test_config(model_path: PathBuf) -> PredictionConfig {
    PredictionConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
        },
        environment: Environment::Dev,
        service_name: "prediction-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        model: ModelConfig { path: model_path },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        },
        server: ServerConfig {
            request_timeout_seconds: 5,
        },
        swagger: SwaggerConfig { enabled: true },
    }
}

/// The scenario payload: a typical adult with normal readings.
pub fn valid_payload() -> serde_json::Value {
    serde_json::json!({
        "Pregnancies": 2,
        "Glucose": 120,
        "BloodPressure": 70,
        "SkinThickness": 20,
        "Insulin": 80,
        "BMI": 25.0,
        "DiabetesPedigreeFunction": 0.5,
        "Age": 30
    })
}

/// Records every feature row it is asked to classify.
pub struct RecordingClassifier {
    code: LabelCode,
    calls: AtomicUsize,
    records: Mutex<Vec<FeatureRecord>>,
}

impl RecordingClassifier {
    pub fn returning(code: LabelCode) -> Arc<Self> {
        Arc::new(Self {
            code,
            calls: AtomicUsize::new(0),
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_record(&self) -> Option<FeatureRecord> {
        self.records.lock().unwrap().last().copied()
    }
}

impl Classifier for RecordingClassifier {
    fn predict(&self, record: &FeatureRecord) -> Result<LabelCode, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(*record);
        Ok(self.code)
    }

    fn info(&self) -> ModelInfo {
        stub_info("recording")
    }
}

pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _record: &FeatureRecord) -> Result<LabelCode, ModelError> {
        Err(ModelError::Corrupt("leaf 17 references missing class table".to_string()))
    }

    fn info(&self) -> ModelInfo {
        stub_info("failing")
    }
}

pub struct PanickingClassifier;

impl Classifier for PanickingClassifier {
    fn predict(&self, _record: &FeatureRecord) -> Result<LabelCode, ModelError> {
        panic!("inference blew up")
    }

    fn info(&self) -> ModelInfo {
        stub_info("panicking")
    }
}

/// Holds its thread for `delay` before answering.
pub struct SlowClassifier {
    pub delay: std::time::Duration,
}

impl Classifier for SlowClassifier {
    fn predict(&self, _record: &FeatureRecord) -> Result<LabelCode, ModelError> {
        std::thread::sleep(self.delay);
        Ok(1)
    }

    fn info(&self) -> ModelInfo {
        stub_info("slow")
    }
}

fn stub_info(kind: &str) -> ModelInfo {
    ModelInfo {
        kind: kind.to_string(),
        name: None,
        version: None,
        trained_at: None,
        feature_columns: prediction_service::models::FEATURE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect(),
        estimators: None,
        nodes: None,
    }
}

pub fn router_with(model: Arc<dyn Classifier>) -> Router {
    router_with_config(test_config(shipped_model_path()), model)
}

pub fn router_with_config(config: PredictionConfig, model: Arc<dyn Classifier>) -> Router {
    build_router(AppState { config, model }).expect("Failed to build router")
}

pub fn router_with_shipped_model() -> Router {
    let model = load_model(&shipped_model_path()).expect("Failed to load shipped model");
    router_with(Arc::new(model))
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub async fn post_predict(router: &Router, body: impl Into<String>) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    send(router, request).await
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub fn write_artifact(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write artifact");
    file
}
