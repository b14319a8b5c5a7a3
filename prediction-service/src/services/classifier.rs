use crate::models::{FeatureRecord, LabelCode};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// A fitted binary classifier.
///
/// Implementations are immutable after construction and shared across
/// requests without locking.
pub trait Classifier: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> Result<LabelCode, ModelError>;

    fn info(&self) -> ModelInfo;
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model produced a non-finite score: {0}")]
    NonFinite(f64),

    #[error("model structure is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModelInfo {
    #[schema(example = "logistic_regression")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<String>,
    pub feature_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimators: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
}
