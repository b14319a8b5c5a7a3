use crate::services::artifact::ArtifactModel;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model was fitted on columns {found:?}, expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Read and validate the artifact at `path`.
///
/// Called once during startup; any error is fatal to the process.
pub fn load_model(path: &Path) -> Result<ArtifactModel, ModelLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let model = ArtifactModel::from_json(&raw)?;
    tracing::info!(
        path = %path.display(),
        kind = model.kind(),
        "Loaded model artifact"
    );
    Ok(model)
}
