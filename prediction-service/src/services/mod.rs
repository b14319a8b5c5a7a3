pub mod artifact;
pub mod classifier;
pub mod loader;
pub mod metrics;

pub use artifact::ArtifactModel;
pub use classifier::{Classifier, ModelError, ModelInfo};
pub use loader::{load_model, ModelLoadError};
pub use metrics::{get_metrics, init_metrics};
