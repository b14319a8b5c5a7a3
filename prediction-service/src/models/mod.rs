pub mod features;
pub mod label;

pub use features::{FeatureRecord, PatientFeatures, FEATURE_COLUMNS, FEATURE_COUNT};
pub use label::{LabelCode, PredictionLabel};
