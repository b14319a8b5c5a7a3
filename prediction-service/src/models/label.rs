use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Raw class code returned by a classifier.
pub type LabelCode = i64;

/// Human-readable prediction category.
///
/// Code `0` means `Diabetic`; every other code means `Non Diabetic`. Clients
/// of the original service depend on this mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum PredictionLabel {
    #[serde(rename = "Diabetic")]
    Diabetic,
    #[serde(rename = "Non Diabetic")]
    NonDiabetic,
}

impl PredictionLabel {
    pub fn from_code(code: LabelCode) -> Self {
        if code == 0 {
            PredictionLabel::Diabetic
        } else {
            PredictionLabel::NonDiabetic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionLabel::Diabetic => "Diabetic",
            PredictionLabel::NonDiabetic => "Non Diabetic",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
