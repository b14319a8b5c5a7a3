use crate::models::{PatientFeatures, PredictionLabel, FEATURE_COLUMNS};
use crate::utils::{numeric, FieldwiseJson};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Body of `POST /predict`.
///
/// Fields are optional at the type level so that every missing field is
/// reported in one response instead of failing on the first. Numbers may
/// arrive as JSON numbers or numeric strings; integer fields also take
/// whole floats such as `120.0`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PredictRequest {
    #[serde(rename = "Pregnancies", default, deserialize_with = "numeric::integer")]
    #[validate(
        required(message = "Pregnancies is required"),
        range(min = 0, message = "Pregnancies must be greater than or equal to 0")
    )]
    #[schema(example = 2)]
    pub pregnancies: Option<i64>,

    #[serde(rename = "Glucose", default, deserialize_with = "numeric::integer")]
    #[validate(
        required(message = "Glucose is required"),
        range(exclusive_min = 0, message = "Glucose must be greater than 0")
    )]
    #[schema(example = 120)]
    pub glucose: Option<i64>,

    #[serde(rename = "BloodPressure", default, deserialize_with = "numeric::integer")]
    #[validate(
        required(message = "BloodPressure is required"),
        range(exclusive_min = 0, message = "BloodPressure must be greater than 0")
    )]
    #[schema(example = 70)]
    pub blood_pressure: Option<i64>,

    #[serde(rename = "SkinThickness", default, deserialize_with = "numeric::integer")]
    #[validate(required(message = "SkinThickness is required"))]
    #[schema(example = 20)]
    pub skin_thickness: Option<i64>,

    #[serde(rename = "Insulin", default, deserialize_with = "numeric::integer")]
    #[validate(required(message = "Insulin is required"))]
    #[schema(example = 80)]
    pub insulin: Option<i64>,

    #[serde(rename = "BMI", default, deserialize_with = "numeric::number")]
    #[validate(
        required(message = "BMI is required"),
        range(
            exclusive_min = 0.0,
            exclusive_max = 50.0,
            message = "BMI must be greater than 0 and less than 50"
        )
    )]
    #[schema(example = 25.0)]
    pub bmi: Option<f64>,

    #[serde(rename = "DiabetesPedigreeFunction", default, deserialize_with = "numeric::number")]
    #[validate(required(message = "DiabetesPedigreeFunction is required"))]
    #[schema(example = 0.5)]
    pub diabetes_pedigree_function: Option<f64>,

    #[serde(rename = "Age", default, deserialize_with = "numeric::integer")]
    #[validate(
        required(message = "Age is required"),
        range(
            exclusive_min = 0,
            exclusive_max = 120,
            message = "Age must be greater than 0 and less than 120"
        )
    )]
    #[schema(example = 30)]
    pub age: Option<i64>,
}

impl FieldwiseJson for PredictRequest {
    const FIELDS: &'static [&'static str] = &FEATURE_COLUMNS;
}

impl PredictRequest {
    /// `None` if any field is absent; always `Some` after validation passes.
    pub fn into_features(self) -> Option<PatientFeatures> {
        Some(PatientFeatures {
            pregnancies: self.pregnancies?,
            glucose: self.glucose?,
            blood_pressure: self.blood_pressure?,
            skin_thickness: self.skin_thickness?,
            insulin: self.insulin?,
            bmi: self.bmi?,
            diabetes_pedigree_function: self.diabetes_pedigree_function?,
            age: self.age?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionResponse {
    /// The key carries a trailing space; existing clients match on it verbatim.
    #[serde(rename = "predicted category ")]
    pub predicted_category: PredictionLabel,
}

impl From<PredictionLabel> for PredictionResponse {
    fn from(label: PredictionLabel) -> Self {
        Self {
            predicted_category: label,
        }
    }
}

/// Error body produced by `service_core::error::AppError`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Validation error")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Age: Age must be greater than 0 and less than 120")]
    pub details: Option<String>,
    /// Per-field validator errors keyed by field name.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<serde_json::Value>,
}
