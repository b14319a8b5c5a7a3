use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use service_core::error::AppError;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::services::metrics::record_rejection;

/// A request body read one field at a time.
///
/// Every listed field must be optional on `Self`, so that an object holding
/// only that field deserializes whenever its value is well typed.
pub trait FieldwiseJson: DeserializeOwned + Validate {
    /// JSON keys that are type-checked individually.
    const FIELDS: &'static [&'static str];
}

/// JSON body extractor that runs `validator` rules before the handler sees it.
///
/// Rejections:
/// - malformed JSON → 400
/// - missing `application/json` content type → 415
/// - wrong field types and rule violations → 422, all fields in one response
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: FieldwiseJson + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(reject_json)?;

        let value = parse_fieldwise::<T>(body).map_err(|e| {
            record_rejection(if has_type_error(&e) {
                "invalid_type"
            } else {
                "validation"
            });
            tracing::debug!(error = %e, "Request failed validation");
            AppError::from(e)
        })?;

        Ok(ValidatedJson(value))
    }
}

/// Deserialize `body` into `T`, reporting type failures and rule violations
/// for every field together.
pub fn parse_fieldwise<T: FieldwiseJson>(body: Value) -> Result<T, ValidationErrors> {
    let mut fields = match body {
        Value::Object(fields) => fields,
        other => {
            let mut errors = ValidationErrors::new();
            errors.add(
                "body",
                type_error(format!("request body must be a JSON object, got {}", other)),
            );
            return Err(errors);
        }
    };

    // Bad fields are pulled out so the remainder still deserializes.
    let mut type_errors = Vec::new();
    for &field in T::FIELDS {
        let Some(raw) = fields.get(field) else {
            continue;
        };
        let single = Value::Object(Map::from_iter([(field.to_string(), raw.clone())]));
        if let Err(e) = serde_json::from_value::<T>(single) {
            type_errors.push((field, format!("{} could not be read: {}", field, e)));
            fields.remove(field);
        }
    }

    let value: T = serde_json::from_value(Value::Object(fields)).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("body", type_error(e.to_string()));
        errors
    })?;

    let mut errors = ValidationErrors::new();
    for (field, message) in type_errors.iter() {
        errors.add(*field, type_error(message.clone()));
    }

    if let Err(rule_errors) = value.validate() {
        for (key, field_errors) in rule_errors.field_errors() {
            // A removed field would otherwise also report itself as missing.
            if type_errors.iter().any(|(field, _)| same_field(field, key)) {
                continue;
            }
            for error in field_errors.iter() {
                errors.add(key, error.clone());
            }
        }
    }

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

fn type_error(message: String) -> ValidationError {
    let mut error = ValidationError::new("type");
    error.message = Some(Cow::Owned(message));
    error
}

fn has_type_error(errors: &ValidationErrors) -> bool {
    errors
        .field_errors()
        .values()
        .any(|errs| errs.iter().any(|e| e.code == "type"))
}

/// `validator` may key a field by its Rust name or its serde rename.
fn same_field(json_key: &str, validator_key: &str) -> bool {
    json_key
        .replace('_', "")
        .eq_ignore_ascii_case(&validator_key.replace('_', ""))
}

fn reject_json(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(e) => {
            record_rejection("unsupported_media_type");
            AppError::UnsupportedMediaType(e.body_text())
        }
        other => {
            record_rejection("invalid_json");
            AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", other.body_text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::PredictRequest;

    fn valid() -> Value {
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

    fn field_codes(errors: &ValidationErrors, field: &str) -> Vec<String> {
        errors
            .field_errors()
            .iter()
            .filter(|(key, _)| same_field(field, key))
            .flat_map(|(_, errs)| errs.iter().map(|e| e.code.to_string()))
            .collect()
    }

    #[test]
    fn coercible_values_pass_through() {
        let mut body = valid();
        body["Glucose"] = serde_json::json!(120.0);
        body["Age"] = serde_json::json!("30");
        body["BMI"] = serde_json::json!("25.5");

        let req: PredictRequest = parse_fieldwise(body).unwrap();
        assert_eq!(req.glucose, Some(120));
        assert_eq!(req.age, Some(30));
        assert_eq!(req.bmi, Some(25.5));
    }

    #[test]
    fn type_failure_and_missing_field_are_reported_together() {
        let mut body = valid();
        body["Glucose"] = serde_json::json!("high");
        body.as_object_mut().unwrap().remove("Age");

        let errors = parse_fieldwise::<PredictRequest>(body).unwrap_err();

        assert_eq!(field_codes(&errors, "Glucose"), vec!["type"]);
        assert_eq!(field_codes(&errors, "Age"), vec!["required"]);
        assert!(has_type_error(&errors));
    }

    #[test]
    fn type_failure_and_range_violation_are_reported_together() {
        let mut body = valid();
        body["Pregnancies"] = serde_json::json!(1.5);
        body["BMI"] = serde_json::json!(72.0);

        let errors = parse_fieldwise::<PredictRequest>(body).unwrap_err();

        assert_eq!(field_codes(&errors, "Pregnancies"), vec!["type"]);
        assert_eq!(field_codes(&errors, "BMI"), vec!["range"]);
    }

    #[test]
    fn rule_violations_alone_are_not_type_errors() {
        let mut body = valid();
        body["Age"] = serde_json::json!(150);

        let errors = parse_fieldwise::<PredictRequest>(body).unwrap_err();

        assert_eq!(field_codes(&errors, "Age"), vec!["range"]);
        assert!(!has_type_error(&errors));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let errors = parse_fieldwise::<PredictRequest>(serde_json::json!([1, 2, 3])).unwrap_err();
        assert_eq!(field_codes(&errors, "body"), vec!["type"]);
    }
}
