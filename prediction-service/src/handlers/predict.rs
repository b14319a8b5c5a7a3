use service_core::axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{PredictRequest, PredictionResponse},
    models::PredictionLabel,
    services::metrics::record_prediction,
    utils::ValidatedJson,
    AppState,
};

/// Predict the diabetes category for one patient
#[utoipa::path(
    post,
    path = "/predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Prediction made", body = PredictionResponse),
        (status = 400, description = "Malformed JSON", body = crate::dtos::ErrorResponse),
        (status = 415, description = "Body is not JSON", body = crate::dtos::ErrorResponse),
        (status = 422, description = "Validation error", body = crate::dtos::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::dtos::ErrorResponse)
    ),
    tag = "Prediction"
)]
pub async fn predict(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PredictRequest>,
) -> Result<Json<PredictionResponse>, AppError> {
    let features = req.into_features().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("validated request is missing fields"))
    })?;

    // Inference runs on the blocking pool so the request timeout still fires.
    let model = state.model.clone();
    let record = features.to_record();
    let outcome = match tokio::task::spawn_blocking(move || model.predict(&record)).await {
        Ok(outcome) => outcome,
        // Re-raised for the catch-panic layer.
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "inference task failed: {}",
                e
            )))
        }
    };
    let code = outcome.map_err(|e| {
        tracing::error!(error = %e, "Model inference failed");
        AppError::InternalError(anyhow::Error::new(e))
    })?;

    let label = PredictionLabel::from_code(code);
    record_prediction(label);
    tracing::info!(label = %label, code, "Prediction served");

    Ok(Json(PredictionResponse::from(label)))
}
