use service_core::axum::{extract::State, Json};

use crate::{services::ModelInfo, AppState};

/// Describe the loaded model
#[utoipa::path(
    get,
    path = "/model",
    responses(
        (status = 200, description = "Loaded model metadata", body = ModelInfo)
    ),
    tag = "Prediction"
)]
pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.model.info())
}
