use crate::models::PredictionLabel;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide Prometheus recorder. Call once from `main`.
pub fn init_metrics() -> Result<(), AppError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "failed to install Prometheus recorder: {}",
            e
        ))
    })?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| AppError::ConfigError(anyhow::anyhow!("metrics already initialized")))?;

    Ok(())
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_prediction(label: PredictionLabel) {
    counter!("predictions_total", "label" => label.as_str()).increment(1);
}

/// `reason` is one of `invalid_json`, `invalid_type`, `unsupported_media_type`
/// or `validation`.
pub fn record_rejection(reason: &'static str) {
    counter!("prediction_rejections_total", "reason" => reason).increment(1);
}
