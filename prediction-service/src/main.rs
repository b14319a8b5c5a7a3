use prediction_service::{config::PredictionConfig, services::init_metrics, startup::Application};
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = PredictionConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;
    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        model_path = %config.model.path.display(),
        "Starting prediction service"
    );

    let app = Application::build(config).await?;
    app.run_until_stopped().await?;
    Ok(())
}
