pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use service_core::axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Response},
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post},
    BoxError, Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::any::Any;
use std::sync::Arc;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any as AnyCors, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{CorsConfig, PredictionConfig};
use crate::services::Classifier;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::predict::predict,
        handlers::model::model_info,
        handlers::health::health_check,
        handlers::health::readiness_check,
    ),
    components(
        schemas(
            dtos::PredictRequest,
            dtos::PredictionResponse,
            dtos::ErrorResponse,
            models::PredictionLabel,
            services::ModelInfo,
        )
    ),
    tags(
        (name = "Prediction", description = "Diabetes risk prediction"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: PredictionConfig,
    pub model: Arc<dyn Classifier>,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let cors = cors_layer(&state.config.cors)?;

    let mut app = Router::new()
        .route("/predict", post(handlers::predict::predict))
        .route("/model", get(handlers::model::model_info))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics));

    if state.config.swagger.enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        // Keep the OpenAPI JSON for programmatic access
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        .fallback(not_found)
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(state.config.request_timeout())),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}

fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, AppError> {
    let origins = if config.allows_any_origin() {
        None
    } else {
        Some(
            config
                .allowed_origins
                .iter()
                .map(|o| {
                    o.parse::<HeaderValue>().map_err(|e| {
                        AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                    })
                })
                .collect::<Result<Vec<HeaderValue>, AppError>>()?,
        )
    };

    // Browsers refuse `*` together with credentials, so echo the caller instead.
    let layer = if config.allow_credentials {
        CorsLayer::new()
            .allow_origin(origins.map_or_else(AllowOrigin::mirror_request, AllowOrigin::list))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(origins.map_or_else(AllowOrigin::any, AllowOrigin::list))
            .allow_methods(AnyCors)
            .allow_headers(AnyCors)
    };

    Ok(layer)
}

async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("No route for this path"))
}

async fn handle_timeout(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request exceeded the configured timeout");
        AppError::RequestTimeout
    } else {
        AppError::InternalError(anyhow::anyhow!("middleware failure: {}", err))
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<service_core::axum::body::Body> {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %message, "Request handler panicked");

    AppError::InternalError(anyhow::anyhow!("handler panicked")).into_response()
}
