mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::*;
use http_body_util::BodyExt;
use prediction_service::startup::Application;
use tower::util::ServiceExt;

#[tokio::test]
async fn health_check_reports_service_and_model() {
    let router = router_with_shipped_model();

    let (status, body) = get(&router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "prediction-service");
    assert_eq!(body["model"], "logistic_regression");
}

#[tokio::test]
async fn readiness_check_returns_ready() {
    let router = router_with_shipped_model();

    let (status, body) = get(&router, "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn model_endpoint_lists_feature_columns_in_order() {
    let router = router_with_shipped_model();

    let (status, body) = get(&router, "/model").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "logistic_regression");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(
        body["feature_columns"],
        serde_json::json!(prediction_service::models::FEATURE_COLUMNS)
    );
}

#[tokio::test]
async fn metrics_endpoint_serves_plain_text() {
    let router = router_with_shipped_model();
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn openapi_document_describes_predict() {
    let router = router_with_shipped_model();

    let (status, body) = get(&router, "/.well-known/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/predict"]["post"].is_object());
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let router = router_with_shipped_model();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "req-42");
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn cors_preflight_echoes_origin_with_credentials() {
    let router = router_with_shipped_model();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/predict")
        .header(header::ORIGIN, "https://clinic.example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://clinic.example.org"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert!(headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("POST")));
}

#[tokio::test]
async fn simple_cross_origin_request_is_allowed() {
    let router = router_with_shipped_model();
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(valid_payload().to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body.get("predicted category ").is_some());
}

async fn spawn_app() -> String {
    let config = test_config(shipped_model_path());
    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(app.run_until_stopped());

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn served_over_tcp_predicts_end_to_end() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{}/health", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(health.status().is_success());

    let response = client
        .post(format!("{}/predict", address))
        .json(&valid_payload())
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["predicted category "], "Non Diabetic");
}

#[tokio::test]
async fn served_over_tcp_rejects_invalid_age() {
    let address = spawn_app().await;
    let mut payload = valid_payload();
    payload["Age"] = serde_json::json!(150);

    let response = reqwest::Client::new()
        .post(format!("{}/predict", address))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 422);
}
