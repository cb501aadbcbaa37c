//! End-to-end tests for the screener REST router.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`;
//! relay tests additionally spawn a real local mock of the upstream workflow
//! runner so the full HTTP path is exercised, deadline included.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::post,
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use api_rest::{app, AppState};
use screener_core::RelayConfig;

/// Spawn a mock workflow runner and return its run-endpoint URL.
async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/run")
}

fn app_for(upstream_url: String, client_deadline: Duration) -> Router {
    let cfg = Arc::new(
        RelayConfig::new(
            upstream_url,
            None,
            None,
            client_deadline,
            client_deadline + Duration::from_secs(30),
        )
        .unwrap(),
    );
    app(AppState::new(cfg).unwrap())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_alive() {
    let app = app_for("http://127.0.0.1:9/run".into(), Duration::from_secs(1));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn eligibility_returns_normalised_result() {
    let upstream = Router::new().route(
        "/run",
        post(|| async {
            axum::Json(serde_json::json!({
                "outputs": [ { "outputs": [ {
                    "results": { "text": { "text": "Eligible for NCT00000001" } }
                } ] } ]
            }))
        }),
    );
    let url = spawn_upstream(upstream).await;
    let app = app_for(url, Duration::from_secs(5));

    let response = app
        .oneshot(post_json(
            "/api/eligibility",
            r#"{"input_value":"{\"age\":58,\"disease\":\"breast cancer\"}"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"], "Eligible for NCT00000001");
}

#[tokio::test]
async fn eligibility_accepts_structured_input_value() {
    let upstream = Router::new().route(
        "/run",
        post(|| async { axum::Json(serde_json::json!({ "result": "No matches" })) }),
    );
    let url = spawn_upstream(upstream).await;
    let app = app_for(url, Duration::from_secs(5));

    let response = app
        .oneshot(post_json(
            "/api/eligibility",
            r#"{"input_value":{"age":58,"labs":{"WBC":5.2}}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"], "No matches");
}

#[tokio::test]
async fn eligibility_rejects_missing_input_value() {
    let app = app_for("http://127.0.0.1:9/run".into(), Duration::from_secs(1));

    let response = app
        .oneshot(post_json("/api/eligibility", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid request");
    assert!(json["details"]
        .as_str()
        .unwrap()
        .contains("input_value is required"));
}

#[tokio::test]
async fn eligibility_rejects_malformed_body() {
    let app = app_for("http://127.0.0.1:9/run".into(), Duration::from_secs(1));

    let response = app
        .oneshot(post_json("/api/eligibility", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid request");
}

#[tokio::test]
async fn eligibility_times_out_as_504() {
    let upstream = Router::new().route(
        "/run",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "{\"result\":\"too late\"}"
        }),
    );
    let url = spawn_upstream(upstream).await;
    let app = app_for(url, Duration::from_millis(100));

    let response = app
        .oneshot(post_json("/api/eligibility", r#"{"input_value":"{}"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("timeout"));
    assert!(json["details"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn eligibility_maps_html_body_to_502() {
    let upstream = Router::new().route(
        "/run",
        post(|| async { "<!doctype html><html><body>login page</body></html>" }),
    );
    let url = spawn_upstream(upstream).await;
    let app = app_for(url, Duration::from_secs(5));

    let response = app
        .oneshot(post_json("/api/eligibility", r#"{"input_value":"{}"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Malformed upstream response");
}

#[tokio::test]
async fn eligibility_maps_upstream_failure_to_502() {
    let upstream = Router::new().route(
        "/run",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "{\"detail\":\"flow crashed\"}",
            )
        }),
    );
    let url = spawn_upstream(upstream).await;
    let app = app_for(url, Duration::from_secs(5));

    let response = app
        .oneshot(post_json("/api/eligibility", r#"{"input_value":"{}"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "External API error");
    assert!(json["details"].as_str().unwrap().contains("flow crashed"));
}

#[tokio::test]
async fn eligibility_maps_unreachable_upstream_to_503() {
    // Nothing listens on this port.
    let app = app_for("http://127.0.0.1:9/run".into(), Duration::from_secs(2));

    let response = app
        .oneshot(post_json("/api/eligibility", r#"{"input_value":"{}"}"#))
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::SERVICE_UNAVAILABLE
            || response.status() == StatusCode::GATEWAY_TIMEOUT,
        "got {}",
        response.status()
    );
}

#[tokio::test]
async fn wrong_method_gets_405_with_error_body() {
    let app = app_for("http://127.0.0.1:9/run".into(), Duration::from_secs(1));

    let response = app
        .oneshot(
            Request::get("/api/eligibility")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Method not allowed");
}

#[tokio::test]
async fn fhir_export_returns_bundle_attachment() {
    let app = app_for("http://127.0.0.1:9/run".into(), Duration::from_secs(1));

    let response = app
        .oneshot(post_json(
            "/api/export/fhir",
            r#"{
                "patientData": {
                    "age": 58,
                    "disease": "breast cancer",
                    "stage": "IIIA",
                    "labs": {"WBC": 5.2, "Hemoglobin": 11.8}
                },
                "eligibilityResult": "Eligible for NCT00000001",
                "trials": [
                    {"nctNumber": "NCT00000001", "title": "Trial A", "explanation": "Stage match"}
                ]
            }"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/fhir+json"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"clinical-trial-eligibility.json\""
    );

    let json = body_json(response).await;
    assert_eq!(json["resourceType"], "Bundle");
    let entries = json["entry"].as_array().unwrap();
    // Patient, Condition, two Observations, ClinicalImpression.
    assert_eq!(entries.len(), 5);
}

#[tokio::test]
async fn fhir_export_rejects_invalid_body() {
    let app = app_for("http://127.0.0.1:9/run".into(), Duration::from_secs(1));

    let response = app
        .oneshot(post_json("/api/export/fhir", r#"{"patientData":{}}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_export_returns_pdf_attachment() {
    let app = app_for("http://127.0.0.1:9/run".into(), Duration::from_secs(1));

    let response = app
        .oneshot(post_json(
            "/api/export/report",
            r#"{
                "patientData": {"age": 58, "disease": "breast cancer"},
                "eligibilityResult": "Eligible for NCT00000001"
            }"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"eligibility-report.pdf\""
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF-"));
}
