//! # API REST
//!
//! REST API implementation for the clinical trial screener.
//!
//! Handles:
//! - HTTP endpoints with axum (relay, exports, health)
//! - OpenAPI/Swagger documentation
//! - Mapping of relay failures onto caller-visible status codes
//!
//! Uses `api-shared` for wire types and `screener-core` for the relay logic.

#![warn(rust_2018_idioms)]

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    EligibilityReq, EligibilityRes, ErrorBody, ExportFhirReq, ExportReportReq, HealthRes,
    HealthService,
};
use screener_core::{
    coerce_input_value, validate_patient_payload, RelayConfig, RelayError, RelayResult,
    WorkflowClient,
};

/// Application state for the REST API server.
///
/// Contains shared state that needs to be accessible to all request handlers,
/// including the workflow client used for outbound calls. Cloning is cheap;
/// the underlying HTTP client pool is shared.
#[derive(Clone)]
pub struct AppState {
    workflow: WorkflowClient,
}

impl AppState {
    /// Build application state from resolved relay configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the workflow client cannot be
    /// constructed.
    pub fn new(cfg: Arc<RelayConfig>) -> RelayResult<Self> {
        Ok(Self {
            workflow: WorkflowClient::new(cfg)?,
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, check_eligibility, export_fhir, export_report),
    components(schemas(
        HealthRes,
        EligibilityReq,
        EligibilityRes,
        ErrorBody,
        ExportFhirReq,
        ExportReportReq,
    ))
)]
struct ApiDoc;

/// Build the screener REST router.
///
/// Every route is POST-only apart from `/health`; other methods receive a
/// 405 with the standard error body rather than axum's bare response.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/eligibility",
            post(check_eligibility).fallback(method_not_allowed),
        )
        .route(
            "/api/export/fhir",
            post(export_fhir).fallback(method_not_allowed),
        )
        .route(
            "/api/export/report",
            post(export_report).fallback(method_not_allowed),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error exit shared by all handlers.
type ErrorResponse = (StatusCode, Json<ErrorBody>);

/// Map a relay failure onto the caller-visible status and error body.
///
/// The `error` field stays a stable summary per failure class; diagnostic
/// context goes to `details` and never the other way round.
fn map_relay_error(err: RelayError) -> ErrorResponse {
    match err {
        RelayError::BadRequest(details) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::with_details("Invalid request", details)),
        ),
        RelayError::Timeout(secs) => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(ErrorBody::with_details(
                "Request timeout - analysis is taking longer than expected. Please try again.",
                format!(
                    "The AI analysis timed out after {secs} seconds. This may be due to high \
                     server load."
                ),
            )),
        ),
        RelayError::Unavailable(details) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorBody::with_details(
                "Connection error - unable to reach the AI analysis service",
                details,
            )),
        ),
        RelayError::Upstream { status, body } => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody::with_details(
                "External API error",
                format!("upstream status {status}: {body}"),
            )),
        ),
        RelayError::BadUpstreamFormat(details) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody::with_details(
                "Malformed upstream response",
                details,
            )),
        ),
        RelayError::Internal(details) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::with_details("Internal server error", details)),
        ),
    }
}

/// Map a JSON body rejection onto the standard 400 error body.
fn map_body_rejection(rejection: JsonRejection) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::with_details(
            "Invalid request",
            rejection.body_text(),
        )),
    )
}

/// 405 exit keeping the documented error body shape.
async fn method_not_allowed() -> ErrorResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new("Method not allowed")),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/eligibility",
    request_body = EligibilityReq,
    responses(
        (status = 200, description = "Normalised eligibility result", body = EligibilityRes),
        (status = 400, description = "Missing or invalid patient payload", body = ErrorBody),
        (status = 405, description = "Method not allowed", body = ErrorBody),
        (status = 502, description = "Malformed upstream response", body = ErrorBody),
        (status = 503, description = "Upstream unreachable", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// Relay an eligibility check to the upstream workflow runner.
///
/// Validates the inbound patient payload (coercing structured values to a
/// string), performs exactly one outbound workflow call with a bounded
/// deadline, and returns the normalised result text.
#[axum::debug_handler]
async fn check_eligibility(
    State(state): State<AppState>,
    body: Result<Json<EligibilityReq>, JsonRejection>,
) -> Result<Json<EligibilityRes>, ErrorResponse> {
    let Json(req) = body.map_err(map_body_rejection)?;

    let input_value = req.input_value.ok_or_else(|| {
        map_relay_error(RelayError::BadRequest("input_value is required".into()))
    })?;

    let payload = coerce_input_value(&input_value).map_err(map_relay_error)?;
    validate_patient_payload(&payload).map_err(map_relay_error)?;

    tracing::info!(payload_len = payload.len(), "relaying eligibility check");

    let result = state.workflow.invoke(&payload).await.map_err(|e| {
        tracing::error!("eligibility relay failed: {e}");
        map_relay_error(e)
    })?;

    Ok(Json(EligibilityRes { result }))
}

#[utoipa::path(
    post,
    path = "/api/export/fhir",
    request_body = ExportFhirReq,
    responses(
        (status = 200, description = "FHIR bundle attachment"),
        (status = 400, description = "Invalid request body", body = ErrorBody),
        (status = 405, description = "Method not allowed", body = ErrorBody)
    )
)]
/// Export patient data plus the eligibility result as a FHIR bundle.
///
/// The bundle is assembled fresh per call; identifiers derive from the
/// current timestamp and carry no cross-request identity.
#[axum::debug_handler]
async fn export_fhir(
    body: Result<Json<ExportFhirReq>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(req) = body.map_err(map_body_rejection)?;

    let bundle = fhir::build_bundle(&req.patient_data, &req.eligibility_result, &req.trials);

    Ok((
        [
            (header::CONTENT_TYPE, "application/fhir+json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"clinical-trial-eligibility.json\"",
            ),
        ],
        Json(bundle),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/export/report",
    request_body = ExportReportReq,
    responses(
        (status = 200, description = "PDF report attachment, or HTML when PDF rendering is unavailable"),
        (status = 400, description = "Invalid request body", body = ErrorBody),
        (status = 405, description = "Method not allowed", body = ErrorBody)
    )
)]
/// Export the eligibility result as a printable report.
///
/// PDF is the primary format; when PDF rendering fails the endpoint falls
/// back to the HTML document with adjusted content type and filename. The
/// fallback is still a 200 - degraded success, not failure.
#[axum::debug_handler]
async fn export_report(
    body: Result<Json<ExportReportReq>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(req) = body.map_err(map_body_rejection)?;

    let output = report::render(&req.patient_data, &req.eligibility_result);

    tracing::info!(
        content_type = output.content_type,
        bytes = output.bytes.len(),
        "report rendered"
    );

    Ok((
        [
            (header::CONTENT_TYPE, output.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output.filename),
            ),
        ],
        output.bytes,
    )
        .into_response())
}
