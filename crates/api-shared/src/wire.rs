//! Wire request/response types for the screener REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use screener_types::{PatientRecord, TrialRef};

/// Inbound eligibility-check request.
///
/// `input_value` is normally a pre-serialised patient JSON string, but
/// structured objects are accepted and re-serialised before forwarding.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct EligibilityReq {
    /// Serialised patient record, or the record itself as an object.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub input_value: Option<serde_json::Value>,
}

/// Successful eligibility-check response.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct EligibilityRes {
    /// Normalised result text from the workflow runner.
    pub result: String,
}

/// Error response body for every failed request.
///
/// `error` is the stable machine-checkable summary; `details` carries
/// free-form diagnostic context. The two are never conflated.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable error summary.
    pub error: String,
    /// Optional diagnostic context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    /// Build an error body with no details.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Build an error body with diagnostic details.
    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Request body for the FHIR bundle export endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ExportFhirReq {
    /// Patient attributes collected by the form.
    #[serde(rename = "patientData")]
    #[schema(value_type = Object)]
    pub patient_data: PatientRecord,
    /// Normalised eligibility result text.
    #[serde(rename = "eligibilityResult")]
    pub eligibility_result: String,
    /// Trials surfaced by the analysis, if the caller parsed any out.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub trials: Vec<TrialRef>,
}

/// Request body for the printable report export endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ExportReportReq {
    /// Patient attributes collected by the form.
    #[serde(rename = "patientData")]
    #[schema(value_type = Object)]
    pub patient_data: PatientRecord,
    /// Normalised eligibility result text.
    #[serde(rename = "eligibilityResult")]
    pub eligibility_result: String,
}

/// Health check response.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct HealthRes {
    /// Whether the service is healthy.
    pub ok: bool,
    /// Human-readable status message.
    pub message: String,
}
