//! # Screener Core
//!
//! Core relay logic for the clinical trial screener.
//!
//! This crate contains the pieces between the REST boundary and the upstream
//! AI workflow runner:
//! - validated relay configuration ([`config`])
//! - the outbound workflow client with a bounded deadline ([`upstream`])
//! - response normalisation into a single result text ([`normalize`])
//! - inbound payload coercion/validation ([`payload`])
//! - result-text sanitisation pipelines ([`sanitize`])
//!
//! **No API concerns**: HTTP routing, status mapping and OpenAPI documentation
//! belong in `api-rest` and `api-shared`.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod normalize;
pub mod payload;
pub mod sanitize;
pub mod upstream;

pub use config::{
    deadline_from_env_value, optional_env_value, RelayConfig, DEFAULT_CALLER_DEADLINE_SECS,
    DEFAULT_CLIENT_DEADLINE_SECS,
};
pub use error::{RelayError, RelayResult};
pub use normalize::normalise;
pub use payload::{coerce_input_value, validate_patient_payload};
pub use sanitize::{clean_export_artifacts, strip_display_markup};
pub use upstream::WorkflowClient;
