//! FHIR wire/boundary support for the clinical trial screener.
//!
//! This crate provides **wire models** and a builder for the eligibility
//! export bundle served as `application/fhir+json`:
//! - a collection Bundle carrying Patient, Condition, Observation and
//!   ClinicalImpression entries
//!
//! This crate focuses on:
//! - FHIR semantic alignment (without FHIR REST transport)
//! - serialisation into the wire JSON shape
//! - translation from domain primitives into wire structs
//!
//! Bundles are assembled fresh per export call. Identifiers are derived from
//! the current timestamp and carry no cross-request identity.

pub mod bundle;

// Re-export the builder entry point and top-level wire type
pub use bundle::{build_bundle, Bundle};
