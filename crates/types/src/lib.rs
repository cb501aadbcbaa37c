//! Shared domain primitives for the clinical trial screener.
//!
//! This crate holds the small data types shared by the relay, the exporters
//! and the REST surface. It deliberately carries no I/O or API concerns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Patient attributes collected by the screening form.
///
/// Every field is optional: the relay forwards whatever the form collected
/// and the exporters substitute display fallbacks for missing values. Labs
/// use a `BTreeMap` so rendered output has a stable key order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PatientRecord {
    /// Patient age in years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// Primary diagnosis in free text (for example "breast cancer").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,

    /// Disease stage in free text (for example "IIIA").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Where the patient is located, in free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<String>,

    /// Laboratory values keyed by lab name (for example "WBC" -> 6.1).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labs: BTreeMap<String, f64>,
}

/// Reference to a clinical trial surfaced by the eligibility analysis.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrialRef {
    /// ClinicalTrials.gov registry number (for example "NCT00000001").
    #[serde(rename = "nctNumber")]
    pub nct_number: String,

    /// Trial title as registered.
    pub title: String,

    /// Why the analysis matched this trial.
    #[serde(default)]
    pub explanation: String,
}
