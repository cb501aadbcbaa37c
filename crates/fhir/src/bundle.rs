//! Eligibility export bundle: wire models and builder.
//!
//! Responsibilities:
//! - Define serialise-only wire structs matching the FHIR JSON shape
//! - Assemble a collection bundle from patient attributes, the normalised
//!   result text and an optional trial list
//! - Map known lab names onto LOINC codes and units, with a generic
//!   fallback for unrecognised labs
//!
//! Notes:
//! - Bundle and impression identifiers derive from the wall clock and are
//!   explicitly non-reproducible across calls
//! - The impression summary truncates the result text at
//!   [`SUMMARY_MAX_CHARS`] characters with a `...` marker

use chrono::{Datelike, Utc};
use serde::Serialize;

use screener_types::{PatientRecord, TrialRef};

/// Maximum number of characters embedded in the impression summary.
pub const SUMMARY_MAX_CHARS: usize = 1000;

/// Maximum number of trial findings embedded in the impression.
const MAX_TRIAL_FINDINGS: usize = 15;

const BUNDLE_ID_SYSTEM: &str = "http://clinical-trial-screener.com/bundle-id";
const PATIENT_ID_SYSTEM: &str = "http://clinical-trial-screener.com/patient-id";
const IMPRESSION_ID_SYSTEM: &str = "http://clinical-trial-screener.com/impression-id";
const LOINC_SYSTEM: &str = "http://loinc.org";
const SNOMED_SYSTEM: &str = "http://snomed.info/sct";
const TRIALS_SYSTEM: &str = "http://clinicaltrials.gov";

/// Generic LOINC code for an otherwise-unmapped laboratory result.
const LOINC_GENERIC_LAB: &str = "33747-0";

// ============================================================================
// Wire types
// ============================================================================

/// Wire representation of the exported collection bundle.
#[derive(Clone, Debug, Serialize)]
pub struct Bundle {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub id: String,
    pub meta: Meta,
    pub identifier: Identifier,
    #[serde(rename = "type")]
    pub bundle_type: &'static str,
    pub timestamp: String,
    pub entry: Vec<Entry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Meta {
    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub profile: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Entry {
    #[serde(rename = "fullUrl")]
    pub full_url: String,
    pub resource: Resource,
}

/// Typed resources carried by bundle entries.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Patient(PatientResource),
    Condition(ConditionResource),
    Observation(ObservationResource),
    ClinicalImpression(ClinicalImpressionResource),
}

#[derive(Clone, Debug, Serialize)]
pub struct PatientResource {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub id: String,
    pub meta: Meta,
    pub identifier: Vec<Identifier>,
    pub active: bool,
    #[serde(rename = "birthDate")]
    pub birth_date: String,
    pub address: Vec<Address>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Address {
    #[serde(rename = "use")]
    pub use_type: &'static str,
    pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConditionResource {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub id: String,
    pub meta: Meta,
    #[serde(rename = "clinicalStatus")]
    pub clinical_status: CodeableConcept,
    #[serde(rename = "verificationStatus")]
    pub verification_status: CodeableConcept,
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(rename = "recordedDate")]
    pub recorded_date: String,
    pub stage: Vec<ConditionStage>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConditionStage {
    pub summary: TextOnly,
}

#[derive(Clone, Debug, Serialize)]
pub struct TextOnly {
    pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ObservationResource {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub id: String,
    pub meta: Meta,
    pub status: &'static str,
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(rename = "effectiveDateTime")]
    pub effective_date_time: String,
    #[serde(rename = "valueQuantity")]
    pub value_quantity: Quantity,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClinicalImpressionResource {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub id: String,
    pub meta: Meta,
    pub identifier: Vec<Identifier>,
    pub status: &'static str,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(rename = "effectiveDateTime")]
    pub effective_date_time: String,
    pub date: String,
    pub assessor: DisplayOnly,
    pub summary: String,
    pub finding: Vec<Finding>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DisplayOnly {
    pub display: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Finding {
    #[serde(rename = "itemCodeableConcept")]
    pub item_codeable_concept: CodeableConcept,
    pub basis: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Reference {
    pub reference: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

// ============================================================================
// Builder
// ============================================================================

/// Assemble the eligibility export bundle.
///
/// Deterministic given its inputs except for the timestamp-derived bundle
/// identifier and the embedded date/time fields.
///
/// # Arguments
///
/// * `patient` - Patient attributes collected by the screening form
/// * `result_text` - Normalised eligibility result text (non-empty by
///   contract; the normaliser degrades rather than fails)
/// * `trials` - Trials surfaced by the analysis; at most
///   fifteen findings are embedded
pub fn build_bundle(patient: &PatientRecord, result_text: &str, trials: &[TrialRef]) -> Bundle {
    let now = Utc::now();
    let now_iso = now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let bundle_id = format!("eligibility-{}", now.timestamp_millis());

    let mut entries = vec![
        Entry {
            full_url: "urn:uuid:patient-1".into(),
            resource: Resource::Patient(patient_resource(patient)),
        },
        Entry {
            full_url: "urn:uuid:condition-1".into(),
            resource: Resource::Condition(condition_resource(patient, &now_iso)),
        },
    ];

    for (index, (lab_name, value)) in patient.labs.iter().enumerate() {
        entries.push(Entry {
            full_url: format!("urn:uuid:observation-{}", index + 1),
            resource: Resource::Observation(observation_resource(
                index + 1,
                lab_name,
                *value,
                &now_iso,
            )),
        });
    }

    entries.push(Entry {
        full_url: "urn:uuid:clinical-impression-1".into(),
        resource: Resource::ClinicalImpression(impression_resource(result_text, trials, &now_iso)),
    });

    Bundle {
        resource_type: "Bundle",
        id: bundle_id.clone(),
        meta: Meta {
            last_updated: Some(now_iso.clone()),
            profile: vec!["http://hl7.org/fhir/StructureDefinition/Bundle".into()],
        },
        identifier: Identifier {
            system: BUNDLE_ID_SYSTEM.into(),
            value: bundle_id,
        },
        bundle_type: "collection",
        timestamp: now_iso,
        entry: entries,
    }
}

fn profile_meta(resource: &str) -> Meta {
    Meta {
        last_updated: None,
        profile: vec![format!(
            "http://hl7.org/fhir/StructureDefinition/{resource}"
        )],
    }
}

fn patient_resource(patient: &PatientRecord) -> PatientResource {
    // The form collects age, not date of birth; approximate with January 1st
    // of the derived birth year. A missing age falls back to 58, the form's
    // prefilled value.
    let age = patient.age.unwrap_or(58);
    let birth_date = format!("{:04}-01-01", Utc::now().year() - age as i32);

    PatientResource {
        resource_type: "Patient",
        id: "patient-1".into(),
        meta: profile_meta("Patient"),
        identifier: vec![Identifier {
            system: PATIENT_ID_SYSTEM.into(),
            value: "patient-1".into(),
        }],
        active: true,
        birth_date,
        address: vec![Address {
            use_type: "home",
            text: patient
                .geography
                .clone()
                .unwrap_or_else(|| "Unknown".into()),
        }],
    }
}

fn condition_resource(patient: &PatientRecord, now_iso: &str) -> ConditionResource {
    ConditionResource {
        resource_type: "Condition",
        id: "condition-1".into(),
        meta: profile_meta("Condition"),
        clinical_status: CodeableConcept {
            coding: vec![Coding {
                system: "http://terminology.hl7.org/CodeSystem/condition-clinical".into(),
                code: "active".into(),
                display: Some("Active".into()),
            }],
            text: None,
        },
        verification_status: CodeableConcept {
            coding: vec![Coding {
                system: "http://terminology.hl7.org/CodeSystem/condition-ver-status".into(),
                code: "confirmed".into(),
                display: Some("Confirmed".into()),
            }],
            text: None,
        },
        category: vec![CodeableConcept {
            coding: vec![Coding {
                system: "http://terminology.hl7.org/CodeSystem/condition-category".into(),
                code: "encounter-diagnosis".into(),
                display: Some("Encounter Diagnosis".into()),
            }],
            text: None,
        }],
        // The registry coding is fixed to the screening programme's target
        // condition; the free-text diagnosis from the form rides in `text`.
        code: CodeableConcept {
            coding: vec![Coding {
                system: SNOMED_SYSTEM.into(),
                code: "254837009".into(),
                display: Some("Malignant neoplasm of breast".into()),
            }],
            text: Some(
                patient
                    .disease
                    .clone()
                    .unwrap_or_else(|| "breast cancer".into()),
            ),
        },
        subject: Reference {
            reference: "urn:uuid:patient-1".into(),
        },
        recorded_date: now_iso.to_string(),
        stage: vec![ConditionStage {
            summary: TextOnly {
                text: patient.stage.clone().unwrap_or_else(|| "IIIA".into()),
            },
        }],
    }
}

fn observation_resource(
    index: usize,
    lab_name: &str,
    value: f64,
    now_iso: &str,
) -> ObservationResource {
    ObservationResource {
        resource_type: "Observation",
        id: format!("observation-{index}"),
        meta: profile_meta("Observation"),
        status: "final",
        category: vec![CodeableConcept {
            coding: vec![Coding {
                system: "http://terminology.hl7.org/CodeSystem/observation-category".into(),
                code: "laboratory".into(),
                display: Some("Laboratory".into()),
            }],
            text: None,
        }],
        code: CodeableConcept {
            coding: vec![Coding {
                system: LOINC_SYSTEM.into(),
                code: loinc_code(lab_name).into(),
                display: Some(lab_name.to_string()),
            }],
            text: Some(lab_name.to_string()),
        },
        subject: Reference {
            reference: "urn:uuid:patient-1".into(),
        },
        effective_date_time: now_iso.to_string(),
        value_quantity: Quantity {
            value,
            unit: lab_unit(lab_name).into(),
        },
    }
}

fn impression_resource(
    result_text: &str,
    trials: &[TrialRef],
    now_iso: &str,
) -> ClinicalImpressionResource {
    ClinicalImpressionResource {
        resource_type: "ClinicalImpression",
        id: "clinical-impression-1".into(),
        meta: profile_meta("ClinicalImpression"),
        identifier: vec![Identifier {
            system: IMPRESSION_ID_SYSTEM.into(),
            value: "eligibility-analysis-1".into(),
        }],
        status: "completed",
        code: CodeableConcept {
            coding: vec![Coding {
                system: SNOMED_SYSTEM.into(),
                code: "386053000".into(),
                display: Some("Evaluation procedure".into()),
            }],
            text: Some("Clinical Trial Eligibility Assessment".into()),
        },
        subject: Reference {
            reference: "urn:uuid:patient-1".into(),
        },
        effective_date_time: now_iso.to_string(),
        date: now_iso.to_string(),
        assessor: DisplayOnly {
            display: "Clinical Trial Screener AI".into(),
        },
        summary: truncate_summary(result_text),
        finding: trials
            .iter()
            .take(MAX_TRIAL_FINDINGS)
            .map(|trial| Finding {
                item_codeable_concept: CodeableConcept {
                    coding: vec![Coding {
                        system: TRIALS_SYSTEM.into(),
                        code: trial.nct_number.clone(),
                        display: Some(trial.title.clone()),
                    }],
                    text: Some(trial.title.clone()),
                },
                basis: trial.explanation.clone(),
            })
            .collect(),
    }
}

/// Truncate the result text for the impression summary, appending a marker
/// when anything was cut.
fn truncate_summary(result_text: &str) -> String {
    let mut chars = result_text.chars();
    let head: String = chars.by_ref().take(SUMMARY_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Map a lab name onto its LOINC code; unknown labs fall back to the
/// generic laboratory-result code.
fn loinc_code(lab_name: &str) -> &'static str {
    match lab_name {
        "WBC" => "6690-2",
        "Hemoglobin" => "718-7",
        "Platelets" => "777-3",
        "Creatinine" => "2160-0",
        _ => LOINC_GENERIC_LAB,
    }
}

/// Map a lab name onto its conventional unit; unknown labs get no unit.
fn lab_unit(lab_name: &str) -> &'static str {
    match lab_name {
        "WBC" => "10*3/uL",
        "Hemoglobin" => "g/dL",
        "Platelets" => "10*3/uL",
        "Creatinine" => "mg/dL",
        _ => "",
    }
}
