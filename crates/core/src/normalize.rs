//! Normalisation of upstream workflow responses into a single result text.
//!
//! The workflow runner has shipped several response shapes over time: deeply
//! nested `outputs[].outputs[].results.*` chains as well as flat top-level
//! `result`/`message`/`text` fields. Rather than branch per shape, the
//! candidate locations are a single ordered table of JSON pointers evaluated
//! first-non-empty-wins, which keeps the priority order testable on its own.
//!
//! This module is pure and total: it never fails. When no candidate matches
//! it degrades to a diagnostic placeholder so downstream consumers (display,
//! PDF, FHIR export) always receive displayable text.

use serde_json::Value;

/// Candidate result locations, highest priority first.
///
/// The nested pointers cover the runner's component-output envelope; the
/// trailing flat pointers cover older and error-path shapes. A candidate
/// only matches when the value at the pointer is a non-empty string, so
/// `.../results/text` matches both "text holds the string directly" and is
/// skipped when `text` is an object handled by an earlier pointer.
const EXTRACTION_RULES: &[&str] = &[
    "/outputs/0/outputs/0/results/text/text",
    "/outputs/0/outputs/0/results/text/data/text",
    "/outputs/0/outputs/0/results/message/text",
    "/outputs/0/outputs/0/results/text",
    "/outputs/0/outputs/0/message/text",
    "/outputs/0/outputs/0/text",
    "/outputs/0/outputs/0/data/text",
    "/result",
    "/message",
    "/text",
    "/data/text",
];

/// Extract the human-readable result text from a parsed upstream body.
///
/// Evaluates [`EXTRACTION_RULES`] in order and returns the first non-empty
/// string. If nothing matches, produces a diagnostic placeholder instead of
/// failing:
///
/// - `outputs` present but empty: the flow ran but returned no component
///   outputs at all,
/// - the first output's nested `outputs` empty: the flow completed but its
///   terminal component produced nothing,
/// - anything else: a placeholder echoing the raw body for diagnosis.
pub fn normalise(body: &Value) -> String {
    for pointer in EXTRACTION_RULES {
        if let Some(text) = body.pointer(pointer).and_then(Value::as_str) {
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    empty_output_placeholder(body)
        .unwrap_or_else(|| format!("Unexpected response structure: {body}"))
}

/// Distinguish the two known empty-output conditions.
///
/// Returns `None` when `outputs` is absent or non-empty at both levels, in
/// which case the caller falls through to the raw-body placeholder.
fn empty_output_placeholder(body: &Value) -> Option<String> {
    let outputs = body.get("outputs")?.as_array()?;

    if outputs.is_empty() {
        return Some(
            "The workflow runner returned an empty response. This might indicate an issue \
             with the flow configuration or the input data format."
                .to_string(),
        );
    }

    let inner = outputs.first()?.get("outputs")?.as_array()?;
    if inner.is_empty() {
        return Some(
            "The workflow completed but produced no output. Please check your flow \
             configuration."
                .to_string(),
        );
    }

    None
}
