//! Printable eligibility report exporter.
//!
//! Renders patient attributes plus the eligibility result text into a
//! downloadable report. The primary path produces a PDF; when PDF rendering
//! fails for any reason the exporter falls back to the equivalent HTML
//! document. The fallback is degraded success, not failure: callers learn
//! about it only through the content type and filename.
//!
//! The result text is passed through the export-artifact cleaner before
//! embedding; display-markup stripping is a different pipeline with a
//! different consumer and is not applied here.

#![warn(rust_2018_idioms)]

pub mod html;
pub mod pdf;

use screener_core::clean_export_artifacts;
use screener_types::PatientRecord;

/// Errors from the PDF rendering path.
///
/// These never escape [`render`]; they only decide the fallback.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF write error: {0}")]
    Write(String),
}

/// Type alias for Results that can fail with a [`ReportError`].
pub type ReportResult<T> = Result<T, ReportError>;

/// A rendered report plus the response metadata that describes it.
#[derive(Clone, Debug)]
pub struct ReportOutput {
    /// Document bytes (PDF or UTF-8 HTML).
    pub bytes: Vec<u8>,
    /// `application/pdf` or `text/html`.
    pub content_type: &'static str,
    /// Attachment filename matching the content type.
    pub filename: &'static str,
}

/// Render the eligibility report, PDF first with HTML fallback.
///
/// This function is total: the HTML path cannot fail, so a report is always
/// produced. A failed PDF render is logged and downgraded.
pub fn render(patient: &PatientRecord, result_text: &str) -> ReportOutput {
    let cleaned = clean_export_artifacts(result_text);

    match pdf::render_pdf(patient, &cleaned) {
        Ok(bytes) => ReportOutput {
            bytes,
            content_type: "application/pdf",
            filename: "eligibility-report.pdf",
        },
        Err(e) => {
            tracing::warn!("PDF generation failed, falling back to HTML: {e}");
            ReportOutput {
                bytes: html::render_html(patient, &cleaned).into_bytes(),
                content_type: "text/html",
                filename: "eligibility-report.html",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_patient() -> PatientRecord {
        let mut labs = BTreeMap::new();
        labs.insert("WBC".to_string(), 6.1);
        PatientRecord {
            age: Some(58),
            disease: Some("breast cancer".into()),
            stage: Some("IIIA".into()),
            geography: Some("Mumbai, India".into()),
            labs,
        }
    }

    #[test]
    fn render_produces_pdf_by_default() {
        let output = render(&sample_patient(), "Eligible for NCT00000001");
        assert_eq!(output.content_type, "application/pdf");
        assert_eq!(output.filename, "eligibility-report.pdf");
        // PDF magic bytes.
        assert_eq!(&output.bytes[..5], b"%PDF-");
    }

    #[test]
    fn render_cleans_export_artifacts() {
        // A stray `)` line before a trial number must not survive into the
        // embedded text; verify via the HTML path where text is inspectable.
        let html = html::render_html(
            &sample_patient(),
            &clean_export_artifacts("\n)\nNCT12345678 trial"),
        );
        assert!(html.contains("NCT12345678 trial"));
        assert!(!html.contains(")\nNCT12345678"));
    }
}
