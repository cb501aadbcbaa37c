//! HTML rendering of the eligibility report.
//!
//! Produces a self-contained printable document embedding the patient
//! attributes, the lab grid and the cleaned result text. Used directly as
//! the fallback download when PDF rendering is unavailable.

use chrono::Utc;
use screener_types::PatientRecord;

/// Escape text for embedding in HTML element content or attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn display_or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => escape(v),
        _ => "N/A".to_string(),
    }
}

/// Render the report as a complete HTML document.
///
/// Infallible by construction; this is what makes the exporter's degraded
/// success guarantee hold.
pub fn render_html(patient: &PatientRecord, cleaned_result: &str) -> String {
    let age = patient
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "N/A".into());
    let disease = display_or_na(patient.disease.as_deref());
    let stage = display_or_na(patient.stage.as_deref());
    let geography = display_or_na(patient.geography.as_deref());

    let labs: String = patient
        .labs
        .iter()
        .map(|(name, value)| {
            format!(
                "<div class=\"lab-item\"><strong>{}:</strong> {}</div>",
                escape(name),
                value
            )
        })
        .collect();

    let generated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Clinical Trial Eligibility Report</title>
<style>
  body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; font-size: 14px; }}
  h1 {{ color: #2563eb; border-bottom: 3px solid #2563eb; padding-bottom: 10px; }}
  h2 {{ color: #1e40af; margin-top: 30px; }}
  .patient-info {{ background: #f8fafc; padding: 20px; border-left: 5px solid #2563eb; margin: 20px 0; border-radius: 5px; }}
  .patient-grid {{ display: grid; grid-template-columns: 1fr 1fr; gap: 15px; }}
  .lab-values {{ display: grid; grid-template-columns: repeat(2, 1fr); gap: 12px; margin: 15px 0; }}
  .lab-item {{ background: white; padding: 12px; border-radius: 6px; border: 1px solid #d1d5db; }}
  .analysis-content {{ white-space: pre-wrap; background: #f8fafc; padding: 20px; border-radius: 8px; border: 1px solid #e2e8f0; font-family: 'Courier New', monospace; font-size: 12px; }}
  .timestamp {{ color: #64748b; font-size: 12px; text-align: right; margin-top: 40px; border-top: 1px solid #e2e8f0; padding-top: 20px; }}
  @media print {{ body {{ margin: 0; }} }}
</style>
</head>
<body>
<h1>Clinical Trial Eligibility Report</h1>
<div class="patient-info">
  <h2>Patient Information</h2>
  <div class="patient-grid">
    <div><strong>Age:</strong> {age}</div>
    <div><strong>Disease:</strong> {disease}</div>
    <div><strong>Stage:</strong> {stage}</div>
    <div><strong>Geography:</strong> {geography}</div>
  </div>
  <h3>Laboratory Values</h3>
  <div class="lab-values">{labs}</div>
</div>
<div class="result">
  <h2>Clinical Trial Eligibility Analysis</h2>
  <div class="analysis-content">{analysis}</div>
</div>
<div class="timestamp">Generated on: {generated}</div>
</body>
</html>
"#,
        analysis = escape(cleaned_result),
    )
}
