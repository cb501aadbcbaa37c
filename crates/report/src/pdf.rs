//! PDF rendering of the eligibility report via `printpdf`.
//!
//! Layout is a manual cursor over A4 pages with the builtin Helvetica
//! fonts. The analysis text is word-wrapped and paginated; everything else
//! fits the first page.

use std::io::BufWriter;

use printpdf::*;

use crate::{ReportError, ReportResult};
use screener_types::PatientRecord;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_MM: f32 = 280.0;
const BOTTOM_MARGIN_MM: f32 = 20.0;
const LEFT_MM: f32 = 20.0;
const INDENT_MM: f32 = 25.0;

/// Wrap width for the monospace-ish analysis body at 9pt Helvetica.
const WRAP_COLUMNS: usize = 90;

/// Cursor over the document: tracks the active layer and vertical position,
/// inserting a fresh page when a line would cross the bottom margin.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
}

impl<'a> Cursor<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y: Mm(TOP_MM),
        }
    }

    fn advance(&mut self, delta_mm: f32) {
        self.y -= Mm(delta_mm);
        if self.y.0 < BOTTOM_MARGIN_MM {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = Mm(TOP_MM);
        }
    }

    fn text(&mut self, text: &str, size: f32, x_mm: f32, font: &IndirectFontRef, leading_mm: f32) {
        self.layer.use_text(text, size, Mm(x_mm), self.y, font);
        self.advance(leading_mm);
    }
}

/// Render the eligibility report as PDF bytes.
///
/// # Errors
///
/// Returns [`ReportError`] when a builtin font cannot be registered or the
/// document cannot be written out. Callers treat any error as a signal to
/// fall back to HTML.
pub fn render_pdf(patient: &PatientRecord, cleaned_result: &str) -> ReportResult<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Clinical Trial Eligibility Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let layer = doc.get_page(page1).get_layer(layer1);

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Font(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Font(e.to_string()))?;

    let mut cursor = Cursor::new(&doc, layer);

    // Title
    cursor.text("Clinical Trial Eligibility Report", 16.0, LEFT_MM, &bold, 12.0);

    // Patient attributes
    cursor.text("PATIENT INFORMATION", 11.0, LEFT_MM, &bold, 6.0);
    let age = patient
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "N/A".into());
    let rows = [
        format!("Age: {age}"),
        format!("Disease: {}", patient.disease.as_deref().unwrap_or("N/A")),
        format!("Stage: {}", patient.stage.as_deref().unwrap_or("N/A")),
        format!(
            "Geography: {}",
            patient.geography.as_deref().unwrap_or("N/A")
        ),
    ];
    for row in &rows {
        cursor.text(row, 10.0, INDENT_MM, &font, 5.0);
    }
    cursor.advance(3.0);

    // Lab grid
    if !patient.labs.is_empty() {
        cursor.text("LABORATORY VALUES", 11.0, LEFT_MM, &bold, 6.0);
        for (name, value) in &patient.labs {
            cursor.text(&format!("{name}: {value}"), 10.0, INDENT_MM, &font, 5.0);
        }
        cursor.advance(3.0);
    }

    // Analysis body, wrapped and paginated
    cursor.text("CLINICAL TRIAL ELIGIBILITY ANALYSIS", 11.0, LEFT_MM, &bold, 6.0);
    for raw_line in cleaned_result.lines() {
        if raw_line.trim().is_empty() {
            cursor.advance(4.0);
            continue;
        }
        for line in wrap_text(raw_line, WRAP_COLUMNS) {
            cursor.text(&line, 9.0, INDENT_MM, &font, 4.5);
        }
    }

    // Footer timestamp
    cursor.advance(6.0);
    let generated = chrono::Utc::now().format("Generated on: %Y-%m-%d %H:%M:%S UTC");
    cursor.text(&generated.to_string(), 8.0, LEFT_MM, &font, 0.0);
    drop(cursor);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Write(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| ReportError::Write(e.to_string()))
}

/// Greedy word wrap at a column count.
///
/// Words longer than the width are emitted on their own line rather than
/// split, which is fine for NCT numbers and URLs at this font size.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn wraps_at_width() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn long_words_get_their_own_line() {
        let lines = wrap_text("short NCT00000001NCT00000001NCT00000001 tail", 10);
        assert_eq!(lines[0], "short");
        assert_eq!(lines[1], "NCT00000001NCT00000001NCT00000001");
        assert_eq!(lines[2], "tail");
    }

    #[test]
    fn empty_input_yields_single_blank_line() {
        assert_eq!(wrap_text("", 80), vec![String::new()]);
    }

    #[test]
    fn renders_valid_pdf_header() {
        let mut labs = BTreeMap::new();
        labs.insert("WBC".to_string(), 6.1);
        let patient = PatientRecord {
            age: Some(58),
            disease: Some("breast cancer".into()),
            stage: Some("IIIA".into()),
            geography: Some("Mumbai".into()),
            labs,
        };
        let bytes = render_pdf(&patient, "Eligible for NCT00000001").unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn paginates_long_analysis_text() {
        let long_text = (0..400)
            .map(|i| format!("line {i} of a very long eligibility analysis"))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = render_pdf(&PatientRecord::default(), &long_text).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
        // More content than one page can hold must still render.
        assert!(bytes.len() > 2_000);
    }
}
