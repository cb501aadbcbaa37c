//! Text sanitisation for the normalised result text.
//!
//! Two independent pipelines live here and must stay separate:
//!
//! - [`strip_display_markup`] prepares result text for plain display by
//!   removing lightweight markup syntax wholesale.
//! - [`clean_export_artifacts`] repairs a narrow set of formatting artifacts
//!   the workflow runner emits around trial identifiers, for embedding in
//!   the printable report.
//!
//! They serve different consumers with different correctness requirements,
//! so neither delegates to the other.

use std::sync::LazyLock;

use regex::Regex;

static CODE_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)`{1,3}.*?`{1,3}").expect("valid code span regex")
});
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\)").expect("valid image regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(.*?\)").expect("valid link regex"));
static MARKUP_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_~#>`-]+").expect("valid markup chars regex"));
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid blank run regex"));

static STRAY_PAREN_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\)\s*$").expect("valid stray paren regex"));
static PAREN_NCT_LINE_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\)\s*NCT").expect("valid paren NCT line regex"));
static PAREN_NCT_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)\s*NCT").expect("valid inline paren NCT regex"));

/// Strip lightweight markup from result text for plain display.
///
/// Removes code fences and inline code spans, image references and
/// emphasis/heading/quote/rule characters, converts link syntax to the bare
/// link text, collapses runs of blank lines to one and trims the result.
pub fn strip_display_markup(text: &str) -> String {
    let text = CODE_SPAN_RE.replace_all(text, "");
    let text = IMAGE_RE.replace_all(&text, "");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = MARKUP_CHARS_RE.replace_all(&text, "");
    let text = BLANK_RUN_RE.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Repair trial-identifier artifacts before embedding text in a report.
///
/// The workflow runner sometimes splits `(NCT...)` spans so that a closing
/// parenthesis lands on its own line or directly before the registry number.
/// Lines containing only a stray `)` are dropped, `)` immediately preceding
/// `NCT` collapses into a clean token boundary, and surrounding whitespace
/// is trimmed. Nothing else is touched.
pub fn clean_export_artifacts(text: &str) -> String {
    let text = STRAY_PAREN_LINE_RE.replace_all(text, "");
    let text = PAREN_NCT_LINE_START_RE.replace_all(&text, "NCT");
    let text = PAREN_NCT_INLINE_RE.replace_all(&text, " NCT");
    text.trim().to_string()
}
