//! Conversion result.

use serde::Serialize;

/// Outcome of one conversion.
///
/// `success` is true exactly when `markdown` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    /// Extracted Markdown
    pub markdown: String,

    /// Diagnostics in the order they were recorded
    pub warnings: Vec<String>,

    /// Whether any output was produced
    pub success: bool,
}

impl ConversionResult {
    /// Build a result from extracted Markdown, deriving `success`.
    pub fn new(markdown: String, warnings: Vec<String>) -> Self {
        let success = !markdown.is_empty();
        Self {
            markdown,
            warnings,
            success,
        }
    }

    /// Append a warning.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Whether no Markdown was produced.
    pub fn is_empty(&self) -> bool {
        self.markdown.is_empty()
    }
}
