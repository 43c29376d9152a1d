//! Conversion options configuration.

use serde::{Deserialize, Serialize};

/// Options accepted by [`crate::convert_file`].
///
/// Code files are always fenced and whitespace normalization is reserved;
/// both flags are carried so callers can already express their intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Wrap recognized source files in a fenced code block
    pub wrap_code_blocks: bool,

    /// Collapse redundant whitespace in the output
    pub normalize_whitespace: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            wrap_code_blocks: true,
            normalize_whitespace: true,
        }
    }
}

impl ConversionOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether code files are fenced.
    pub fn with_wrap_code_blocks(mut self, wrap: bool) -> Self {
        self.wrap_code_blocks = wrap;
        self
    }

    /// Set whether whitespace is normalized.
    pub fn with_normalize_whitespace(mut self, normalize: bool) -> Self {
        self.normalize_whitespace = normalize;
        self
    }
}
