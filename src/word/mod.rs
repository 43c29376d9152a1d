//! Legacy Word binary (`.doc`, `.wps`) text extraction.
//!
//! The structured path reads the FIB from the `WordDocument` stream,
//! follows the piece table in `0Table`/`1Table` and normalizes the result.
//! When that yields nothing the raw file is scanned for UTF-16 text.

mod fib;
mod normalize;

pub use fib::{decode_pieces, decode_simple_range, parse_fib, parse_text_pieces, FibInfo, TextPiece};
pub use normalize::{
    convert_lines_with_tables, expand_flattened_tab_rows, normalize_word_text, split_tab_line,
    tabular_columns,
};

use crate::error::{Error, Result};
use crate::heuristic;
use crate::ole::CompoundFile;
use std::path::Path;

const WORD_STREAM: &str = "WordDocument";

/// Reader for legacy Word binary documents.
#[derive(Debug)]
pub struct WordBinaryReader {
    data: Vec<u8>,
}

impl WordBinaryReader {
    /// Read a document from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Structured text if the piece table can be followed, otherwise the
    /// best UTF-16 runs of the raw file.
    pub fn parse(&self) -> String {
        match self.parse_structured() {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                tracing::debug!("word binary decode was empty, scanning raw bytes");
                heuristic::extract_utf16_text(&self.data)
            }
            Err(e) => {
                tracing::debug!(error = %e, "word binary decode failed, scanning raw bytes");
                heuristic::extract_utf16_text(&self.data)
            }
        }
    }

    /// Text decoded through the FIB and piece table only.
    pub fn parse_structured(&self) -> Result<String> {
        let file = CompoundFile::from_bytes(self.data.clone())?;
        let word = file
            .stream_by_name(WORD_STREAM)
            .filter(|stream| !stream.is_empty())
            .ok_or_else(|| Error::MissingComponent(WORD_STREAM.to_string()))?;
        let fib = parse_fib(&word)
            .ok_or_else(|| Error::InvalidData("missing or truncated FIB".to_string()))?;

        let mut raw = String::new();
        if fib.has_clx() {
            if let Some(table) = file.stream_by_name(fib.table_stream_name()) {
                let pieces = parse_text_pieces(&table, fib.fc_clx, fib.lcb_clx);
                raw = decode_pieces(&word, &pieces);
            }
        }
        if raw.is_empty() {
            raw = decode_simple_range(&word, fib.fc_min, fib.fc_mac);
        }
        Ok(normalize_word_text(&raw))
    }
}

/// Convert a legacy Word binary buffer to Markdown.
pub fn read_word_binary(data: &[u8]) -> String {
    WordBinaryReader::from_bytes(data.to_vec()).parse()
}
