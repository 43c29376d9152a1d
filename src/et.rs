//! Legacy spreadsheet (`.et`) extraction.
//!
//! BIFF workbooks are read through calamine, one table per sheet. When that
//! fails the `Workbook` stream is decoded with the code page it declares,
//! and as a last resort the raw file is scanned for UTF-16 text.

use crate::codec::{self, read_u16_le};
use crate::error::Result;
use crate::heuristic;
use crate::ole::CompoundFile;
use crate::render;
use calamine::{Data, Reader, Xls};
use std::io::Cursor;
use std::path::Path;

const WORKBOOK_STREAM: &str = "Workbook";

/// BIFF `CODEPAGE` record.
const RECORD_CODEPAGE: u16 = 0x0042;

/// Significant digits kept for numeric cells.
const NUMBER_PRECISION: i32 = 15;

/// Format a number like C's `%.15g`.
pub fn format_general(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        return Some("0".to_string());
    }
    let scientific = format!("{:.*e}", (NUMBER_PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;

    if exponent < -4 || exponent >= NUMBER_PRECISION {
        let mantissa = strip_fraction_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        Some(format!("{mantissa}e{sign}{:02}", exponent.abs()))
    } else {
        let decimals = (NUMBER_PRECISION - 1 - exponent).max(0) as usize;
        Some(strip_fraction_zeros(&format!("{value:.decimals$}")).to_string())
    }
}

fn strip_fraction_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Display text of one calamine cell.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => format_general(*f).unwrap_or_default(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => format_general(dt.as_f64()).unwrap_or_default(),
        Data::Error(e) => e.to_string(),
    }
}

/// Rows of a sheet with text, trailing empty cells removed.
///
/// Cells before the used range's first column are kept as empty cells so
/// column positions survive.
fn sheet_rows(range: &calamine::Range<Data>) -> Vec<Vec<String>> {
    let leading = range.start().map_or(0, |(_, column)| column as usize);
    let mut rows = Vec::new();
    for row in range.rows() {
        let mut cells: Vec<String> = std::iter::repeat_n(String::new(), leading)
            .chain(row.iter().map(cell_to_string))
            .collect();
        while cells.last().is_some_and(|cell| codec::trim(cell).is_empty()) {
            cells.pop();
        }
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    rows
}

/// Every non-empty sheet as `## Sheet N` plus a table, through the BIFF
/// reader.
pub fn parse_workbook(data: &[u8]) -> Result<String> {
    let mut workbook = Xls::new(Cursor::new(data.to_vec()))?;
    let mut sections = Vec::new();
    for name in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!(sheet = %name, error = %e, "skipping sheet");
                continue;
            }
        };
        let rows = sheet_rows(&range);
        let table = render::make_markdown_table(&rows);
        if table.is_empty() {
            continue;
        }
        sections.push(format!("## Sheet {}\n\n{}", sections.len() + 1, table));
    }
    Ok(sections.join("\n\n"))
}

/// Code page declared by the first `CODEPAGE` record of a BIFF stream.
pub fn detect_biff_code_page(stream: &[u8]) -> Option<u16> {
    let mut offset = 0usize;
    while let (Some(id), Some(size)) = (read_u16_le(stream, offset), read_u16_le(stream, offset + 2))
    {
        offset += 4;
        let size = usize::from(size);
        if offset + size > stream.len() {
            break;
        }
        if id == RECORD_CODEPAGE && size >= 2 {
            return read_u16_le(stream, offset);
        }
        offset += size;
    }
    None
}

/// Reader for legacy spreadsheets.
#[derive(Debug)]
pub struct SpreadsheetReader {
    data: Vec<u8>,
}

impl SpreadsheetReader {
    /// Read a workbook from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert to Markdown, preferring sheet tables and otherwise returning
    /// recovered text under `## ET Workbook`.
    pub fn parse(&self) -> String {
        match parse_workbook(&self.data) {
            Ok(text) if !text.is_empty() => return text,
            Ok(_) => tracing::debug!("workbook has no sheet content"),
            Err(e) => tracing::debug!(error = %e, "BIFF reader failed, decoding stream text"),
        }
        let text = self.parse_fallback();
        if text.is_empty() {
            text
        } else {
            format!("## ET Workbook\n\n{text}")
        }
    }

    fn parse_fallback(&self) -> String {
        let workbook = CompoundFile::from_bytes(self.data.clone())
            .ok()
            .and_then(|file| file.stream_by_name(WORKBOOK_STREAM))
            .filter(|stream| !stream.is_empty());
        if let Some(stream) = workbook {
            let mut text = match detect_biff_code_page(&stream) {
                Some(code_page) if code_page != 0 && code_page != codec::CODE_PAGE_UTF16LE => {
                    heuristic::decode_with_code_page(&stream, code_page)
                }
                _ => String::new(),
            };
            if text.is_empty() {
                text = heuristic::extract_utf16_text(&stream);
            }
            if !text.is_empty() {
                return text;
            }
        }
        heuristic::extract_utf16_text(&self.data)
    }
}

/// Convert a legacy spreadsheet buffer to Markdown.
pub fn read_spreadsheet(data: &[u8]) -> String {
    SpreadsheetReader::from_bytes(data.to_vec()).parse()
}
