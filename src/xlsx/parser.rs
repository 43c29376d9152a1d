//! XLSX parser implementation.

use crate::codec;
use crate::container::{self, ZipContainer};
use crate::error::{Error, Result};
use crate::render;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

use super::shared_strings::SharedStrings;

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const SHEET_PREFIX: &str = "xl/worksheets/sheet";

/// Widest column reference Excel can address (XFD).
const MAX_COLUMNS: usize = 16_384;

/// Parser for XLSX (Excel) workbooks.
#[derive(Debug)]
pub struct XlsxParser {
    container: ZipContainer,
    shared_strings: SharedStrings,
}

impl XlsxParser {
    /// Open an XLSX file for parsing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = ZipContainer::open(path)?;
        Ok(Self::from_container(container))
    }

    /// Create a parser from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = ZipContainer::from_bytes(data)?;
        Ok(Self::from_container(container))
    }

    fn from_container(container: ZipContainer) -> Self {
        let shared_strings = match container.read_xml(SHARED_STRINGS_PART) {
            Ok(xml) => SharedStrings::parse(&xml).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring unreadable shared strings");
                SharedStrings::default()
            }),
            Err(_) => SharedStrings::default(),
        };
        Self {
            container,
            shared_strings,
        }
    }

    /// Render every non-empty worksheet as `## Sheet N` plus a table.
    ///
    /// Worksheets are ordered by the number in their part name, and `N`
    /// counts only the sheets that produced output.
    pub fn parse(&self) -> Result<String> {
        let mut sheet_files = self.container.files_with_prefix(SHEET_PREFIX);
        if sheet_files.is_empty() {
            return Err(Error::MissingComponent(format!("{SHEET_PREFIX}*.xml")));
        }
        container::sort_by_trailing_number(&mut sheet_files);

        let mut sheets = Vec::new();
        for sheet_file in &sheet_files {
            let Ok(xml) = self.container.read_xml(sheet_file) else {
                continue;
            };
            let rows = match parse_worksheet(&xml, &self.shared_strings) {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(sheet = %sheet_file, error = %e, "skipping worksheet");
                    continue;
                }
            };
            let table = render::make_markdown_table(&rows);
            if table.is_empty() {
                continue;
            }
            sheets.push(format!("## Sheet {}\n\n{}", sheets.len() + 1, table));
        }
        Ok(sheets.join("\n\n"))
    }
}

/// Zero-based column of a cell reference such as `C7`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let number = letters.iter().fold(0usize, |acc, b| {
        acc * 26 + usize::from(b.to_ascii_uppercase() - b'A' + 1)
    });
    let index = number - 1;
    (index < MAX_COLUMNS).then_some(index)
}

#[derive(Default)]
struct CellState {
    column: usize,
    cell_type: Option<String>,
    value: String,
    inline: String,
}

impl CellState {
    fn from_start(e: &BytesStart<'_>, next_column: usize) -> Self {
        let mut state = CellState {
            column: next_column,
            ..Default::default()
        };
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            match attr.key.local_name().as_ref() {
                b"r" => {
                    if let Some(column) = column_index(&value) {
                        state.column = column;
                    }
                }
                b"t" => state.cell_type = Some(value),
                _ => {}
            }
        }
        state
    }

    fn resolve(&self, shared_strings: &SharedStrings) -> String {
        match self.cell_type.as_deref() {
            Some("inlineStr") => codec::trim(&self.inline).to_string(),
            Some("s") => codec::trim(&self.value)
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.get(index))
                .map(str::to_string)
                .unwrap_or_else(|| self.value.clone()),
            _ => codec::trim(&self.value).to_string(),
        }
    }
}

fn place_cell(row: &mut Vec<String>, column: usize, value: String) {
    if column < row.len() {
        row[column] = value;
    } else {
        row.resize(column, String::new());
        row.push(value);
    }
}

/// Rows of one worksheet, each cell resolved to display text.
///
/// Cells land at the column named by their `r` reference; rows without any
/// text are dropped and trailing empty cells trimmed.
pub fn parse_worksheet(xml: &str, shared_strings: &SharedStrings) -> Result<Vec<Vec<String>>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut rows = Vec::new();
    let mut row: Option<Vec<String>> = None;
    let mut next_column = 0usize;
    let mut cell: Option<CellState> = None;
    let mut in_v = false;
    let mut in_is = false;
    let mut in_t = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = Some(Vec::new());
                    next_column = 0;
                }
                b"c" if row.is_some() => cell = Some(CellState::from_start(&e, next_column)),
                b"v" if cell.is_some() => in_v = true,
                b"is" if cell.is_some() => in_is = true,
                b"rPh" if in_is => phonetic_depth += 1,
                b"t" if in_is && phonetic_depth == 0 => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"c" {
                    if let Some(row) = row.as_mut() {
                        let state = CellState::from_start(&e, next_column);
                        place_cell(row, state.column, String::new());
                        next_column = state.column + 1;
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(state) = cell.as_mut() {
                    let text = e.unescape().unwrap_or_default();
                    if in_v {
                        state.value.push_str(&text);
                    } else if in_t {
                        state.inline.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"t" => in_t = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"is" => in_is = false,
                b"c" => {
                    if let (Some(state), Some(row)) = (cell.take(), row.as_mut()) {
                        let value = state.resolve(shared_strings);
                        place_cell(row, state.column, value);
                        next_column = state.column + 1;
                    }
                }
                b"row" => {
                    if let Some(mut finished) = row.take() {
                        while finished.last().is_some_and(|value| value.is_empty()) {
                            finished.pop();
                        }
                        if !finished.is_empty() {
                            rows.push(finished);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(strings: &[&str]) -> SharedStrings {
        let items: String = strings.iter().map(|s| format!("<si><t>{s}</t></si>")).collect();
        SharedStrings::parse(&format!("<sst>{items}</sst>")).unwrap()
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("c7"), Some(2));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("XFD1"), Some(16_383));
        assert_eq!(column_index("ZZZ1"), None);
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn test_cell_resolution() {
        let xml = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>1</v></c><c r="B1" t="inlineStr"><is><t> inline </t></is></c><c r="C1"><v> 3.5 </v></c></row>
<row r="2"><c r="A2" t="s"><v>9</v></c><c r="B2" t="str"><v>calc</v></c></row>
</sheetData></worksheet>"#;
        let rows = parse_worksheet(xml, &shared(&["zero", "one"])).unwrap();
        assert_eq!(rows, vec![vec!["one", "inline", "3.5"], vec!["9", "calc"]]);
    }

    #[test]
    fn test_sparse_and_empty_rows() {
        let xml = r#"<worksheet><sheetData>
<row r="1"><c r="B1"><v>x</v></c><c r="D1"><v>y</v></c><c r="E1"/></row>
<row r="2"><c r="A2"/><c r="B2"><v></v></c></row>
<row r="3"><c><v>a</v></c><c><v>b</v></c></row>
</sheetData></worksheet>"#;
        let rows = parse_worksheet(xml, &SharedStrings::default()).unwrap();
        assert_eq!(rows, vec![vec!["", "x", "", "y"], vec!["a", "b"]]);
    }
}
