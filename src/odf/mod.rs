//! OpenDocument (ODT, ODP, ODS) readers.
//!
//! All three formats keep their content in `content.xml`; they differ in
//! the `office:body` child holding it. Paragraph and table handling is
//! shared here.

mod odp;
mod ods;
mod odt;

pub use odp::parse_presentation_xml;
pub use ods::parse_spreadsheet_xml;
pub use odt::parse_text_xml;

use crate::codec;
use crate::container::ZipContainer;
use crate::error::{Error, Result};
use crate::xml::{Element, Node};
use std::path::Path;

const CONTENT_PART: &str = "content.xml";

/// Largest expansion honoured for a repeated row or cell.
const MAX_REPEAT: usize = 1024;

/// Most cells one table may expand to, counting an empty row as one cell.
const MAX_TABLE_CELLS: usize = 1 << 20;

/// Largest run of spaces produced by one `text:s`.
const MAX_SPACES: usize = 1024;

/// Parser for OpenDocument packages.
#[derive(Debug)]
pub struct OdfParser {
    container: ZipContainer,
}

impl OdfParser {
    /// Open an OpenDocument file for parsing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = ZipContainer::open(path)?;
        Ok(Self { container })
    }

    /// Create a parser from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = ZipContainer::from_bytes(data)?;
        Ok(Self { container })
    }

    fn content(&self) -> Result<String> {
        self.container.read_xml(CONTENT_PART)
    }

    /// Render `office:text` content (ODT).
    pub fn parse_text(&self) -> Result<String> {
        parse_text_xml(&self.content()?)
    }

    /// Render `office:presentation` content (ODP).
    pub fn parse_presentation(&self) -> Result<String> {
        parse_presentation_xml(&self.content()?)
    }

    /// Render `office:spreadsheet` content (ODS).
    pub fn parse_spreadsheet(&self) -> Result<String> {
        parse_spreadsheet_xml(&self.content()?)
    }
}

/// The `office:body/<kind>` element of a parsed `content.xml`.
fn office_body<'a>(root: &'a Element, kind: &str) -> Result<&'a Element> {
    root.child("office:body")
        .and_then(|body| body.child(kind))
        .ok_or_else(|| Error::MissingComponent(format!("office:body/{kind}")))
}

fn repeat_count(element: &Element, attribute: &str) -> usize {
    element
        .attr(attribute)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_REPEAT)
}

fn append_text(node: &Node, out: &mut String) {
    let element = match node {
        Node::Text(text) => {
            out.push_str(text);
            return;
        }
        Node::Element(element) => element,
    };
    match element.name.as_str() {
        "text:line-break" => out.push('\n'),
        "text:tab" => out.push('\t'),
        "text:s" => {
            let count = element
                .attr("text:c")
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(1)
                .clamp(1, MAX_SPACES);
            out.extend(std::iter::repeat_n(' ', count));
        }
        _ => {
            for child in &element.children {
                append_text(child, out);
            }
        }
    }
}

/// Trimmed text of a paragraph or heading, with spacing elements expanded.
pub(crate) fn paragraph_text(element: &Element) -> String {
    let mut text = String::new();
    for node in &element.children {
        append_text(node, &mut text);
    }
    codec::trim(&text).to_string()
}

/// Expand a `table:table` into rows of cell text.
///
/// Repeated rows and cells are expanded until the table holds
/// [`MAX_TABLE_CELLS`] cells, covered cells become empty placeholders, and
/// trailing empty cells and rows are dropped.
pub(crate) fn parse_table(table: &Element) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut budget = MAX_TABLE_CELLS;
    for row in table_rows(table) {
        if budget == 0 {
            tracing::debug!(rows = rows.len(), "table cell budget spent, dropping later rows");
            break;
        }
        let mut cells = Vec::new();
        for cell in row.elements() {
            if cells.len() == budget {
                break;
            }
            let value = match cell.name.as_str() {
                "table:table-cell" => cell
                    .children_named("text:p")
                    .map(paragraph_text)
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n"),
                "table:covered-table-cell" => String::new(),
                _ => continue,
            };
            let repeat =
                repeat_count(cell, "table:number-columns-repeated").min(budget - cells.len());
            cells.extend(std::iter::repeat_n(value, repeat));
        }
        while cells.last().is_some_and(String::is_empty) {
            cells.pop();
        }
        let width = cells.len().max(1);
        let repeat = repeat_count(row, "table:number-rows-repeated").min(budget / width);
        budget -= repeat * width;
        rows.extend(std::iter::repeat_n(cells, repeat));
    }
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }
    rows
}

/// Rows directly under the table or inside row groups and header rows.
fn table_rows(table: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    for element in table.elements() {
        match element.name.as_str() {
            "table:table-row" => rows.push(element),
            "table:table-header-rows" | "table:table-rows" | "table:table-row-group" => {
                rows.extend(table_rows(element));
            }
            _ => {}
        }
    }
    rows
}
