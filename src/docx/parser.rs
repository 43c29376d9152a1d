//! DOCX parser implementation.

use crate::codec;
use crate::container::ZipContainer;
use crate::error::{Error, Result};
use crate::render;
use crate::xml::{self, Element};

const DOCUMENT_PART: &str = "word/document.xml";

/// Parser for DOCX (Word) documents.
#[derive(Debug)]
pub struct DocxParser {
    container: ZipContainer,
}

impl DocxParser {
    /// Open a DOCX file for parsing.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let container = ZipContainer::open(path)?;
        Ok(Self { container })
    }

    /// Create a parser from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = ZipContainer::from_bytes(data)?;
        Ok(Self { container })
    }

    /// Render the main document part as Markdown.
    pub fn parse(&self) -> Result<String> {
        let xml = self.container.read_xml(DOCUMENT_PART)?;
        parse_document_xml(&xml)
    }
}

/// Render a `word/document.xml` body: paragraphs and tables separated by
/// blank lines.
pub fn parse_document_xml(xml: &str) -> Result<String> {
    let root = xml::parse(xml)?;
    let body = root
        .child("w:body")
        .ok_or_else(|| Error::MissingComponent("w:body".to_string()))?;
    let mut blocks = Vec::new();
    collect_blocks(body, &mut blocks);
    Ok(blocks.join("\n\n"))
}

/// Paragraphs and tables directly under `parent`, looking through
/// block-level content controls.
fn collect_blocks(parent: &Element, blocks: &mut Vec<String>) {
    for element in parent.elements() {
        let block = match element.name.as_str() {
            "w:p" => format_paragraph(element),
            "w:tbl" => parse_table(element),
            "w:sdt" => {
                if let Some(content) = element.child("w:sdtContent") {
                    collect_blocks(content, blocks);
                }
                continue;
            }
            _ => continue,
        };
        if !block.is_empty() {
            blocks.push(block);
        }
    }
}

/// Run text with breaks as newlines and tabs as single spaces.
fn collect_text(node: &Element, out: &mut String) {
    match node.name.as_str() {
        "w:t" => out.push_str(&node.text()),
        "w:br" | "w:cr" => out.push('\n'),
        "w:tab" => out.push(' '),
        "w:pPr" => {}
        _ => {
            for child in node.elements() {
                collect_text(child, out);
            }
        }
    }
}

fn paragraph_style(paragraph: &Element) -> Option<&str> {
    let style = paragraph.child("w:pPr")?.child("w:pStyle")?;
    style.attr("w:val").or_else(|| style.attr("val"))
}

/// Level from a `HeadingN` style name. Leading whitespace and a sign are
/// accepted before the digits.
fn heading_level(style: &str) -> Option<usize> {
    let rest = style.strip_prefix("Heading")?;
    if rest.is_empty() {
        return None;
    }
    let rest = rest.trim_start_matches(codec::is_space);
    let (negative, digits) = match rest.as_bytes().first() {
        Some(b'-') => (true, &rest[1..]),
        Some(b'+') => (false, &rest[1..]),
        _ => (false, rest),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: usize = digits[..end].parse().unwrap_or(usize::MAX);
    Some(if negative { 1 } else { value.clamp(1, 6) })
}

fn format_paragraph(paragraph: &Element) -> String {
    let mut text = String::new();
    collect_text(paragraph, &mut text);
    let trimmed = codec::trim(&text);
    if trimmed.is_empty() {
        return String::new();
    }
    match paragraph_style(paragraph).and_then(heading_level) {
        Some(level) => render::heading(trimmed, level),
        None => trimmed.to_string(),
    }
}

fn read_cell(cell: &Element) -> String {
    let mut fragments = Vec::new();
    collect_blocks(cell, &mut fragments);
    fragments.join("\n")
}

fn parse_table(table: &Element) -> String {
    let rows: Vec<Vec<String>> = table
        .children_named("w:tr")
        .map(|row| row.children_named("w:tc").map(read_cell).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();
    render::make_markdown_table(&rows)
}
