//! ODP presentations.

use super::{office_body, paragraph_text};
use crate::error::Result;
use crate::render;
use crate::xml::{self, Element};

/// Render each `draw:page` with text as `## Slide N` and a bullet list.
pub fn parse_presentation_xml(xml: &str) -> Result<String> {
    let root = xml::parse(xml)?;
    let presentation = office_body(&root, "office:presentation")?;
    let mut slides = Vec::new();
    for page in presentation.children_named("draw:page") {
        let mut lines = Vec::new();
        collect_text(page, &mut lines);
        let list = render::format_markdown_list(&lines.join("\n"));
        if list.is_empty() {
            continue;
        }
        slides.push(format!("## Slide {}\n\n{}", slides.len() + 1, list));
    }
    Ok(slides.join("\n\n"))
}

fn collect_text(element: &Element, lines: &mut Vec<String>) {
    if matches!(element.name.as_str(), "text:p" | "text:h") {
        let text = paragraph_text(element);
        if !text.is_empty() {
            lines.push(text);
        }
    }
    for child in element.elements() {
        collect_text(child, lines);
    }
}
