//! ODT text documents.

use super::{office_body, paragraph_text, parse_table};
use crate::error::Result;
use crate::render;
use crate::xml::{self, Element};

/// Render the `office:text` body of an ODT `content.xml`.
pub fn parse_text_xml(xml: &str) -> Result<String> {
    let root = xml::parse(xml)?;
    let text = office_body(&root, "office:text")?;
    let mut blocks = Vec::new();
    collect_blocks(text, &mut blocks);
    Ok(blocks.join("\n\n"))
}

fn collect_blocks(parent: &Element, blocks: &mut Vec<String>) {
    for element in parent.elements() {
        match element.name.as_str() {
            "text:p" => {
                let text = paragraph_text(element);
                if !text.is_empty() {
                    blocks.push(text);
                }
            }
            "text:h" => {
                let text = paragraph_text(element);
                if text.is_empty() {
                    continue;
                }
                let level = element
                    .attr("text:outline-level")
                    .and_then(|value| value.trim().parse::<i64>().ok())
                    .unwrap_or(1)
                    .clamp(1, 6);
                blocks.push(render::heading(&text, level as usize));
            }
            "text:list" => {
                let mut items = Vec::new();
                collect_list_items(element, "", &mut items);
                if !items.is_empty() {
                    blocks.push(items.join("\n"));
                }
            }
            "table:table" => {
                let table = render::make_markdown_table(&parse_table(element));
                if !table.is_empty() {
                    blocks.push(table);
                }
            }
            _ => collect_blocks(element, blocks),
        }
    }
}

/// Bullets for a list, nested lists indented two spaces per level.
fn collect_list_items(list: &Element, prefix: &str, items: &mut Vec<String>) {
    for item in list.children_named("text:list-item") {
        for paragraph in item.children_named("text:p") {
            let text = paragraph_text(paragraph);
            if !text.is_empty() {
                items.push(format!("{prefix}- {text}"));
            }
        }
        let nested_prefix = format!("{prefix}  ");
        for nested in item.children_named("text:list") {
            collect_list_items(nested, &nested_prefix, items);
        }
    }
}
