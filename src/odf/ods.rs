//! ODS spreadsheets.

use super::{office_body, parse_table};
use crate::error::Result;
use crate::render;
use crate::xml;

/// Render each `table:table` as a table titled by its `table:name`, or
/// `Sheet N` when unnamed.
pub fn parse_spreadsheet_xml(xml: &str) -> Result<String> {
    let root = xml::parse(xml)?;
    let spreadsheet = office_body(&root, "office:spreadsheet")?;
    let mut sections = Vec::new();
    for table in spreadsheet.children_named("table:table") {
        let markdown = render::make_markdown_table(&parse_table(table));
        if markdown.is_empty() {
            continue;
        }
        let title = match table.attr("table:name") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Sheet {}", sections.len() + 1),
        };
        sections.push(format!("## {title}\n\n{markdown}"));
    }
    Ok(sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_unnamed_sheets() {
        let xml = r#"<office:document-content><office:body><office:spreadsheet>
<table:table table:name="Budget"><table:table-row><table:table-cell office:value-type="string"><text:p>Item</text:p></table:table-cell><table:table-cell office:value-type="float" office:value="12"><text:p>12</text:p></table:table-cell></table:table-row></table:table>
<table:table table:name="Empty"><table:table-row><table:table-cell table:number-columns-repeated="5"/></table:table-row></table:table>
<table:table><table:table-row><table:table-cell><text:p>z</text:p></table:table-cell></table:table-row></table:table>
</office:spreadsheet></office:body></office:document-content>"#;
        assert_eq!(
            parse_spreadsheet_xml(xml).unwrap(),
            "## Budget\n\n| Item | 12 |\n| --- | --- |\n\n## Sheet 2\n\n| z |\n| --- |"
        );
    }
}
