//! Markdown output helpers shared by the extractors.
//!
//! Tables, bullet lists, fenced code and the markup stripping used by the
//! Markdown and HTML passthrough handlers.
//!
//! # Example
//!
//! ```
//! use doc2md::render::make_markdown_table;
//!
//! let rows = vec![
//!     vec!["Name".to_string(), "Qty".to_string()],
//!     vec!["Bolts".to_string()],
//! ];
//! assert_eq!(
//!     make_markdown_table(&rows),
//!     "| Name | Qty |\n| --- | --- |\n| Bolts |  |"
//! );
//! ```

mod markup;
mod table;

pub use markup::{html_to_text, markdown_to_text};
pub use table::{escape_markdown_cell, make_markdown_table};

use crate::codec;

/// Turn each non-blank line into a `- ` bullet.
pub fn format_markdown_list(text: &str) -> String {
    codec::split_lines(text)
        .iter()
        .map(|line| codec::trim(line))
        .filter(|line| !line.is_empty())
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text in a fenced code block labelled with `language`.
pub fn fenced_code_block(text: &str, language: &str) -> String {
    format!("```{language}\n{text}\n```")
}

/// Markdown ATX heading, level clamped to 1..=6.
pub fn heading(text: &str, level: usize) -> String {
    format!("{} {}", "#".repeat(level.clamp(1, 6)), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_markdown_list() {
        assert_eq!(format_markdown_list("one\n\n  two \r\n"), "- one\n- two");
        assert_eq!(format_markdown_list("   "), "");
    }

    #[test]
    fn test_fenced_code_block() {
        assert_eq!(fenced_code_block("x = 1", "py"), "```py\nx = 1\n```");
    }

    #[test]
    fn test_heading_clamp() {
        assert_eq!(heading("Title", 0), "# Title");
        assert_eq!(heading("Deep", 9), "###### Deep");
    }
}
