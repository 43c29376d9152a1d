//! Stripping Markdown and HTML down to plain text.

use crate::codec;
use regex::Regex;
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("valid fence regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]*)`").expect("valid inline code regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("valid image regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid link regex"));
static HEADING_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#+[ \t]*").expect("valid heading regex"));
static QUOTE_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^>[ \t]*").expect("valid quote regex"));
static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\|.*\|$").expect("valid table row regex"));
static TABLE_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\|?[ \t]*:?-+:?[ \t]*(\|[ \t]*:?-+:?[ \t]*)*$")
        .expect("valid table rule regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<style[\s\S]*?</style>").expect("valid style regex"));
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<script[\s\S]*?</script>").expect("valid script regex"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break regex"));
static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p>").expect("valid paragraph end regex"));

/// Reduce Markdown to its plain text.
///
/// Fenced blocks are removed, inline code, images and links keep their text,
/// heading and quote markers, table rows, tags and emphasis stars are dropped.
pub fn markdown_to_text(markdown: &str) -> String {
    let text = FENCED_BLOCK.replace_all(markdown, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = IMAGE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = HEADING_MARK.replace_all(&text, "");
    let text = QUOTE_MARK.replace_all(&text, "");
    let text = TABLE_ROW.replace_all(&text, "");
    let text = TABLE_RULE.replace_all(&text, "");
    let text = TAG.replace_all(&text, "");
    text.replace("**", "").replace('*', "")
}

/// Reduce HTML to plain text.
///
/// Style and script blocks are removed, `<br>` becomes a newline and `</p>`
/// a blank line, remaining tags are stripped and the basic entities decoded.
pub fn html_to_text(html: &str) -> String {
    let text = STYLE_BLOCK.replace_all(html, "");
    let text = SCRIPT_BLOCK.replace_all(&text, "");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = PARAGRAPH_END.replace_all(&text, "\n\n");
    let text = TAG.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    codec::trim(&text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_noise_stripped() {
        let md = "# Title\n\n\
                  Some `inline` code and ![img](link).\n\
                  > quote\n\n\
                  ```\ncode block\n```\n\
                  | col1 | col2 |\n\
                  | ---- | ---- |\n\
                  | a | b |\n";
        let text = markdown_to_text(md);
        assert!(!text.contains("# Title"));
        assert!(text.contains("Title"));
        assert!(text.contains("inline"));
        assert!(!text.contains('`'));
        assert!(text.contains("img"));
        assert!(!text.contains("(link)"));
        assert!(text.contains("quote"));
        assert!(!text.contains("> quote"));
        assert!(!text.contains("code block"));
        assert!(!text.contains("| col1 | col2 |"));
        assert!(!text.contains("----"));
    }

    #[test]
    fn test_markdown_links_and_emphasis() {
        let text = markdown_to_text("See [docs](https://x.y) for **bold** and *it*.");
        assert_eq!(text, "See docs for bold and it.");
    }

    #[test]
    fn test_html_to_text() {
        let html = "<html><head><style>p { color: red; }</style>\
                    <SCRIPT>alert(1)</SCRIPT></head>\
                    <body><p>One&nbsp;&amp;&nbsp;two</p>line<br/>next &lt;tag&gt;</body></html>";
        assert_eq!(html_to_text(html), "One & two\n\nline\nnext <tag>");
    }
}
