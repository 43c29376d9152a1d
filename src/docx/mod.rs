//! DOCX (Word) document parser.
//!
//! Reads `word/document.xml` from the Office Open XML package and renders
//! body paragraphs, `HeadingN` styles and tables as Markdown.

mod parser;

pub use parser::{parse_document_xml, DocxParser};
