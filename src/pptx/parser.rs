//! PPTX parser implementation.

use crate::codec;
use crate::container::{self, ZipContainer};
use crate::error::{Error, Result};
use quick_xml::events::Event;
use std::path::Path;

const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Parser for PPTX (PowerPoint) presentations.
#[derive(Debug)]
pub struct PptxParser {
    container: ZipContainer,
}

impl PptxParser {
    /// Open a PPTX file for parsing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = ZipContainer::open(path)?;
        Ok(Self { container })
    }

    /// Create a parser from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = ZipContainer::from_bytes(data)?;
        Ok(Self { container })
    }

    /// Render each slide with text as `## Slide N` and a bullet per paragraph.
    pub fn parse(&self) -> Result<String> {
        let mut slide_files = self.container.files_with_prefix(SLIDE_PREFIX);
        if slide_files.is_empty() {
            return Err(Error::MissingComponent(format!("{SLIDE_PREFIX}*.xml")));
        }
        container::sort_by_trailing_number(&mut slide_files);

        let mut slides = Vec::new();
        for slide_file in &slide_files {
            let Ok(xml) = self.container.read_xml(slide_file) else {
                continue;
            };
            let paragraphs = match parse_slide_xml(&xml) {
                Ok(paragraphs) => paragraphs,
                Err(e) => {
                    tracing::warn!(slide = %slide_file, error = %e, "skipping slide");
                    continue;
                }
            };
            if paragraphs.is_empty() {
                continue;
            }
            let bullets: Vec<String> = paragraphs.iter().map(|p| format!("- {p}")).collect();
            slides.push(format!("## Slide {}\n\n{}", slides.len() + 1, bullets.join("\n")));
        }
        Ok(slides.join("\n\n"))
    }
}

/// Trimmed, non-empty `a:p` paragraphs of one slide in document order.
pub fn parse_slide_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"a:p" => paragraph = Some(String::new()),
                b"a:t" => in_text = paragraph.is_some(),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"a:br" {
                    if let Some(text) = paragraph.as_mut() {
                        text.push('\n');
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    if let Some(text) = paragraph.as_mut() {
                        text.push_str(&e.unescape().unwrap_or_default());
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:br" => {
                    if let Some(text) = paragraph.as_mut() {
                        text.push('\n');
                    }
                }
                b"a:p" => {
                    if let Some(text) = paragraph.take() {
                        let trimmed = codec::trim(&text);
                        if !trimmed.is_empty() {
                            paragraphs.push(trimmed.to_string());
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

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slide_xml() {
        let xml = r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p"><p:cSld><p:spTree>
<p:sp><p:txBody><a:p><a:r><a:t>Title &amp; more</a:t></a:r></a:p><a:p><a:endParaRPr/></a:p></p:txBody></p:sp>
<p:sp><p:txBody><a:p><a:r><a:t>first</a:t></a:r><a:br/><a:r><a:t xml:space="preserve"> second </a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#;
        assert_eq!(
            parse_slide_xml(xml).unwrap(),
            vec!["Title & more", "first\n second"]
        );
    }

    #[test]
    fn test_malformed_slide() {
        assert!(parse_slide_xml("<a:p><a:t>x</a:p>").is_err());
    }
}
