//! Legacy PowerPoint binary (`.dps`) text extraction.
//!
//! Walks the record tree of the `PowerPoint Document` stream, collecting
//! text atoms into one bucket per slide container. Files the walk cannot
//! read fall back to scanning the stream, then the whole file, for text.

use crate::codec::{self, read_u16_le, read_u32_le};
use crate::error::{Error, Result};
use crate::heuristic;
use crate::ole::CompoundFile;
use crate::render;
use std::collections::HashSet;
use std::path::Path;

const DOCUMENT_STREAM: &str = "PowerPoint Document";

const RECORD_HEADER_LEN: usize = 8;

/// Record version marking a container.
const CONTAINER_VERSION: u16 = 0x000F;

/// Slide, MainMaster and Notes containers.
const SLIDE_CONTAINER_TYPES: [u16; 3] = [0x03EE, 0x03F8, 0x0FF0];

/// SlideListWithText, a slide boundary whatever its version nibble.
const SLIDE_LIST_WITH_TEXT: u16 = 0x0FF1;

const TEXT_CHARS_ATOM: u16 = 0x0FA0;
const TEXT_BYTES_ATOM: u16 = 0x0FA8;
const CSTRING: u16 = 0x0FBA;
const SLIDE_NAME_ATOM: u16 = 0x0D45;

/// Deepest container nesting followed.
const MAX_DEPTH: usize = 64;

/// Code pages tried for byte text that is not UTF-8.
const BYTE_TEXT_CODE_PAGES: [u16; 4] = [936, 950, 932, 1252];

/// Codecs tried on the stream when neither records nor UTF-16 runs help.
const FALLBACK_CODECS: [&str; 4] = ["GB18030", "Big5", "Shift-JIS", "Windows-1252"];

/// The eight-byte header in front of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub version: u16,
    pub instance: u16,
    pub record_type: u16,
    pub size: u32,
}

impl RecordHeader {
    pub fn parse(data: &[u8], offset: usize) -> Option<Self> {
        let ver_inst = read_u16_le(data, offset)?;
        Some(Self {
            version: ver_inst & 0x000F,
            instance: ver_inst >> 4,
            record_type: read_u16_le(data, offset + 2)?,
            size: read_u32_le(data, offset + 4)?,
        })
    }

    pub fn is_container(&self) -> bool {
        self.version == CONTAINER_VERSION
    }

    /// Whether entering this record starts a new slide.
    pub fn is_slide_container(&self) -> bool {
        self.size > 0
            && ((self.is_container() && SLIDE_CONTAINER_TYPES.contains(&self.record_type))
                || self.record_type == SLIDE_LIST_WITH_TEXT)
    }
}

/// Whether the record type carries displayable text.
pub fn is_text_record_type(record_type: u16) -> bool {
    matches!(
        record_type,
        TEXT_CHARS_ATOM | TEXT_BYTES_ATOM | CSTRING | SLIDE_NAME_ATOM
    )
}

/// Even-length payload where at least half the non-NUL units look like text.
fn looks_utf16(payload: &[u8]) -> bool {
    if payload.len() < 4 || payload.len() % 2 != 0 {
        return false;
    }
    let units = payload.len() / 2;
    let printable = payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .filter(|&unit| unit != 0 && heuristic::is_likely_printable_word_char(unit))
        .count();
    printable * 2 >= units
}

fn looks_latin(payload: &[u8]) -> bool {
    if payload.len() < 3 {
        return false;
    }
    let printable = payload
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b) || matches!(b, b'\r' | b'\n' | b'\t'))
        .count();
    printable * 2 >= payload.len()
}

fn decode_byte_text(payload: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(payload) {
        return text.to_string();
    }
    BYTE_TEXT_CODE_PAGES
        .iter()
        .find_map(|&code_page| codec::decode_code_page(payload, code_page))
        .unwrap_or_else(|| codec::latin1_to_string(payload))
}

/// Text of a text atom, with paragraph and vertical-tab marks as newlines,
/// tabs as spaces and every other control character removed. Other record
/// types and binary-looking payloads give `None`.
pub fn decode_text_record(record_type: u16, payload: &[u8]) -> Option<String> {
    if !is_text_record_type(record_type) || payload.is_empty() {
        return None;
    }
    let decoded = if looks_utf16(payload) {
        codec::utf16le_to_string(payload)
    } else if looks_latin(payload) {
        decode_byte_text(payload)
    } else {
        return None;
    };

    let cleaned = decoded
        .chars()
        .filter_map(|ch| match ch {
            '\0' => None,
            '\r' | '\u{0B}' => Some('\n'),
            '\t' => Some(' '),
            c if u32::from(c) < 0x20 => None,
            c => Some(c),
        })
        .collect::<String>();
    Some(cleaned)
}

/// Distinct text lines in discovery order.
#[derive(Debug, Default, Clone)]
pub struct TextBucket {
    lines: Vec<String>,
    seen: HashSet<String>,
}

impl TextBucket {
    fn push(&mut self, line: &str) {
        if self.seen.insert(line.to_string()) {
            self.lines.push(line.to_string());
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Slide buckets plus the text found outside any slide.
#[derive(Debug, Default)]
pub struct SlideTexts {
    pub slides: Vec<TextBucket>,
    pub loose: TextBucket,
}

impl SlideTexts {
    /// Walk every record in `stream`.
    pub fn collect(stream: &[u8]) -> Self {
        let mut texts = Self::default();
        texts.walk(stream, None, 0);
        texts
    }

    fn walk(&mut self, data: &[u8], slide: Option<usize>, depth: usize) {
        if depth > MAX_DEPTH {
            tracing::debug!(depth, "record nesting too deep, skipping");
            return;
        }
        let mut pos = 0usize;
        while let Some(header) = RecordHeader::parse(data, pos) {
            let body_start = pos + RECORD_HEADER_LEN;
            let Some(body) = body_start
                .checked_add(header.size as usize)
                .and_then(|end| data.get(body_start..end))
            else {
                break;
            };

            if header.is_slide_container() {
                self.slides.push(TextBucket::default());
                let index = self.slides.len() - 1;
                self.walk(body, Some(index), depth + 1);
                if self.slides.last().is_some_and(TextBucket::is_empty) {
                    self.slides.pop();
                }
            } else if header.is_container() && header.size > 0 {
                self.walk(body, slide, depth + 1);
            } else if header.size > 0 {
                if let Some(text) = decode_text_record(header.record_type, body) {
                    self.add_text(&text, slide);
                }
            }
            pos = body_start + body.len();
        }
    }

    fn add_text(&mut self, text: &str, slide: Option<usize>) {
        for line in codec::split_lines(text) {
            let line = codec::trim(&line);
            if line.is_empty()
                || line.contains('\u{FFFD}')
                || !heuristic::looks_like_document_text(line)
            {
                continue;
            }
            let bucket = match slide.and_then(|index| self.slides.get_mut(index)) {
                Some(bucket) => bucket,
                None => &mut self.loose,
            };
            bucket.push(line);
        }
    }

    /// `## Slide N` bullet lists, falling back to the loose lines when no
    /// slide held text.
    pub fn render(&self) -> String {
        let sections: Vec<String> = self
            .slides
            .iter()
            .filter(|slide| !slide.is_empty())
            .map(|slide| render::format_markdown_list(&slide.lines.join("\n")))
            .filter(|list| !list.is_empty())
            .enumerate()
            .map(|(i, list)| format!("## Slide {}\n\n{list}", i + 1))
            .collect();
        if sections.is_empty() {
            self.loose.lines.join("\n")
        } else {
            sections.join("\n\n")
        }
    }
}

/// Reader for legacy presentation files.
#[derive(Debug)]
pub struct PresentationReader {
    data: Vec<u8>,
}

impl PresentationReader {
    /// Read a presentation from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    fn document_stream(&self) -> Result<Vec<u8>> {
        let file = CompoundFile::from_bytes(self.data.clone())?;
        file.stream_by_name(DOCUMENT_STREAM)
            .filter(|stream| !stream.is_empty())
            .ok_or_else(|| Error::MissingComponent(DOCUMENT_STREAM.to_string()))
    }

    /// Slide text from the record walk alone.
    pub fn parse_records(&self) -> Result<String> {
        let stream = self.document_stream()?;
        Ok(SlideTexts::collect(&stream).render())
    }

    /// Convert to Markdown.
    ///
    /// Output that is not already split into slides is presented as a
    /// single `## DPS Slides` bullet list.
    pub fn parse(&self) -> String {
        let text = match self.parse_records() {
            Ok(text) if !text.is_empty() => text,
            result => {
                if let Err(e) = result {
                    tracing::debug!(error = %e, "presentation records unreadable");
                }
                self.parse_fallback()
            }
        };
        if text.is_empty() || text.starts_with("## Slide ") {
            return text;
        }
        let list = render::format_markdown_list(&text);
        if list.is_empty() {
            text
        } else {
            format!("## DPS Slides\n\n{list}")
        }
    }

    fn parse_fallback(&self) -> String {
        if let Ok(stream) = self.document_stream() {
            let text = heuristic::extract_utf16_text(&stream);
            if !text.is_empty() {
                return text;
            }
            let text = heuristic::decode_with_codec_names(&stream, &FALLBACK_CODECS);
            if !text.is_empty() {
                return text;
            }
        }
        tracing::debug!("scanning raw presentation bytes");
        heuristic::extract_utf16_text(&self.data)
    }
}

/// Convert a legacy presentation buffer to Markdown.
pub fn read_presentation(data: &[u8]) -> String {
    PresentationReader::from_bytes(data.to_vec()).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ver_inst: u16, record_type: u16, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + body.len());
        out.extend_from_slice(&ver_inst.to_le_bytes());
        out.extend_from_slice(&record_type.to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_record_header() {
        let data = record(0x001F, 0x03EE, &[1, 2]);
        let header = RecordHeader::parse(&data, 0).unwrap();
        assert_eq!(header.version, 0xF);
        assert_eq!(header.instance, 1);
        assert_eq!(header.record_type, 0x03EE);
        assert_eq!(header.size, 2);
        assert!(header.is_slide_container());
        assert!(RecordHeader::parse(&data, 5).is_none());
    }

    #[test]
    fn test_decode_text_record() {
        assert_eq!(
            decode_text_record(TEXT_CHARS_ATOM, &utf16("Hi\rthere\tyou")).as_deref(),
            Some("Hi\nthere you")
        );
        assert_eq!(
            decode_text_record(TEXT_BYTES_ATOM, b"plain").as_deref(),
            Some("plain")
        );
        assert!(decode_text_record(0x0FA1, &utf16("style")).is_none());
        assert!(decode_text_record(TEXT_BYTES_ATOM, &[1, 2, 3, 4, 5]).is_none());
    }

    #[test]
    fn test_even_length_byte_atom_reads_as_utf16() {
        assert_eq!(
            decode_text_record(TEXT_BYTES_ATOM, b"Agenda").as_deref(),
            Some("\u{6741}\u{6E65}\u{6164}")
        );
        assert_eq!(
            decode_text_record(TEXT_BYTES_ATOM, b"Agenda:").as_deref(),
            Some("Agenda:")
        );
    }

    #[test]
    fn test_slides_from_records() {
        let slide1 = record(
            0x000F,
            0x03EE,
            &[
                record(0, TEXT_CHARS_ATOM, &utf16("标题一")),
                record(0, TEXT_BYTES_ATOM, b"Body line\rBody line"),
            ]
            .concat(),
        );
        let empty_slide = record(0x000F, 0x03EE, &record(0, 0x0FA1, &[0; 6]));
        let slide2 = record(
            0x000F,
            0x03EE,
            &record(0x000F, 0x040C, &record(0, TEXT_CHARS_ATOM, &utf16("Nested"))),
        );
        let document = record(0x000F, 0x03E8, &[slide1, empty_slide, slide2].concat());

        let texts = SlideTexts::collect(&document);
        assert_eq!(texts.slides.len(), 2);
        assert_eq!(
            texts.render(),
            "## Slide 1\n\n- 标题一\n- Body line\n\n## Slide 2\n\n- Nested"
        );
    }

    #[test]
    fn test_loose_text_without_slides() {
        let stream = [
            record(0, CSTRING, &utf16("Loose one")),
            record(0, CSTRING, &utf16("Root Entry")),
            record(0, CSTRING, &utf16("Loose one")),
        ]
        .concat();
        let texts = SlideTexts::collect(&stream);
        assert!(texts.slides.is_empty());
        assert_eq!(texts.render(), "Loose one");
    }

    #[test]
    fn test_truncated_record_stops_walk() {
        let mut stream = record(0, CSTRING, &utf16("Kept text"));
        stream.extend(record(0, CSTRING, &utf16("lost")).iter().take(10));
        assert_eq!(SlideTexts::collect(&stream).render(), "Kept text");
    }

    #[test]
    fn test_deep_nesting_is_bounded() {
        let mut data = record(0, CSTRING, &utf16("deep text"));
        for _ in 0..(MAX_DEPTH + 10) {
            data = record(0x000F, 0x0FFF, &data);
        }
        assert!(SlideTexts::collect(&data).render().is_empty());
    }

    #[test]
    fn test_non_compound_input_scans_bytes() {
        let mut data = vec![0u8; 4];
        data.extend(utf16("幻灯片内容"));
        assert_eq!(read_presentation(&data), "## DPS Slides\n\n- 幻灯片内容");
    }
}
