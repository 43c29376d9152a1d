//! In-memory ZIP container used by the OOXML and OpenDocument extractors.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// Once UTF-16 XML has been decoded into a Rust string the declaration
/// still says UTF-16, which would make quick-xml reinterpret the text.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if let Some(rest) = content.strip_prefix("<?xml") {
        if let Some(end) = rest.find("?>") {
            let decl = &rest[..end];
            let fixed = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");
            return format!("<?xml{}{}", fixed, &rest[end..]);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling UTF-8 (with or without BOM) and UTF-16 LE/BE.
pub fn decode_xml_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return fix_xml_encoding_declaration(&crate::codec::utf16le_to_string(rest));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return fix_xml_encoding_declaration(&crate::codec::utf16be_to_string(rest));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 => {
            fix_xml_encoding_declaration(&crate::codec::utf16le_to_string(bytes))
        }
        Err(_) if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 => {
            fix_xml_encoding_declaration(&crate::codec::utf16be_to_string(bytes))
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// A ZIP archive held entirely in memory.
///
/// Entry lookups are exact and case-sensitive. The archive lives for one
/// conversion and is dropped with it.
pub struct ZipContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl ZipContainer {
    /// Read a whole file and index its central directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use doc2md::container::ZipContainer;
    ///
    /// let container = ZipContainer::open("report.docx")?;
    /// let document = container.read_xml("word/document.xml")?;
    /// # Ok::<(), doc2md::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Index an in-memory ZIP archive.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::ZipArchive("empty input".to_string()));
        }
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Decompressed bytes of the named entry, or `None` if it is absent or
    /// cannot be inflated.
    pub fn file_content(&self, name: &str) -> Option<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive.by_name(name).ok()?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).ok()?;
        Some(data)
    }

    /// Read an XML entry as a string, decoding UTF-16 when declared by a BOM.
    pub fn read_xml(&self, name: &str) -> Result<String> {
        let bytes = self
            .file_content(name)
            .ok_or_else(|| Error::MissingComponent(name.to_string()))?;
        Ok(decode_xml_bytes(&bytes))
    }

    /// Check if an entry exists.
    pub fn exists(&self, name: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == name);
        found
    }

    /// Entry names starting with `prefix`, sorted lexicographically.
    pub fn files_with_prefix(&self, prefix: &str) -> Vec<String> {
        let archive = self.archive.borrow();
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with(prefix))
            .map(String::from)
            .collect();
        names.sort();
        names
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.archive.borrow().len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ZipContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipContainer")
            .field("entries", &self.len())
            .finish()
    }
}

/// Trailing decimal number in an entry name (`sheet12.xml` gives 12).
pub fn trailing_number(name: &str) -> u64 {
    let digits: Vec<char> = name
        .chars()
        .rev()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .iter()
        .rev()
        .fold(0u64, |acc, c| {
            acc.saturating_mul(10)
                .saturating_add(u64::from(c.to_digit(10).unwrap_or(0)))
        })
}

/// Sort part names by their trailing number, name as tie-breaker.
pub fn sort_by_trailing_number(names: &mut [String]) {
    names.sort_by(|a, b| {
        trailing_number(a)
            .cmp(&trailing_number(b))
            .then_with(|| a.cmp(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (name, data) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_file_content_roundtrip() {
        let data = build_zip(&[("a/b.xml", b"<x/>"), ("c.txt", b"hello")]);
        let container = ZipContainer::from_bytes(data).unwrap();
        assert_eq!(container.file_content("c.txt").as_deref(), Some(&b"hello"[..]));
        assert_eq!(container.file_content("C.TXT"), None);
        assert!(container.exists("a/b.xml"));
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_files_with_prefix_isolates_sheets() {
        let data = build_zip(&[
            ("xl/worksheets/sheet2.xml", b"<worksheet/>"),
            ("xl/worksheets/_rels/sheet1.xml.rels", b"<Relationships/>"),
            ("xl/worksheets/sheet1.xml", b"<worksheet/>"),
            ("xl/workbook.xml", b"<workbook/>"),
        ]);
        let container = ZipContainer::from_bytes(data).unwrap();
        assert_eq!(
            container.files_with_prefix("xl/worksheets/sheet"),
            vec!["xl/worksheets/sheet1.xml", "xl/worksheets/sheet2.xml"]
        );
    }

    #[test]
    fn test_invalid_archives() {
        assert!(ZipContainer::from_bytes(Vec::new()).is_err());
        assert!(ZipContainer::from_bytes(b"not a zip at all".to_vec()).is_err());
    }

    #[test]
    fn test_utf16_xml_decoding() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><a>é</a>";
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(xml.encode_utf16().flat_map(|u| u.to_le_bytes()));
        assert_eq!(
            decode_xml_bytes(&bytes),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a>é</a>"
        );
        assert_eq!(decode_xml_bytes(b"\xEF\xBB\xBF<a/>"), "<a/>");
    }

    #[test]
    fn test_trailing_number_ordering() {
        assert_eq!(trailing_number("xl/worksheets/sheet12.xml"), 12);
        assert_eq!(trailing_number("slide.xml"), 0);
        let mut names = vec![
            "sheet10.xml".to_string(),
            "sheet2.xml".to_string(),
            "sheet1.xml".to_string(),
        ];
        sort_by_trailing_number(&mut names);
        assert_eq!(names, vec!["sheet1.xml", "sheet2.xml", "sheet10.xml"]);
    }
}
