//! Format selection from file extensions, corrected by container sniffing.

use crate::container::ZipContainer;
use crate::ole;
use std::fmt;
use std::path::Path;

/// ZIP local file header, empty archive and spanned archive markers.
const ZIP_MAGICS: [&[u8]; 3] = [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];

/// Source code extensions that are passed through as fenced blocks.
pub const CODE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "css", "h", "hpp", "js", "py", "ts"];

/// Plain text extensions that are passed through trimmed.
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["cfg", "ini", "json", "log", "txt"];

/// The handler a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Word document (.docx)
    Docx,
    /// OpenDocument text (.odt)
    Odt,
    /// PowerPoint presentation (.pptx)
    Pptx,
    /// OpenDocument presentation (.odp)
    Odp,
    /// Excel workbook (.xlsx)
    Xlsx,
    /// OpenDocument spreadsheet (.ods)
    Ods,
    /// Legacy Word binary (.doc, .wps)
    WordBinary,
    /// Portable Document Format (.pdf)
    Pdf,
    /// Legacy spreadsheet (.et)
    Et,
    /// Legacy presentation (.dps)
    Dps,
    /// Plain text passthrough
    PlainText,
    /// Source code wrapped in a fence
    Code,
    /// Markdown reduced to text
    Markdown,
    /// HTML reduced to text
    Html,
    /// Anything else, passed through trimmed
    Other,
}

impl FormatKind {
    /// Map a lowercased extension (without the dot) to its handler.
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "docx" => FormatKind::Docx,
            "odt" => FormatKind::Odt,
            "pptx" => FormatKind::Pptx,
            "odp" => FormatKind::Odp,
            "xlsx" => FormatKind::Xlsx,
            "ods" => FormatKind::Ods,
            "doc" | "wps" => FormatKind::WordBinary,
            "pdf" => FormatKind::Pdf,
            "et" => FormatKind::Et,
            "dps" => FormatKind::Dps,
            "md" | "markdown" => FormatKind::Markdown,
            "html" | "htm" => FormatKind::Html,
            ext if CODE_EXTENSIONS.contains(&ext) => FormatKind::Code,
            ext if PLAIN_TEXT_EXTENSIONS.contains(&ext) => FormatKind::PlainText,
            _ => FormatKind::Other,
        }
    }

    /// Whether the format lives in a ZIP or compound file container.
    pub fn is_office(&self) -> bool {
        matches!(
            self,
            FormatKind::Docx
                | FormatKind::Odt
                | FormatKind::Pptx
                | FormatKind::Odp
                | FormatKind::Xlsx
                | FormatKind::Ods
                | FormatKind::WordBinary
                | FormatKind::Et
                | FormatKind::Dps
        )
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatKind::Docx => "Word Document",
            FormatKind::Odt => "OpenDocument Text",
            FormatKind::Pptx => "PowerPoint Presentation",
            FormatKind::Odp => "OpenDocument Presentation",
            FormatKind::Xlsx => "Excel Workbook",
            FormatKind::Ods => "OpenDocument Spreadsheet",
            FormatKind::WordBinary => "Legacy Word Document",
            FormatKind::Pdf => "PDF Document",
            FormatKind::Et => "Legacy Spreadsheet",
            FormatKind::Dps => "Legacy Presentation",
            FormatKind::PlainText => "Plain Text",
            FormatKind::Code => "Source Code",
            FormatKind::Markdown => "Markdown",
            FormatKind::Html => "HTML",
            FormatKind::Other => "Unknown",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Every extension with a dedicated handler, sorted.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut extensions = vec![
        "docx", "odt", "pptx", "odp", "xlsx", "ods", "doc", "wps", "pdf", "et", "dps", "md",
        "markdown", "html", "htm",
    ];
    extensions.extend_from_slice(CODE_EXTENSIONS);
    extensions.extend_from_slice(PLAIN_TEXT_EXTENSIONS);
    extensions.sort_unstable();
    extensions
}

/// Lowercased text after the last `.` of the file name, or empty.
pub fn extension_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) => name[dot + 1..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Outer container recognised from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Zip,
    Ole,
    Unknown,
}

/// Identify the container from magic bytes.
pub fn sniff_container(data: &[u8]) -> ContainerKind {
    if ZIP_MAGICS.iter().any(|magic| data.starts_with(magic)) {
        ContainerKind::Zip
    } else if data.starts_with(&ole::SIGNATURE) {
        ContainerKind::Ole
    } else {
        ContainerKind::Unknown
    }
}

/// Tell the OOXML and ODF families apart by their parts.
pub fn detect_zip_kind(container: &ZipContainer) -> Option<&'static str> {
    if container.exists("word/document.xml") {
        return Some("docx");
    }
    if container.exists("ppt/presentation.xml") || !container.files_with_prefix("ppt/").is_empty()
    {
        return Some("pptx");
    }
    if container.exists("xl/workbook.xml") || !container.files_with_prefix("xl/").is_empty() {
        return Some("xlsx");
    }
    if container.exists("content.xml") {
        let mimetype = container
            .file_content("mimetype")
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        if mimetype.contains("opendocument.presentation") {
            return Some("odp");
        }
        if mimetype.contains("opendocument.spreadsheet") {
            return Some("ods");
        }
        return Some("odt");
    }
    None
}

/// The handler chosen for a buffer after sniffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub kind: FormatKind,
    pub extension: String,
    pub warning: Option<String>,
}

/// Pick the handler for `data` declared with `extension`.
///
/// Office extensions are checked against the container actually present:
/// a ZIP of another OOXML/ODF family is routed to that family, and a
/// compound file behind a ZIP-based extension goes to the matching legacy
/// reader. Every override records a warning.
pub fn detect(data: &[u8], extension: &str) -> Detection {
    let declared = FormatKind::from_extension(extension);
    let unchanged = Detection {
        kind: declared,
        extension: extension.to_string(),
        warning: None,
    };
    if !declared.is_office() {
        return unchanged;
    }

    let inferred = match sniff_container(data) {
        ContainerKind::Zip => ZipContainer::from_bytes(data.to_vec())
            .ok()
            .and_then(|container| detect_zip_kind(&container)),
        ContainerKind::Ole => match declared {
            FormatKind::Docx | FormatKind::Odt => Some("doc"),
            FormatKind::Xlsx | FormatKind::Ods => Some("et"),
            FormatKind::Pptx | FormatKind::Odp => Some("dps"),
            _ => None,
        },
        ContainerKind::Unknown => None,
    };

    match inferred {
        Some(kind) if FormatKind::from_extension(kind) != declared => {
            tracing::debug!(declared = extension, detected = kind, "container overrides extension");
            Detection {
                kind: FormatKind::from_extension(kind),
                extension: kind.to_string(),
                warning: Some(format!(
                    "Detected {kind} content in file with .{extension} extension"
                )),
            }
        }
        _ => unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            for (name, data) in entries {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(data.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_extension_table() {
        assert_eq!(FormatKind::from_extension("docx"), FormatKind::Docx);
        assert_eq!(FormatKind::from_extension("wps"), FormatKind::WordBinary);
        assert_eq!(FormatKind::from_extension("hpp"), FormatKind::Code);
        assert_eq!(FormatKind::from_extension("json"), FormatKind::PlainText);
        assert_eq!(FormatKind::from_extension("htm"), FormatKind::Html);
        assert_eq!(FormatKind::from_extension("rtf"), FormatKind::Other);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("dir.v2/Report.DOCX")), "docx");
        assert_eq!(extension_of(Path::new("archive.tar.gz")), "gz");
        assert_eq!(extension_of(Path::new("README")), "");
    }

    #[test]
    fn test_supported_extensions_sorted() {
        let extensions = supported_extensions();
        assert!(extensions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(extensions.contains(&"dps"));
        assert!(extensions.contains(&"cc"));
    }

    #[test]
    fn test_sniff_container() {
        assert_eq!(sniff_container(b"PK\x03\x04rest"), ContainerKind::Zip);
        assert_eq!(sniff_container(&ole::SIGNATURE), ContainerKind::Ole);
        assert_eq!(sniff_container(b"%PDF-1.4"), ContainerKind::Unknown);
    }

    #[test]
    fn test_zip_family_override() {
        let data = zip_with(&[("xl/workbook.xml", "<workbook/>")]);
        let detection = detect(&data, "docx");
        assert_eq!(detection.kind, FormatKind::Xlsx);
        assert_eq!(detection.extension, "xlsx");
        assert_eq!(
            detection.warning.as_deref(),
            Some("Detected xlsx content in file with .docx extension")
        );

        let data = zip_with(&[
            ("mimetype", "application/vnd.oasis.opendocument.spreadsheet"),
            ("content.xml", "<office:document-content/>"),
        ]);
        assert_eq!(detect(&data, "odt").kind, FormatKind::Ods);
    }

    #[test]
    fn test_ole_behind_docx() {
        let mut data = ole::SIGNATURE.to_vec();
        data.resize(512, 0);
        let detection = detect(&data, "docx");
        assert_eq!(detection.kind, FormatKind::WordBinary);
        assert_eq!(detection.extension, "doc");
    }

    #[test]
    fn test_matching_or_plain_extensions_untouched() {
        let data = zip_with(&[("word/document.xml", "<w:document/>")]);
        let detection = detect(&data, "docx");
        assert_eq!(detection.kind, FormatKind::Docx);
        assert!(detection.warning.is_none());

        assert_eq!(detect(&data, "txt").kind, FormatKind::PlainText);
        assert_eq!(detect(b"", "doc").kind, FormatKind::WordBinary);
    }
}
