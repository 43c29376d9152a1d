//! # doc2md
//!
//! Document to Markdown conversion for Office, OpenDocument, WPS and PDF
//! files, without any document SDK.
//!
//! ## Quick Start
//!
//! ```no_run
//! use doc2md::{convert_file, ConversionOptions};
//!
//! let result = convert_file("report.docx", &ConversionOptions::default());
//! if result.success {
//!     std::fs::write("report.md", &result.markdown)?;
//! } else {
//!     for warning in &result.warnings {
//!         eprintln!("{warning}");
//!     }
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Format-Specific APIs
//!
//! ```no_run
//! use doc2md::docx::DocxParser;
//! use doc2md::pdf::PdfReader;
//! use doc2md::word::WordBinaryReader;
//!
//! let markdown = DocxParser::open("report.docx")?.parse()?;
//! let text = PdfReader::open("paper.pdf")?.parse()?;
//! let legacy = WordBinaryReader::open("notes.wps")?.parse();
//! # Ok::<(), doc2md::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: [`convert_file_async`] on the Tokio blocking pool

pub mod codec;
pub mod container;
pub mod detect;
pub mod docx;
pub mod error;
pub mod et;
pub mod heuristic;
pub mod model;
pub mod odf;
pub mod ole;
pub mod pdf;
pub mod ppt;
pub mod pptx;
pub mod render;
pub mod word;
pub mod xlsx;
pub mod xml;

// Re-exports
pub use detect::{supported_extensions, FormatKind};
pub use error::{Error, Result};
pub use model::{ConversionOptions, ConversionResult};

use std::path::Path;

/// Run the reader for `kind` over `data`.
fn extract(kind: FormatKind, data: &[u8], extension: &str) -> Result<String> {
    match kind {
        FormatKind::Docx => docx::DocxParser::from_bytes(data.to_vec())?.parse(),
        FormatKind::Odt => odf::OdfParser::from_bytes(data.to_vec())?.parse_text(),
        FormatKind::Pptx => pptx::PptxParser::from_bytes(data.to_vec())?.parse(),
        FormatKind::Odp => odf::OdfParser::from_bytes(data.to_vec())?.parse_presentation(),
        FormatKind::Xlsx => xlsx::XlsxParser::from_bytes(data.to_vec())?.parse(),
        FormatKind::Ods => odf::OdfParser::from_bytes(data.to_vec())?.parse_spreadsheet(),
        FormatKind::WordBinary => Ok(word::read_word_binary(data)),
        FormatKind::Pdf => pdf::read_pdf(data),
        FormatKind::Et => Ok(et::read_spreadsheet(data)),
        FormatKind::Dps => Ok(ppt::read_presentation(data)),
        FormatKind::PlainText | FormatKind::Other => {
            Ok(codec::trim(&codec::decode_text_bytes(data)).to_string())
        }
        FormatKind::Code => Ok(render::fenced_code_block(
            &codec::decode_text_bytes(data),
            extension,
        )),
        FormatKind::Markdown => Ok(render::markdown_to_text(&codec::decode_text_bytes(data))),
        FormatKind::Html => Ok(render::html_to_text(&codec::decode_text_bytes(data))),
    }
}

fn convert_labeled(
    data: &[u8],
    extension: &str,
    label: &str,
    _options: &ConversionOptions,
) -> ConversionResult {
    let mut warnings = Vec::new();
    let detection = detect::detect(data, extension);
    warnings.extend(detection.warning);
    tracing::debug!(file = label, format = %detection.kind, "converting");

    let markdown = if data.is_empty() {
        String::new()
    } else {
        match extract(detection.kind, data, &detection.extension) {
            Ok(markdown) => markdown,
            Err(e) => {
                tracing::warn!(file = label, format = %detection.kind, error = %e, "reader failed");
                warnings.push(format!("Failed to read {} content: {e}", detection.kind));
                String::new()
            }
        }
    };

    let mut result = ConversionResult::new(markdown, warnings);
    if result.is_empty() {
        result.push_warning(format!("No parser produced output for file: {label}"));
    }
    result
}

/// Convert the file at `path` to Markdown.
///
/// Never fails: unreadable files and reader errors become warnings and an
/// unsuccessful result.
///
/// # Example
///
/// ```no_run
/// use doc2md::{convert_file, ConversionOptions};
///
/// let result = convert_file("slides.dps", &ConversionOptions::default());
/// println!("{}", result.markdown);
/// ```
pub fn convert_file(path: impl AsRef<Path>, options: &ConversionOptions) -> ConversionResult {
    let path = path.as_ref();
    let label = path.display().to_string();
    let data = std::fs::read(path).unwrap_or_else(|e| {
        tracing::warn!(file = %label, error = %e, "cannot read input");
        Vec::new()
    });
    convert_labeled(&data, &detect::extension_of(path), &label, options)
}

/// Convert an in-memory document whose type is given by `extension`
/// (without the dot, any case).
///
/// # Example
///
/// ```
/// use doc2md::{convert_bytes, ConversionOptions};
///
/// let result = convert_bytes(b"  hello  ", "txt", &ConversionOptions::default());
/// assert_eq!(result.markdown, "hello");
/// assert!(result.success);
/// ```
pub fn convert_bytes(data: &[u8], extension: &str, options: &ConversionOptions) -> ConversionResult {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    let label = format!("<memory>.{extension}");
    convert_labeled(data, &extension, &label, options)
}

/// [`convert_file`] on Tokio's blocking thread pool.
#[cfg(feature = "async")]
pub async fn convert_file_async(
    path: impl AsRef<Path>,
    options: &ConversionOptions,
) -> ConversionResult {
    let path = path.as_ref().to_path_buf();
    let options = options.clone();
    let label = path.display().to_string();
    match tokio::task::spawn_blocking(move || convert_file(&path, &options)).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(file = %label, error = %e, "conversion task failed");
            ConversionResult::new(
                String::new(),
                vec![format!("No parser produced output for file: {label}")],
            )
        }
    }
}
