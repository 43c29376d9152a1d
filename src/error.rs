//! Error types for the doc2md library.

use std::io;
use thiserror::Error;

/// Result type alias for doc2md operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the individual readers and extractors.
///
/// These never cross [`crate::convert_file`]; the dispatcher turns them into
/// warnings on the [`crate::ConversionResult`].
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Malformed compound file (OLE2) structure.
    #[error("Compound file error: {0}")]
    Ole(String),

    /// Malformed PDF framing.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Error reading a legacy spreadsheet.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Invalid or malformed data in the document.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required document component is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<calamine::XlsError> for Error {
    fn from(err: calamine::XlsError) -> Self {
        Error::Spreadsheet(err.to_string())
    }
}
