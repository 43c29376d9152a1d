//! XLSX (Excel) spreadsheet parser.
//!
//! Worksheets under `xl/worksheets/` are read in numeric order and rendered
//! as Markdown tables, with string cells resolved through the shared
//! strings part.
//!
//! # Example
//!
//! ```no_run
//! use doc2md::xlsx::XlsxParser;
//!
//! let parser = XlsxParser::open("spreadsheet.xlsx")?;
//! println!("{}", parser.parse()?);
//! # Ok::<(), doc2md::Error>(())
//! ```

mod parser;
mod shared_strings;

pub use parser::{parse_worksheet, XlsxParser};
pub use shared_strings::SharedStrings;
