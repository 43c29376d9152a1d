//! PPTX (PowerPoint) presentation parser.
//!
//! Slides under `ppt/slides/` are read in numeric order; every DrawingML
//! paragraph becomes one bullet.

mod parser;

pub use parser::{parse_slide_xml, PptxParser};
