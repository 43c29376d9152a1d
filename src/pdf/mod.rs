//! PDF text extraction without a PDF library.
//!
//! Streams are located by scanning the raw file, fonts are tied to their
//! `ToUnicode` CMaps through `/Name N 0 R` references, and every remaining
//! stream is run through a small content stream interpreter.
//!
//! ```no_run
//! use doc2md::pdf::PdfReader;
//!
//! let text = PdfReader::open("paper.pdf")?.parse()?;
//! println!("{text}");
//! # Ok::<(), doc2md::Error>(())
//! ```

mod cmap;
mod content;
mod lexer;
mod objects;

pub use cmap::{decode_plain, parse_to_unicode_cmap, FontMap};
pub use content::extract_text;
pub use objects::{
    font_resource_targets, object_content, object_number_before, scan_streams, to_unicode_object,
    PdfStream,
};

use crate::codec;
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Glyph maps by font resource name, plus the objects that held them.
fn build_font_maps(
    file: &[u8],
    streams: &[PdfStream],
) -> (HashMap<String, FontMap>, HashSet<u32>) {
    let by_object: HashMap<u32, &[u8]> = streams
        .iter()
        .filter_map(|stream| Some((stream.object_number?, stream.data.as_slice())))
        .collect();

    let mut fonts = HashMap::new();
    let mut cmap_objects = HashSet::new();
    for (name, font_object) in font_resource_targets(file) {
        let Some(cmap_object) = to_unicode_object(file, font_object) else {
            continue;
        };
        let Some(data) = by_object.get(&cmap_object) else {
            continue;
        };
        let map = parse_to_unicode_cmap(data);
        tracing::debug!(font = %name, glyphs = map.len(), "loaded ToUnicode map");
        fonts.insert(name, map);
        cmap_objects.insert(cmap_object);
    }
    (fonts, cmap_objects)
}

/// Reader for PDF files.
#[derive(Debug)]
pub struct PdfReader {
    data: Vec<u8>,
}

impl PdfReader {
    /// Read a PDF from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Text of every content stream in file order, separated by blank
    /// lines. Fails only when the file holds no usable stream at all.
    pub fn parse(&self) -> Result<String> {
        let streams = scan_streams(&self.data);
        if streams.is_empty() {
            return Err(Error::Pdf("no content streams found".to_string()));
        }
        let (fonts, cmap_objects) = build_font_maps(&self.data, &streams);

        let blocks: Vec<String> = streams
            .iter()
            .filter(|stream| {
                stream
                    .object_number
                    .is_none_or(|number| !cmap_objects.contains(&number))
            })
            .map(|stream| codec::trim(&extract_text(&stream.data, &fonts)).to_string())
            .filter(|text| !text.is_empty())
            .collect();
        Ok(blocks.join("\n\n"))
    }
}

/// Convert a PDF buffer to text.
pub fn read_pdf(data: &[u8]) -> Result<String> {
    PdfReader::from_bytes(data.to_vec()).parse()
}
