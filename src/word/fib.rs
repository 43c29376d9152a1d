//! File Information Block and piece table decoding.

use crate::codec::{self, read_u16_le, read_u32_le};

/// `wIdent` of every Word 97+ `WordDocument` stream.
pub const WORD_MAGIC: u16 = 0xA5EC;

/// Minimum length of a `WordDocument` stream holding a full FIB header.
const MIN_FIB_LEN: usize = 256;

/// Index of the `fcClx`/`lcbClx` pair inside `rgFcLcb`.
const CLX_PAIR_INDEX: usize = 33;

const FLAG_COMPLEX: u16 = 0x0004;
const FLAG_TABLE1: u16 = 0x0200;

const CLX_PIECE_TABLE: u8 = 0x01;
const CLX_PRCS: u8 = 0x02;

/// Size of one piece descriptor (`PCD`).
const PCD_SIZE: usize = 8;

/// Set in a piece's file offset when the piece is stored as single bytes.
const FC_COMPRESSED: u32 = 0x4000_0000;

/// The FIB fields needed to locate document text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FibInfo {
    pub fc_min: u32,
    pub fc_mac: u32,
    pub fc_clx: u32,
    pub lcb_clx: u32,
    pub use_table1: bool,
    pub complex: bool,
}

impl FibInfo {
    /// Name of the table stream holding the Clx.
    pub fn table_stream_name(&self) -> &'static str {
        if self.use_table1 {
            "1Table"
        } else {
            "0Table"
        }
    }

    pub fn has_clx(&self) -> bool {
        self.fc_clx != 0 && self.lcb_clx != 0
    }
}

/// One run of document text in the `WordDocument` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPiece {
    pub cp_start: u32,
    pub cp_end: u32,
    pub file_offset: u32,
    pub unicode: bool,
}

impl TextPiece {
    fn char_count(&self) -> usize {
        self.cp_end.saturating_sub(self.cp_start) as usize
    }
}

/// Read the FIB header of a `WordDocument` stream.
///
/// Walks the `csw` and `cslw` arrays to reach `rgFcLcb`; the Clx pair is
/// only filled in when that array is long enough to contain it.
pub fn parse_fib(stream: &[u8]) -> Option<FibInfo> {
    if stream.len() < MIN_FIB_LEN || read_u16_le(stream, 0)? != WORD_MAGIC {
        return None;
    }
    let flags = read_u16_le(stream, 0x0A)?;
    let mut fib = FibInfo {
        fc_min: read_u32_le(stream, 0x18)?,
        fc_mac: read_u32_le(stream, 0x1C)?,
        use_table1: flags & FLAG_TABLE1 != 0,
        complex: flags & FLAG_COMPLEX != 0,
        ..FibInfo::default()
    };

    let mut pos = 32usize;
    let csw = usize::from(read_u16_le(stream, pos)?);
    pos += 2 + csw * 2;
    let cslw = usize::from(read_u16_le(stream, pos)?);
    pos += 2 + cslw * 4;
    let cb_rg_fc_lcb = usize::from(read_u16_le(stream, pos)?);
    pos += 2;
    if stream.len() < pos + cb_rg_fc_lcb * 8 {
        return None;
    }
    if cb_rg_fc_lcb > CLX_PAIR_INDEX {
        let pair = pos + CLX_PAIR_INDEX * 8;
        fib.fc_clx = read_u32_le(stream, pair)?;
        fib.lcb_clx = read_u32_le(stream, pair + 4)?;
    }
    Some(fib)
}

/// Parse the piece table out of the Clx in the table stream.
///
/// Property modifier blocks (`Prc`) ahead of the piece table are skipped;
/// anything malformed yields the pieces read so far.
pub fn parse_text_pieces(table: &[u8], fc_clx: u32, lcb_clx: u32) -> Vec<TextPiece> {
    let mut pieces = Vec::new();
    if fc_clx == 0 || lcb_clx == 0 {
        return pieces;
    }
    let start = fc_clx as usize;
    let Some(end) = start.checked_add(lcb_clx as usize) else {
        return pieces;
    };
    let Some(clx) = table.get(start..end) else {
        return pieces;
    };

    let mut pos = 0usize;
    while pos < clx.len() {
        match clx[pos] {
            CLX_PIECE_TABLE => {
                let Some(lcb) = read_u32_le(clx, pos + 1) else {
                    break;
                };
                let plc = pos + 5;
                let lcb = lcb as usize;
                if lcb < 4 || plc.checked_add(lcb).is_none_or(|end| end > clx.len()) {
                    break;
                }
                let count = (lcb - 4) / (4 + PCD_SIZE);
                let boundaries: Option<Vec<u32>> =
                    (0..=count).map(|i| read_u32_le(clx, plc + i * 4)).collect();
                let Some(boundaries) = boundaries else {
                    break;
                };
                let descriptors = plc + (count + 1) * 4;
                for (i, window) in boundaries.windows(2).enumerate() {
                    let Some(fc) = read_u32_le(clx, descriptors + i * PCD_SIZE + 2) else {
                        break;
                    };
                    let unicode = fc & FC_COMPRESSED == 0;
                    pieces.push(TextPiece {
                        cp_start: window[0],
                        cp_end: window[1],
                        file_offset: if unicode { fc } else { (fc & 0x3FFF_FFFF) / 2 },
                        unicode,
                    });
                }
                break;
            }
            CLX_PRCS => {
                let Some(cb) = read_u16_le(clx, pos + 1) else {
                    break;
                };
                pos += 3 + usize::from(cb);
            }
            _ => break,
        }
    }
    pieces
}

/// Concatenate the text of every in-bounds piece in table order.
pub fn decode_pieces(stream: &[u8], pieces: &[TextPiece]) -> String {
    let mut text = String::new();
    for piece in pieces {
        let chars = piece.char_count();
        if chars == 0 {
            continue;
        }
        let width = if piece.unicode { 2 } else { 1 };
        let start = piece.file_offset as usize;
        let Some(bytes) = start
            .checked_add(chars * width)
            .and_then(|end| stream.get(start..end))
        else {
            continue;
        };
        if piece.unicode {
            text.push_str(&codec::utf16le_to_string(bytes));
        } else {
            text.push_str(&codec::latin1_to_string(bytes));
        }
    }
    text
}

/// Decode `fc_min..fc_mac` as a single UTF-16 run, for files without a
/// usable piece table.
pub fn decode_simple_range(stream: &[u8], fc_min: u32, fc_mac: u32) -> String {
    let start = fc_min as usize;
    if fc_mac <= fc_min || start >= stream.len() {
        return String::new();
    }
    let limit = (fc_mac as usize).min(stream.len());
    let span = limit - start;
    if span < 4 {
        return String::new();
    }
    codec::utf16le_to_string(&stream[start..start + (span & !1)])
}
