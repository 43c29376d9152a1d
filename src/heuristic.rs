//! Recovery of readable text from noisy binary data.
//!
//! Legacy binaries frequently leave stream names, template paths and field
//! codes next to the real text. Candidates are filtered through a noise list
//! and ranked by [`chunk_score`]; anything well below the best candidate is
//! dropped rather than included.

use crate::codec::{self, read_u16_le};
use std::collections::HashSet;

/// Minimum trimmed length of a candidate chunk, in bytes.
pub const MIN_CHUNK_LEN: usize = 2;

/// Maximum trimmed length of a candidate chunk, in bytes.
pub const MAX_CHUNK_LEN: usize = 1024;

/// Candidates scoring more than this below the best one are discarded.
pub const SCORE_BAND: i32 = 4;

/// Characters scored as CJK by [`chunk_score`]. Matched per code point
/// (CJK Unified Ideographs), not by inspecting encoded lead bytes, so CJK
/// punctuation and other three-byte scripts do not count.
pub const CJK_IDEOGRAPHS: std::ops::RangeInclusive<char> = '\u{4E00}'..='\u{9FFF}';

/// Shortest UTF-16 run kept by [`extract_utf16_text`], in code units.
const MIN_UTF16_RUN: usize = 3;

/// Shortest byte run decoded by [`decode_with_code_page`].
const MIN_CODE_PAGE_RUN: usize = 4;

const NOISE_NAMES: &[&str] = &[
    "Root Entry",
    "SummaryInformation",
    "DocumentSummaryInformation",
    "WordDocument",
    "0Table",
    "1Table",
    "Normal.dotm",
    "WpsCustomData",
    "KSOProductBuildVer",
    "KSOTemplateDocerSaveRecord",
];

const FIELD_KEYWORDS: &[&str] = &["HYPERLINK", "INCLUDEPICTURE", "MERGEFIELD", "PAGEREF"];

/// Whether a chunk is plausible document text rather than container noise.
pub fn looks_like_document_text(chunk: &str) -> bool {
    let trimmed = codec::trim(chunk);
    if trimmed.len() < MIN_CHUNK_LEN || trimmed.len() > MAX_CHUNK_LEN {
        return false;
    }
    !NOISE_NAMES.contains(&trimmed)
}

/// Whether the text starts with a Word field instruction keyword.
pub fn looks_like_field_instruction(text: &str) -> bool {
    FIELD_KEYWORDS.iter().any(|keyword| {
        text.strip_prefix(keyword)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|next| codec::is_space(next) || next == '\\' || next == '"')
    })
}

/// Whether a UTF-16 code unit is likely part of real text.
pub fn is_likely_printable_word_char(unit: u16) -> bool {
    match unit {
        0x0009 | 0x000A | 0x000D | 0x3000 => true,
        0x0020..=0xD7FF => true,
        _ => false,
    }
}

/// Rank a chunk: CJK ideographs and digits count for it, ASCII letters against.
pub fn chunk_score(chunk: &str) -> i32 {
    let mut cjk = 0i32;
    let mut digits = 0i32;
    let mut ascii_alpha = 0i32;
    for ch in chunk.chars() {
        if CJK_IDEOGRAPHS.contains(&ch) {
            cjk += 1;
        }
        if ch.is_ascii_digit() {
            digits += 1;
        }
        if ch.is_ascii_alphabetic() {
            ascii_alpha += 1;
        }
    }
    let mut score = cjk * 5 + digits * 3 - ascii_alpha;
    if digits >= 6 && digits >= cjk && digits > ascii_alpha {
        score += digits * 10;
    }
    score
}

/// Filter, deduplicate and rank candidate chunks, joining survivors with `\n`.
///
/// When several candidates survive filtering, only those scoring within
/// [`SCORE_BAND`] of the best (and above zero) are kept. If none qualify the
/// filtered list is used unranked.
pub fn combine_candidate_chunks<I, S>(chunks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut filtered: Vec<String> = Vec::new();
    for chunk in chunks {
        let trimmed = codec::trim(chunk.as_ref());
        if trimmed.is_empty() || !looks_like_document_text(trimmed) {
            continue;
        }
        if looks_like_field_instruction(trimmed) {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            filtered.push(trimmed.to_string());
        }
    }

    if filtered.len() > 1 {
        let scores: Vec<i32> = filtered.iter().map(|item| chunk_score(item)).collect();
        let best = scores.iter().copied().max().unwrap_or(i32::MIN);
        let cutoff = if best > 0 { best - SCORE_BAND } else { best };
        let prioritized: Vec<String> = filtered
            .iter()
            .zip(&scores)
            .filter(|(_, &score)| score >= cutoff && score > 0)
            .map(|(item, _)| item.clone())
            .collect();
        if !prioritized.is_empty() {
            filtered = prioritized;
        }
    }
    filtered.join("\n")
}

/// Scan raw bytes for runs of printable little-endian UTF-16 text.
///
/// Any unit below `0x20` or equal to `0xFFFE`/`0xFFFF` ends the current run;
/// runs shorter than three units are ignored.
pub fn extract_utf16_text(data: &[u8]) -> String {
    let mut chunks = Vec::new();
    let mut current: Vec<u16> = Vec::new();
    let mut offset = 0;
    while let Some(unit) = read_u16_le(data, offset) {
        if unit >= 0x20 && unit != 0xFFFF && unit != 0xFFFE {
            current.push(unit);
        } else if !current.is_empty() {
            if current.len() >= MIN_UTF16_RUN {
                chunks.push(codec::utf16_units_to_string(&current));
            }
            current.clear();
        }
        offset += 2;
    }
    if current.len() >= MIN_UTF16_RUN {
        chunks.push(codec::utf16_units_to_string(&current));
    }
    combine_candidate_chunks(chunks)
}

/// Decode printable byte runs with a code page and combine the candidates.
///
/// Code page 1200 is handled as UTF-16 by [`extract_utf16_text`]. Control
/// bytes other than tab and line breaks split runs; runs shorter than four
/// bytes or invalid in the code page are discarded.
pub fn decode_with_code_page(data: &[u8], code_page: u16) -> String {
    if data.is_empty() {
        return String::new();
    }
    if code_page == codec::CODE_PAGE_UTF16LE {
        return extract_utf16_text(data);
    }

    let mut decoded = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut flush = |current: &mut Vec<u8>| {
        if current.len() >= MIN_CODE_PAGE_RUN {
            if let Some(text) = codec::decode_code_page(current, code_page) {
                decoded.push(text);
            }
        }
        current.clear();
    };

    for &byte in data {
        match byte {
            b'\r' | b'\n' => current.push(b'\n'),
            b'\t' => current.push(b'\t'),
            0x20..=0xFF => current.push(byte),
            _ => flush(&mut current),
        }
    }
    flush(&mut current);
    combine_candidate_chunks(decoded)
}

/// Try each named codec in turn, returning the first non-empty decode.
pub fn decode_with_codec_names(data: &[u8], names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| codec::code_page_for_name(name))
        .map(|code_page| decode_with_code_page(data, code_page))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}
