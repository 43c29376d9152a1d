//! Stream and object scanning over raw PDF bytes.
//!
//! No cross-reference table is consulted: streams are found by keyword and
//! their owning objects by looking backward for an `N G obj` preamble.

use super::lexer::{find, is_name_char, is_space, rfind};
use flate2::read::ZlibDecoder;
use std::collections::HashMap;
use std::io::Read;

const STREAM: &[u8] = b"stream";
const END_STREAM: &[u8] = b"endstream";

/// Furthest a stream dictionary may start before its `stream` keyword.
const MAX_DICT_LEN: usize = 64 * 1024;

/// Dictionary keys that mark embedded font programs.
const FONT_PROGRAM_KEYS: [&[u8]; 3] = [b"/Length1", b"/Length2", b"/Length3"];

/// `/Subtype` values of embedded font programs.
const FONT_PROGRAM_SUBTYPES: [&[u8]; 3] = [b"Type1C", b"CIDFontType0C", b"OpenType"];

/// One `stream ... endstream` body with its dictionary.
#[derive(Debug, Clone)]
pub struct PdfStream {
    pub object_number: Option<u32>,
    pub dict: Vec<u8>,
    /// Decoded bytes, or the raw bytes when no filter applied.
    pub data: Vec<u8>,
}

/// True when `dict` holds `key` followed by the name `/value`.
pub fn dict_has_name(dict: &[u8], key: &[u8], value: &[u8]) -> bool {
    let mut from = 0;
    while let Some(pos) = find(dict, key, from) {
        from = pos + key.len();
        if dict.get(from).is_some_and(|&b| is_name_char(b)) {
            continue;
        }
        let mut cursor = from;
        while dict.get(cursor).is_some_and(|&b| is_space(b)) {
            cursor += 1;
        }
        if dict.get(cursor) != Some(&b'/') {
            continue;
        }
        let name_start = cursor + 1;
        let name_end = name_start
            + dict[name_start..]
                .iter()
                .take_while(|&&b| is_name_char(b))
                .count();
        if &dict[name_start..name_end] == value {
            return true;
        }
    }
    false
}

fn is_image(dict: &[u8]) -> bool {
    dict_has_name(dict, b"/Subtype", b"Image")
}

/// Streams that never carry page text.
fn is_skipped_stream(dict: &[u8]) -> bool {
    dict_has_name(dict, b"/Type", b"XRef")
        || dict_has_name(dict, b"/Type", b"ObjStm")
        || FONT_PROGRAM_KEYS
            .iter()
            .any(|key| find(dict, key, 0).is_some())
        || FONT_PROGRAM_SUBTYPES
            .iter()
            .any(|subtype| dict_has_name(dict, b"/Subtype", subtype))
}

/// A `stream` keyword that is neither part of `endstream` nor of a longer
/// word.
fn is_stream_keyword(file: &[u8], pos: usize) -> bool {
    let before_ok = pos == 0 || !file[pos - 1].is_ascii_alphanumeric();
    let after_ok = file
        .get(pos + STREAM.len())
        .is_none_or(|&b| is_space(b));
    before_ok && after_ok
}

/// Byte range of the `<< ... >>` dictionary directly before `stream_pos`.
/// Nested dictionaries are balanced while scanning backward.
fn dictionary_before(file: &[u8], stream_pos: usize) -> Option<std::ops::Range<usize>> {
    let mut end = stream_pos;
    while end > 0 && is_space(file[end - 1]) {
        end -= 1;
    }
    if end < 2 || &file[end - 2..end] != b">>" {
        return None;
    }
    let floor = end.saturating_sub(MAX_DICT_LEN);
    let mut depth = 0usize;
    let mut cursor = end;
    while cursor >= floor + 2 {
        match &file[cursor - 2..cursor] {
            b">>" => {
                depth += 1;
                cursor -= 2;
            }
            b"<<" => {
                depth = depth.checked_sub(1)?;
                cursor -= 2;
                if depth == 0 {
                    return Some(cursor..end);
                }
            }
            _ => cursor -= 1,
        }
    }
    None
}

/// Direct `/Length` of a stream dictionary. Indirect lengths (`N 0 R`)
/// are unknown here and give `None`.
fn declared_length(dict: &[u8]) -> Option<usize> {
    let key = b"/Length";
    let mut from = 0;
    while let Some(pos) = find(dict, key, from) {
        from = pos + key.len();
        if dict.get(from).is_some_and(|&b| is_name_char(b)) {
            continue;
        }
        let (value, after) = read_number(dict, from)?;
        if read_reference_tail(dict, after).is_some() {
            return None;
        }
        return usize::try_from(value).ok();
    }
    None
}

/// Skip whitespace then read decimal digits.
fn read_number(data: &[u8], from: usize) -> Option<(u64, usize)> {
    let mut cursor = from;
    while data.get(cursor).is_some_and(|&b| is_space(b)) {
        cursor += 1;
    }
    let start = cursor;
    while data.get(cursor).is_some_and(u8::is_ascii_digit) {
        cursor += 1;
    }
    let digits = std::str::from_utf8(&data[start..cursor]).ok()?;
    Some((digits.parse().ok()?, cursor))
}

/// The `0 R` that follows an object number in a reference; returns the
/// position after `R`.
fn read_reference_tail(data: &[u8], from: usize) -> Option<usize> {
    let mut cursor = from;
    while data.get(cursor).is_some_and(|&b| is_space(b)) {
        cursor += 1;
    }
    if data.get(cursor) != Some(&b'0') {
        return None;
    }
    cursor += 1;
    while data.get(cursor).is_some_and(|&b| is_space(b)) {
        cursor += 1;
    }
    (data.get(cursor) == Some(&b'R')).then_some(cursor + 1)
}

fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Stream body after its filter. A Flate body that cannot be inflated gives
/// an empty stream so compressed bytes never reach the text operators.
fn decode_stream(dict: &[u8], raw: &[u8]) -> Vec<u8> {
    if find(dict, b"/FlateDecode", 0).is_none() {
        return raw.to_vec();
    }
    match inflate(raw) {
        Ok(decoded) if !decoded.is_empty() => decoded,
        Ok(_) => {
            tracing::warn!(compressed = raw.len(), "flate stream inflated to nothing");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, compressed = raw.len(), "flate stream is damaged, dropping it");
            Vec::new()
        }
    }
}

fn trim_trailing_eol(file: &[u8], start: usize, mut end: usize) -> usize {
    if end > start && file[end - 1] == b'\n' {
        end -= 1;
    }
    if end > start && file[end - 1] == b'\r' {
        end -= 1;
    }
    end
}

/// Position of `endstream` at `pos`, allowing whitespace before it.
fn endstream_at(file: &[u8], pos: usize) -> Option<usize> {
    let mut cursor = pos;
    while file.get(cursor).is_some_and(|&b| is_space(b)) {
        cursor += 1;
    }
    file.get(cursor..)?.starts_with(END_STREAM).then_some(cursor)
}

/// Every text-bearing stream in file order. Images, cross-reference and
/// object streams, and embedded font programs are skipped.
pub fn scan_streams(file: &[u8]) -> Vec<PdfStream> {
    let mut streams = Vec::new();
    let mut search = 0;

    while let Some(stream_pos) = find(file, STREAM, search) {
        search = stream_pos + STREAM.len();
        if !is_stream_keyword(file, stream_pos) {
            continue;
        }
        let Some(dict_range) = dictionary_before(file, stream_pos) else {
            continue;
        };
        let dict = &file[dict_range];

        let mut data_start = stream_pos + STREAM.len();
        if file.get(data_start) == Some(&b'\r') {
            data_start += 1;
        }
        if file.get(data_start) == Some(&b'\n') {
            data_start += 1;
        }

        if is_image(dict) || is_skipped_stream(dict) {
            if let Some(end) = find(file, END_STREAM, data_start) {
                search = end + END_STREAM.len();
            }
            continue;
        }

        // A direct length only counts when `endstream` sits right after it.
        let framed = declared_length(dict)
            .filter(|&len| len > 0)
            .and_then(|len| data_start.checked_add(len))
            .filter(|&data_end| data_end <= file.len())
            .and_then(|data_end| endstream_at(file, data_end).map(|end| (data_end, end)))
            .or_else(|| {
                find(file, END_STREAM, data_start)
                    .map(|end| (trim_trailing_eol(file, data_start, end), end))
            });
        let Some((data_end, end_pos)) = framed else {
            tracing::debug!(offset = stream_pos, "stream without endstream, stopping scan");
            break;
        };

        streams.push(PdfStream {
            object_number: object_number_before(file, stream_pos),
            dict: dict.to_vec(),
            data: decode_stream(dict, &file[data_start..data_end]),
        });
        search = end_pos + END_STREAM.len();
    }
    streams
}

/// Number of the object whose `N G obj` preamble precedes `pos`.
pub fn object_number_before(file: &[u8], pos: usize) -> Option<u32> {
    let mut search_end = pos;
    while let Some(obj_pos) = rfind(file, b"obj", search_end) {
        search_end = obj_pos;
        let mut cursor = obj_pos;
        while cursor > 0 && is_space(file[cursor - 1]) {
            cursor -= 1;
        }
        let generation_end = cursor;
        while cursor > 0 && file[cursor - 1].is_ascii_digit() {
            cursor -= 1;
        }
        if cursor == generation_end {
            continue;
        }
        while cursor > 0 && is_space(file[cursor - 1]) {
            cursor -= 1;
        }
        let id_end = cursor;
        while cursor > 0 && file[cursor - 1].is_ascii_digit() {
            cursor -= 1;
        }
        if cursor == id_end {
            continue;
        }
        if let Some(number) = std::str::from_utf8(&file[cursor..id_end])
            .ok()
            .and_then(|digits| digits.parse().ok())
        {
            return Some(number);
        }
    }
    None
}

/// Body of object `number` between `N 0 obj` and `endobj`.
pub fn object_content(file: &[u8], number: u32) -> Option<&[u8]> {
    let marker = format!("{number} 0 obj");
    let mut from = 0;
    loop {
        let pos = find(file, marker.as_bytes(), from)?;
        from = pos + marker.len();
        if pos > 0 && file[pos - 1].is_ascii_digit() {
            continue;
        }
        let end = find(file, b"endobj", from)?;
        return Some(&file[from..end]);
    }
}

/// Every `/Name N 0 R` reference in the file. Later references to the same
/// name replace earlier ones.
pub fn font_resource_targets(file: &[u8]) -> HashMap<String, u32> {
    let mut targets = HashMap::new();
    let mut pos = 0;
    while let Some(slash) = file[pos.min(file.len())..]
        .iter()
        .position(|&b| b == b'/')
        .map(|offset| pos + offset)
    {
        let name_start = slash + 1;
        let name_end = name_start
            + file[name_start..]
                .iter()
                .take_while(|&&b| is_name_char(b))
                .count();
        pos = name_end;
        if name_end == name_start {
            continue;
        }
        let Some((number, after)) = read_number(file, name_end) else {
            continue;
        };
        let Some(end) = read_reference_tail(file, after) else {
            continue;
        };
        if let Ok(number) = u32::try_from(number) {
            let name = String::from_utf8_lossy(&file[name_start..name_end]).into_owned();
            targets.insert(name, number);
        }
        pos = end;
    }
    targets
}

/// Object number of the `/ToUnicode` stream referenced by a font object.
pub fn to_unicode_object(file: &[u8], font_object: u32) -> Option<u32> {
    let body = object_content(file, font_object)?;
    let marker = b"/ToUnicode";
    let pos = find(body, marker, 0)?;
    let (number, _) = read_number(body, pos + marker.len())?;
    u32::try_from(number).ok()
}
