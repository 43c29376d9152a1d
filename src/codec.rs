//! Byte and string primitives shared by every reader.
//!
//! Little-endian field readers, UTF-16 and Latin-1 transcoding, Windows
//! code page decoding through `encoding_rs`, and the ASCII-only trimming and
//! line splitting the extractors rely on.

use encoding_rs::{
    Encoding, BIG5, EUC_KR, GB18030, GBK, IBM866, KOI8_R, SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8,
    WINDOWS_1250, WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255,
    WINDOWS_1256, WINDOWS_1257, WINDOWS_1258, WINDOWS_874,
};

/// Pseudo code page for little-endian UTF-16.
pub const CODE_PAGE_UTF16LE: u16 = 1200;

/// Code page identifier for UTF-8.
pub const CODE_PAGE_UTF8: u16 = 65001;

pub fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn read_u64_le(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(8)?)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Some(u64::from_le_bytes(raw))
}

/// Whitespace as the C locale sees it, vertical tab included.
pub fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Trim ASCII whitespace from both ends.
pub fn trim(text: &str) -> &str {
    text.trim_matches(is_space)
}

/// Split on `\n`, dropping every `\r`. Always yields at least one line.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '\r' => {}
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    lines.push(current);
    lines
}

/// Decode UTF-16 code units, skipping lone or mismatched surrogates.
pub fn utf16_units_to_string(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .filter_map(|unit| unit.ok())
        .collect()
}

/// Decode little-endian UTF-16 bytes; a trailing odd byte is ignored.
pub fn utf16le_to_string(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    utf16_units_to_string(&units)
}

/// Decode big-endian UTF-16 bytes; a trailing odd byte is ignored.
pub fn utf16be_to_string(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    utf16_units_to_string(&units)
}

/// Widen every byte to the code point of the same value.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Map a Windows code page identifier to an encoding.
pub fn encoding_for_code_page(code_page: u16) -> Option<&'static Encoding> {
    let encoding = match code_page {
        874 => WINDOWS_874,
        866 => IBM866,
        932 => SHIFT_JIS,
        936 => GBK,
        949 => EUC_KR,
        950 => BIG5,
        1200 => UTF_16LE,
        1201 => UTF_16BE,
        1250 => WINDOWS_1250,
        1251 => WINDOWS_1251,
        1252 => WINDOWS_1252,
        1253 => WINDOWS_1253,
        1254 => WINDOWS_1254,
        1255 => WINDOWS_1255,
        1256 => WINDOWS_1256,
        1257 => WINDOWS_1257,
        1258 => WINDOWS_1258,
        20866 => KOI8_R,
        54936 => GB18030,
        65001 => UTF_8,
        _ => return None,
    };
    Some(encoding)
}

/// Map a codec label to its Windows code page.
pub fn code_page_for_name(name: &str) -> Option<u16> {
    match name.to_ascii_lowercase().as_str() {
        "gb18030" | "gbk" | "gb2312" => Some(936),
        "big5" => Some(950),
        "shift-jis" | "shift_jis" | "sjis" => Some(932),
        "windows-1252" | "cp1252" => Some(1252),
        _ => None,
    }
}

/// Strictly decode `bytes` in the given code page.
///
/// Returns `None` for unknown code pages, for empty input and when the bytes
/// are not valid in that code page.
pub fn decode_code_page(bytes: &[u8], code_page: u16) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    if code_page == CODE_PAGE_UTF8 {
        return std::str::from_utf8(bytes).ok().map(str::to_string);
    }
    let encoding = encoding_for_code_page(code_page)?;
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .filter(|text| !text.is_empty())
}

/// Decode a text file's bytes: UTF-8 (BOM stripped), UTF-16 with BOM,
/// otherwise GB18030.
pub fn decode_text_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return utf16le_to_string(rest);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return utf16be_to_string(rest);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = GB18030.decode(bytes);
            text.into_owned()
        }
    }
}
