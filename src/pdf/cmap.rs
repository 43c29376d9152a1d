//! `ToUnicode` CMaps and glyph decoding.

use super::lexer::{hex_to_bytes, Lexer};
use crate::codec;
use encoding_rs::WINDOWS_1252;
use std::collections::HashMap;

/// Largest number of codes expanded from one `bfrange` entry.
const MAX_RANGE_SPAN: u32 = 0x1_0000;

/// Glyph code to Unicode text for one font.
#[derive(Debug, Clone, Default)]
pub struct FontMap {
    glyphs: HashMap<Vec<u8>, String>,
    max_code_len: usize,
}

impl FontMap {
    pub fn insert(&mut self, code: Vec<u8>, text: String) {
        if code.is_empty() || text.is_empty() {
            return;
        }
        self.max_code_len = self.max_code_len.max(code.len());
        self.glyphs.insert(code, text);
    }

    pub fn get(&self, code: &[u8]) -> Option<&str> {
        self.glyphs.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Decode a shown string by greedy longest match. Bytes no code
    /// covers are read as Windows-1252.
    pub fn decode(&self, raw: &[u8]) -> String {
        if self.glyphs.is_empty() {
            return decode_plain(raw);
        }
        let mut out = String::new();
        let mut index = 0;
        while index < raw.len() {
            let longest = self.max_code_len.min(raw.len() - index);
            let matched = (1..=longest).rev().find_map(|len| {
                self.get(&raw[index..index + len]).map(|text| (len, text))
            });
            match matched {
                Some((len, text)) => {
                    out.push_str(text);
                    index += len;
                }
                None => {
                    out.push_str(&decode_windows_1252(&raw[index..index + 1]));
                    index += 1;
                }
            }
        }
        out
    }
}

fn decode_windows_1252(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Text of a string shown without a `ToUnicode` map: UTF-16BE behind a
/// byte order mark, UTF-8 when valid, otherwise Windows-1252.
pub fn decode_plain(raw: &[u8]) -> String {
    if let Some(rest) = raw.strip_prefix(&[0xFE, 0xFF]) {
        return codec::utf16be_to_string(rest);
    }
    match std::str::from_utf8(raw) {
        Ok(text) => text.to_string(),
        Err(_) => decode_windows_1252(raw),
    }
}

/// Destination text of a CMap entry: UTF-16BE code units.
fn unicode_from_bytes(bytes: &[u8]) -> String {
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return String::new();
    }
    codec::utf16be_to_string(bytes)
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn code_bytes(value: u32, len: usize) -> Vec<u8> {
    (0..len)
        .rev()
        .map(|shift| (value >> (shift * 8)) as u8)
        .collect()
}

/// `value` with its last UTF-16 unit advanced by `offset`.
fn offset_destination(destination: &[u8], offset: u32) -> String {
    let mut units: Vec<u16> = destination
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let Some(last) = units.last_mut() else {
        return String::new();
    };
    let Some(advanced) = u32::from(*last)
        .checked_add(offset)
        .and_then(|value| u16::try_from(value).ok())
    else {
        return String::new();
    };
    *last = advanced;
    codec::utf16_units_to_string(&units)
}

#[derive(Debug)]
enum Token {
    Hex(Vec<u8>),
    Integer(u64),
    Keyword(Vec<u8>),
    ArrayStart,
    ArrayEnd,
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut lexer = Lexer::new(data);
    let mut tokens = Vec::new();
    loop {
        lexer.skip_whitespace();
        let Some(byte) = lexer.peek() else {
            break;
        };
        match byte {
            b'<' if lexer.peek_at(1) == Some(b'<') => lexer.advance(2),
            b'<' => tokens.push(Token::Hex(lexer.read_hex_digits().to_vec())),
            b'[' => {
                lexer.advance(1);
                tokens.push(Token::ArrayStart);
            }
            b']' => {
                lexer.advance(1);
                tokens.push(Token::ArrayEnd);
            }
            b'(' => {
                lexer.read_literal_string();
            }
            b'/' => {
                lexer.advance(1);
                lexer.read_name();
            }
            b'0'..=b'9' => match lexer.read_integer() {
                Some(value) => tokens.push(Token::Integer(value)),
                None => lexer.skip_number(),
            },
            b if b.is_ascii_alphabetic() => {
                tokens.push(Token::Keyword(lexer.read_keyword().to_vec()));
            }
            _ => lexer.advance(1),
        }
    }
    tokens
}

/// Parse the `bfchar` and `bfrange` sections of a CMap.
///
/// Entries are read token by token, so several may share a line. Each
/// section reads at most the number of entries its header declares.
pub fn parse_to_unicode_cmap(data: &[u8]) -> FontMap {
    let tokens = tokenize(data);
    let mut map = FontMap::default();
    let mut index = 0;

    while index < tokens.len() {
        let Token::Keyword(keyword) = &tokens[index] else {
            index += 1;
            continue;
        };
        let declared = match index.checked_sub(1).map(|i| &tokens[i]) {
            Some(Token::Integer(count)) => *count as usize,
            _ => 0,
        };
        index += 1;
        match keyword.as_slice() {
            b"beginbfchar" => index = parse_bfchar(&tokens, index, declared, &mut map),
            b"beginbfrange" => index = parse_bfrange(&tokens, index, declared, &mut map),
            _ => {}
        }
    }
    map
}

fn is_section_end(token: &Token) -> bool {
    matches!(token, Token::Keyword(k) if k.starts_with(b"end"))
}

fn parse_bfchar(tokens: &[Token], mut index: usize, declared: usize, map: &mut FontMap) -> usize {
    let mut remaining = declared;
    while index < tokens.len() && !is_section_end(&tokens[index]) {
        if let (Token::Hex(source), Some(Token::Hex(destination))) =
            (&tokens[index], tokens.get(index + 1))
        {
            if remaining > 0 {
                map.insert(
                    hex_to_bytes(source),
                    unicode_from_bytes(&hex_to_bytes(destination)),
                );
                remaining -= 1;
            }
            index += 2;
        } else {
            index += 1;
        }
    }
    index
}

fn parse_bfrange(tokens: &[Token], mut index: usize, declared: usize, map: &mut FontMap) -> usize {
    let mut remaining = declared;
    while index < tokens.len() && !is_section_end(&tokens[index]) {
        let (Token::Hex(start_hex), Some(Token::Hex(end_hex))) = (&tokens[index], tokens.get(index + 1))
        else {
            index += 1;
            continue;
        };
        index += 2;
        let start_bytes = hex_to_bytes(start_hex);
        let code_len = start_hex.iter().filter(|b| b.is_ascii_hexdigit()).count() / 2;
        let start = code_value(&start_bytes);
        let end = code_value(&hex_to_bytes(end_hex));
        let end = end.min(start.saturating_add(MAX_RANGE_SPAN - 1));
        let apply = remaining > 0 && code_len > 0;

        match tokens.get(index) {
            Some(Token::ArrayStart) => {
                index += 1;
                let mut code = start;
                while let Some(Token::Hex(destination)) = tokens.get(index) {
                    if apply && code <= end {
                        map.insert(
                            code_bytes(code, code_len),
                            unicode_from_bytes(&hex_to_bytes(destination)),
                        );
                        code = code.saturating_add(1);
                    }
                    index += 1;
                }
                if matches!(tokens.get(index), Some(Token::ArrayEnd)) {
                    index += 1;
                }
            }
            Some(Token::Hex(destination)) => {
                index += 1;
                if apply && start <= end {
                    let destination = hex_to_bytes(destination);
                    for (offset, code) in (start..=end).enumerate() {
                        map.insert(
                            code_bytes(code, code_len),
                            offset_destination(&destination, offset as u32),
                        );
                    }
                }
            }
            _ => continue,
        }
        remaining = remaining.saturating_sub(1);
    }
    index
}
