//! Content stream interpretation: just enough of the text operators to
//! recover shown strings in reading order.

use super::cmap::{decode_plain, FontMap};
use super::lexer::{is_space, Lexer};
use crate::codec;
use std::collections::HashMap;

/// Skip inline image data after an `ID` operator, up to and including `EI`.
fn skip_inline_image(lexer: &mut Lexer<'_>) {
    let rest = lexer.rest();
    let end = rest.windows(2).enumerate().find_map(|(index, window)| {
        let delimited = index > 0
            && is_space(rest[index - 1])
            && rest.get(index + 2).is_none_or(|&b| is_space(b));
        (window == b"EI" && delimited).then_some(index + 2)
    });
    lexer.advance(end.unwrap_or(rest.len()));
}

fn push_line(lines: &mut Vec<String>, current: &mut String) {
    let trimmed = codec::trim(current);
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
    current.clear();
}

/// Text shown inside `BT .. ET` blocks, one entry per line, lines separated
/// by a blank line.
///
/// `'`, `"` and `T*` end a line. `Tf` switches to the font named by the
/// last `/Name` operand, decoding through its glyph map when one exists.
pub fn extract_text(content: &[u8], fonts: &HashMap<String, FontMap>) -> String {
    let mut lexer = Lexer::new(content);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut pending_font: &[u8] = b"";
    let mut active_font: Option<&FontMap> = None;

    let show = |current: &mut String, font: Option<&FontMap>, raw: &[u8]| {
        let decoded = match font {
            Some(font) => font.decode(raw),
            None => decode_plain(raw),
        };
        current.push_str(&decoded);
    };

    loop {
        lexer.skip_whitespace();
        let Some(byte) = lexer.peek() else {
            break;
        };
        match byte {
            b'(' => {
                let raw = lexer.read_literal_string();
                if in_text {
                    show(&mut current, active_font, &raw);
                }
            }
            b'[' => {
                let values = lexer.read_array_strings();
                if in_text {
                    for raw in &values {
                        show(&mut current, active_font, raw);
                    }
                }
            }
            b'<' if lexer.peek_at(1) == Some(b'<') => lexer.advance(2),
            b'<' => {
                let raw = lexer.read_hex_string();
                if in_text {
                    show(&mut current, active_font, &raw);
                }
            }
            b'\'' | b'"' => {
                lexer.advance(1);
                if in_text {
                    push_line(&mut lines, &mut current);
                }
            }
            b'T' if lexer.peek_at(1) == Some(b'*') => {
                lexer.advance(2);
                if in_text {
                    push_line(&mut lines, &mut current);
                }
            }
            b'/' => pending_font = lexer.read_name(),
            b if b.is_ascii_alphabetic() => match lexer.read_keyword() {
                b"BT" => {
                    current.clear();
                    in_text = true;
                }
                b"ET" => {
                    push_line(&mut lines, &mut current);
                    in_text = false;
                }
                b"Tf" => {
                    active_font = std::str::from_utf8(pending_font)
                        .ok()
                        .and_then(|name| fonts.get(name));
                }
                b"ID" => skip_inline_image(&mut lexer),
                _ => {}
            },
            b'+' | b'-' | b'.' | b'0'..=b'9' => lexer.skip_number(),
            _ => lexer.advance(1),
        }
    }
    push_line(&mut lines, &mut current);
    lines.join("\n\n")
}
