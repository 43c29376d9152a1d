//! Byte-level tokenizing shared by the object scanner, the CMap parser and
//! the content stream interpreter.

/// Whitespace as C's `isspace` sees it.
pub fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

/// Characters allowed in the names this crate looks up.
pub fn is_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// First occurrence of `needle` at or after `from`.
pub fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|index| from + index)
}

/// Last occurrence of `needle` ending at or before `end`.
pub fn rfind(haystack: &[u8], needle: &[u8], end: usize) -> Option<usize> {
    let end = end.min(haystack.len());
    if needle.is_empty() || end < needle.len() {
        return None;
    }
    haystack[..end]
        .windows(needle.len())
        .rposition(|window| window == needle)
}

/// Decode hex digits into bytes, padding an odd final digit with `0`.
/// Whitespace is ignored and other characters are skipped.
pub fn hex_to_bytes(hex: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = hex.iter().filter_map(|&b| hex_digit(b)).collect();
    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// Cursor over a PDF byte buffer.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    pub fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.data.len());
    }

    /// Bytes from the cursor to the end.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// Skip whitespace and `%` comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(byte) = self.peek() {
            if byte == b'%' {
                while self.peek().is_some_and(|b| b != b'\n' && b != b'\r') {
                    self.pos += 1;
                }
            } else if is_space(byte) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, predicate: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(&predicate) {
            self.pos += 1;
        }
        &self.data[start..self.pos]
    }

    /// A run of ASCII letters, used for operators.
    pub fn read_keyword(&mut self) -> &'a [u8] {
        self.take_while(|b| b.is_ascii_alphabetic())
    }

    /// A `/Name`, without the slash. The cursor must be on the slash.
    pub fn read_name(&mut self) -> &'a [u8] {
        if self.peek() == Some(b'/') {
            self.pos += 1;
        }
        self.take_while(is_name_char)
    }

    /// Skip a numeric operand.
    pub fn skip_number(&mut self) {
        self.take_while(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'E' | b'e'));
    }

    /// Unsigned integer at the cursor, if any.
    pub fn read_integer(&mut self) -> Option<u64> {
        let digits = self.take_while(|b| b.is_ascii_digit());
        std::str::from_utf8(digits).ok()?.parse().ok()
    }

    /// A `( ... )` string with escapes resolved. The cursor must be on the
    /// opening parenthesis.
    pub fn read_literal_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.peek() != Some(b'(') {
            return out;
        }
        self.pos += 1;
        let mut depth = 1usize;
        while let Some(byte) = self.peek() {
            self.pos += 1;
            match byte {
                b'\\' => {
                    let Some(next) = self.peek() else {
                        break;
                    };
                    self.pos += 1;
                    match next {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut value = u32::from(next - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(digit @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(digit - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((value & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    out.push(byte);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(byte);
                }
                _ => out.push(byte),
            }
        }
        out
    }

    /// A `< ... >` hex string. The cursor must be on the `<` and not on a
    /// dictionary opener.
    pub fn read_hex_string(&mut self) -> Vec<u8> {
        if self.peek() != Some(b'<') || self.peek_at(1) == Some(b'<') {
            return Vec::new();
        }
        hex_to_bytes(self.read_hex_digits())
    }

    /// Raw text between `<` and `>`, consuming both delimiters.
    pub fn read_hex_digits(&mut self) -> &'a [u8] {
        if self.peek() == Some(b'<') {
            self.pos += 1;
        }
        let hex = self.take_while(|b| b != b'>');
        self.advance(1);
        hex
    }

    /// Every string inside a `[ ... ]` array, other elements skipped.
    pub fn read_array_strings(&mut self) -> Vec<Vec<u8>> {
        let mut values = Vec::new();
        if self.peek() != Some(b'[') {
            return values;
        }
        self.pos += 1;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b'(') => values.push(self.read_literal_string()),
                Some(b'<') if self.peek_at(1) != Some(b'<') => values.push(self.read_hex_string()),
                Some(_) => self.pos += 1,
            }
        }
        values
    }
}
