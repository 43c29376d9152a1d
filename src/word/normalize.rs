//! Cleanup of raw Word text and recovery of tab-separated tables.

use crate::codec;
use crate::render;

const FIELD_BEGIN: char = '\u{13}';
const FIELD_SEPARATOR: char = '\u{14}';
const FIELD_END: char = '\u{15}';
const CELL_MARK: char = '\u{07}';

/// Widest table reconstructed from a flattened row.
const MAX_FLATTENED_COLUMNS: usize = 32;

/// Turn piece-table text into Markdown paragraphs and tables.
///
/// Field instructions (between a field begin and its separator) are
/// dropped while field results are kept. A single cell mark becomes a tab,
/// a run of `n` marks ends the row with `n - 1` tabs and a newline.
/// Paragraph, line, page and section marks become newlines and the other
/// control characters are removed.
pub fn normalize_word_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut cleaned = String::with_capacity(raw.len());
    // One entry per open field: whether its separator has been seen.
    let mut fields: Vec<bool> = Vec::new();
    let mut pending_instructions = 0usize;
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\0' => {}
            FIELD_BEGIN => {
                fields.push(false);
                pending_instructions += 1;
            }
            FIELD_SEPARATOR => {
                if let Some(separated) = fields.last_mut() {
                    if !*separated {
                        *separated = true;
                        pending_instructions = pending_instructions.saturating_sub(1);
                    }
                }
            }
            FIELD_END => {
                if let Some(separated) = fields.pop() {
                    if !separated {
                        pending_instructions = pending_instructions.saturating_sub(1);
                    }
                }
            }
            _ if pending_instructions > 0 => {}
            CELL_MARK => {
                let mut run = 1;
                while chars.next_if_eq(&CELL_MARK).is_some() {
                    run += 1;
                }
                if run == 1 {
                    cleaned.push('\t');
                } else {
                    cleaned.extend(std::iter::repeat_n('\t', run - 1));
                    cleaned.push('\n');
                }
            }
            '\r' | '\u{0B}' | '\u{0C}' | '\u{1E}' | '\u{1F}' => cleaned.push('\n'),
            '\t' => cleaned.push('\t'),
            c if u32::from(c) < 0x20 => {}
            c => cleaned.push(c),
        }
    }

    let lines: Vec<String> = codec::split_lines(&cleaned)
        .iter()
        .map(|line| codec::trim(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    convert_lines_with_tables(&lines)
}

/// Cells of a tab-separated line, each trimmed.
pub fn split_tab_line(line: &str) -> Vec<String> {
    line.split('\t')
        .map(|cell| codec::trim(cell).to_string())
        .collect()
}

/// Column count of a line that can be a table row: it contains a tab,
/// splits into at least two cells and at least one cell has text.
pub fn tabular_columns(line: &str) -> Option<usize> {
    if !line.contains('\t') {
        return None;
    }
    let cells = split_tab_line(line);
    if cells.len() < 2 || cells.iter().all(|cell| cell.is_empty()) {
        return None;
    }
    Some(cells.len())
}

/// Reshape one long tab run into a grid.
///
/// Tries every column count from 2 to 32 that divides the token count into
/// at least two rows and keeps the one with the highest average share of
/// non-empty cells per row; ties go to the narrower grid.
pub fn expand_flattened_tab_rows(tokens: &[String]) -> Option<Vec<Vec<String>>> {
    if tokens.len() < 4 {
        return None;
    }
    let max_columns = MAX_FLATTENED_COLUMNS.min(tokens.len() / 2);
    let mut best_columns = 0usize;
    let mut best_density = 0.0f64;

    for columns in 2..=max_columns {
        if tokens.len() % columns != 0 {
            continue;
        }
        let rows = tokens.len() / columns;
        if rows < 2 {
            continue;
        }
        let density = tokens
            .chunks(columns)
            .map(|row| row.iter().filter(|cell| !cell.is_empty()).count() as f64 / columns as f64)
            .sum::<f64>()
            / rows as f64;
        if density > best_density + 1e-6 {
            best_density = density;
            best_columns = columns;
        }
    }

    (best_columns != 0).then(|| {
        tokens
            .chunks(best_columns)
            .map(<[String]>::to_vec)
            .collect()
    })
}

/// Group consecutive tabular lines into Markdown tables and keep every
/// other line as its own paragraph. Blocks are separated by blank lines.
pub fn convert_lines_with_tables(lines: &[String]) -> String {
    let mut blocks = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        if tabular_columns(&lines[index]).is_none() {
            blocks.push(lines[index].clone());
            index += 1;
            continue;
        }

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut cursor = index;
        while cursor < lines.len() && tabular_columns(&lines[cursor]).is_some() {
            rows.push(split_tab_line(&lines[cursor]));
            cursor += 1;
        }
        if rows.len() == 1 {
            if let Some(expanded) = expand_flattened_tab_rows(&rows[0]) {
                rows = expanded;
            }
        }

        let max_columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.len() >= 2 && max_columns >= 2 {
            for row in &mut rows {
                row.resize(max_columns, String::new());
            }
            let table = render::make_markdown_table(&rows);
            if !table.is_empty() {
                blocks.push(table);
            }
        } else {
            blocks.push(lines[index].clone());
            cursor = index + 1;
        }
        index = cursor;
    }

    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_field_instruction_suppressed() {
        let raw = "\u{13}HYPERLINK \"http://x\"\u{14}visible text\u{15}";
        assert_eq!(normalize_word_text(raw), "visible text");
    }

    #[test]
    fn test_nested_fields_and_fields_without_result() {
        let raw = "before \u{13}PAGEREF \u{13}SEQ\u{14}1\u{15} x\u{15}after\r";
        assert_eq!(normalize_word_text(raw), "before after");
    }

    #[test]
    fn test_control_characters() {
        let raw = "one\rtwo\u{0B}three\u{0C}\0four\u{01}\u{1E}five";
        assert_eq!(normalize_word_text(raw), "one\n\ntwo\n\nthree\n\nfour\n\nfive");
    }

    #[test]
    fn test_cell_marks_become_table() {
        let raw = "Intro\rName\u{07}Age\u{07}\u{07}Ann\u{07}30\u{07}\u{07}Outro\r";
        assert_eq!(
            normalize_word_text(raw),
            "Intro\n\n| Name | Age |\n| --- | --- |\n| Ann | 30 |\n\nOutro"
        );
    }

    #[test]
    fn test_single_tab_line_stays_text() {
        let lines = tokens(&["key\tvalue", "plain"]);
        assert_eq!(convert_lines_with_tables(&lines), "key\tvalue\n\nplain");
    }

    #[test]
    fn test_flattened_row_expanded() {
        let lines = tokens(&["a\tb\tc\t1\t2\t3"]);
        assert_eq!(
            convert_lines_with_tables(&lines),
            "| a | b |\n| --- | --- |\n| c | 1 |\n| 2 | 3 |"
        );
    }

    #[test]
    fn test_expand_needs_even_split() {
        let row = tokens(&["h1", "h2", "h3", "x", "", "z", "1", "2", "3"]);
        let grid = expand_flattened_tab_rows(&row).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1], tokens(&["x", "", "z"]));
        assert!(expand_flattened_tab_rows(&tokens(&["a", "b", "c"])).is_none());
        assert!(expand_flattened_tab_rows(&tokens(&["a", "b", "c", "d", "e"])).is_none());
    }

    #[test]
    fn test_tabular_columns() {
        assert_eq!(tabular_columns("a\tb\t"), Some(3));
        assert_eq!(tabular_columns("\t \t"), None);
        assert_eq!(tabular_columns("no tabs"), None);
    }
}
