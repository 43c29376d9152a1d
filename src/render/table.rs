//! Markdown pipe tables.

use crate::codec;

/// Escape a cell: `|` becomes `\|`, line breaks become `<br>`, ends trimmed.
pub fn escape_markdown_cell(text: &str) -> String {
    let escaped = text
        .replace('|', "\\|")
        .replace('\r', "")
        .replace('\n', "<br>");
    codec::trim(&escaped).to_string()
}

/// Render rows as a Markdown table, the first row serving as header.
///
/// Short rows are padded with empty cells to the widest row. Returns an
/// empty string when there are no rows or no columns.
pub fn make_markdown_table<S: AsRef<str>>(rows: &[Vec<S>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let render_row = |row: &[S]| {
        let cells: Vec<String> = (0..columns)
            .map(|i| {
                row.get(i)
                    .map(|cell| escape_markdown_cell(cell.as_ref()))
                    .unwrap_or_default()
            })
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(&rows[0]));
    lines.push(format!("| {} |", vec!["---"; columns].join(" | ")));
    for row in &rows[1..] {
        lines.push(render_row(row));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split a rendered row on `|` not preceded by a backslash.
    fn count_cells(line: &str) -> usize {
        let mut count = 0;
        let mut prev = '\0';
        for ch in line.chars() {
            if ch == '|' && prev != '\\' {
                count += 1;
            }
            prev = ch;
        }
        count - 1
    }

    #[test]
    fn test_simple_table() {
        let rows = vec![vec!["a", "b"], vec!["1", "2"]];
        assert_eq!(make_markdown_table(&rows), "| a | b |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn test_empty_input() {
        let rows: Vec<Vec<String>> = Vec::new();
        assert_eq!(make_markdown_table(&rows), "");
        let rows: Vec<Vec<String>> = vec![Vec::new(), Vec::new()];
        assert_eq!(make_markdown_table(&rows), "");
    }

    #[test]
    fn test_escaping() {
        let rows = vec![vec!["a|b", "line1\r\nline2"]];
        assert_eq!(
            make_markdown_table(&rows),
            "| a\\|b | line1<br>line2 |\n| --- | --- |"
        );
    }

    #[test]
    fn test_shape_for_rectangular_grids() {
        for rows in 1..5 {
            for cols in 1..5 {
                let grid: Vec<Vec<String>> = (0..rows)
                    .map(|r| (0..cols).map(|c| format!("r{r}|c{c}")).collect())
                    .collect();
                let table = make_markdown_table(&grid);
                let lines: Vec<&str> = table.lines().collect();
                assert_eq!(lines.len(), rows + 1);
                for line in lines {
                    assert_eq!(count_cells(line), cols);
                }
            }
        }
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let rows = vec![vec!["h1"], vec!["x", "y", "z"]];
        let table = make_markdown_table(&rows);
        assert_eq!(table, "| h1 |  |  |\n| --- | --- | --- |\n| x | y | z |");
    }
}
