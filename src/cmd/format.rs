/*!
format.rs

Plain-text table layout for `CommandOutput::Table`.

Output has to survive both a terminal and an HTML host, so there is no color
and no box drawing: columns are separated by two spaces, the header is
underlined with dashes, and over-wide tables shrink their widest columns
(truncating cells with an ellipsis).

Width: `TableOpts::default()` reads `COLUMNS` (clamped to 40..=220), else 100.

This module never prints; it returns strings.
*/

#[derive(Debug, Clone)]
pub struct TableOpts {
    /// Total line width budget.
    pub max_width: usize,
    pub truncate: bool,
    pub header_sep: bool,
    pub min_col_width: usize,
}

impl Default for TableOpts {
    fn default() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);
        Self {
            max_width: width,
            truncate: true,
            header_sep: true,
            min_col_width: 2,
        }
    }
}

pub fn table(headers: &[&str], rows: &[Vec<String>], opts: TableOpts) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let col_count = headers.len();

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    // Greedy shrink, widest columns first.
    let total: usize = widths.iter().sum::<usize>() + (col_count - 1) * 2;
    if total > opts.max_width {
        let mut overflow = total - opts.max_width;
        let mut ordered: Vec<(usize, usize)> = widths.iter().copied().enumerate().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));
        for (idx, w) in ordered {
            if overflow == 0 {
                break;
            }
            if w > opts.min_col_width {
                let shrink = (w - opts.min_col_width).min(overflow);
                widths[idx] -= shrink;
                overflow -= shrink;
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers.iter().copied(), &widths, opts.truncate));
    if opts.header_sep {
        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        lines.push(sep.join("  "));
    }
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str), &widths, opts.truncate));
    }
    lines.join("\n")
}

fn render_row<'a>(mut cells: impl Iterator<Item = &'a str>, widths: &[usize], truncate: bool) -> String {
    let line: Vec<String> = widths
        .iter()
        .map(|w| pad_or_truncate(cells.next().unwrap_or(""), *w, truncate))
        .collect();
    line.join("  ").trim_end().to_string()
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn pad_or_truncate(s: &str, width: usize, truncate: bool) -> String {
    let len = display_width(s);
    if len <= width {
        return format!("{s}{}", " ".repeat(width - len));
    }
    if !truncate {
        return s.to_string();
    }
    truncate_ellipsis(s, width)
}

/// Cut `s` to `max_chars` characters, marking the cut with `…`.
pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(width: usize) -> TableOpts {
        TableOpts {
            max_width: width,
            ..TableOpts::default()
        }
    }

    #[test]
    fn table_aligns_columns() {
        let t = table(
            &["ID", "NAME"],
            &[
                vec!["1".into(), "Azure Interior".into()],
                vec!["12".into(), "Deco".into()],
            ],
            opts(100),
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[0], "ID  NAME");
        assert_eq!(lines[1], "--  --------------");
        assert_eq!(lines[2], "1   Azure Interior");
        assert_eq!(lines[3], "12  Deco");
    }

    #[test]
    fn short_rows_are_padded() {
        let t = table(&["A", "B"], &[vec!["x".into()]], opts(100));
        assert_eq!(t.lines().last(), Some("x"));
    }

    #[test]
    fn wide_tables_shrink() {
        let long = "x".repeat(80);
        let t = table(&["ID", "NOTE"], &[vec!["1".into(), long]], opts(40));
        for line in t.lines() {
            assert!(line.chars().count() <= 40, "line too wide: {line}");
        }
        assert!(t.contains('…'));
    }

    #[test]
    fn no_headers_no_table() {
        assert!(table(&[], &[vec!["x".into()]], opts(100)).is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_ellipsis("abc", 4), "abc");
        assert_eq!(truncate_ellipsis("abc", 0), "");
    }
}
