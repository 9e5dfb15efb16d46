use std::borrow::Cow;
use std::collections::HashSet;

use comfy_table::{Table, presets::ASCII_BORDERS_ONLY_CONDENSED};

use super::{FormatOptions, OutputFormatter, QueryResult};

/// Maximum width of free-text columns
const MAX_TEXT_COLUMN_WIDTH: usize = 60;

/// Columns holding labels or filter text, which can get long
const WIDE_COLUMNS: &[&str] = &["label", "value", "request"];

/// Truncate a string to max_len chars, adding "..." if truncated
fn truncate_value(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        Cow::Borrowed(s)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        Cow::Owned(format!("{}...", truncated))
    }
}

pub struct TableFormatter;

impl OutputFormatter for TableFormatter {
    fn format(result: &QueryResult, options: &FormatOptions) -> String {
        if result.rows.is_empty() {
            return "(no options)".to_string();
        }

        let mut table = Table::new();
        table.load_preset(ASCII_BORDERS_ONLY_CONDENSED);

        let truncate_cols: HashSet<usize> = result
            .columns
            .iter()
            .enumerate()
            .filter(|(_, col)| WIDE_COLUMNS.contains(&col.as_str()))
            .map(|(idx, _)| idx)
            .collect();

        if !options.no_headers {
            table.set_header(&result.columns);
        }

        for row in &result.rows {
            let cells: Vec<Cow<'_, str>> = row
                .iter()
                .enumerate()
                .map(|(idx, val)| {
                    if truncate_cols.contains(&idx) {
                        truncate_value(val, MAX_TEXT_COLUMN_WIDTH)
                    } else {
                        Cow::Borrowed(val.as_str())
                    }
                })
                .collect();
            table.add_row(cells);
        }

        format!("{}\n({} rows)", table, result.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FormatOptions {
        FormatOptions { no_headers: false }
    }

    #[test]
    fn test_truncate_value_short() {
        let result = truncate_value("eth0", 10);
        assert_eq!(result, "eth0");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_truncate_value_too_long() {
        let result = truncate_value("Servers/Linux/Production/Frontend", 20);
        assert!(result.ends_with("..."));
        assert_eq!(result.chars().count(), 20);
        assert!(matches!(result, Cow::Owned(_)));
    }

    #[test]
    fn test_truncate_value_unicode() {
        let result = truncate_value("日本語テストです長い文字列", 8);
        assert!(result.chars().count() <= 8);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_long_label_is_truncated() {
        let result = QueryResult {
            columns: vec!["#".to_string(), "label".to_string()],
            rows: vec![vec!["1".to_string(), "g".repeat(80)]],
        };
        let output = TableFormatter::format(&result, &options());
        assert!(!output.contains(&"g".repeat(80)));
        assert!(output.contains("..."));
    }

    #[test]
    fn test_id_column_not_truncated() {
        let result = QueryResult {
            columns: vec!["label".to_string(), "id".to_string()],
            rows: vec![vec!["web".to_string(), "9".repeat(80)]],
        };
        let output = TableFormatter::format(&result, &options());
        assert!(output.contains(&"9".repeat(80)));
    }

    #[test]
    fn test_empty_and_headerless() {
        let empty = QueryResult {
            columns: vec!["label".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(TableFormatter::format(&empty, &options()), "(no options)");

        let result = QueryResult {
            columns: vec!["label".to_string()],
            rows: vec![vec!["eth0".to_string()]],
        };
        let output = TableFormatter::format(&result, &FormatOptions { no_headers: true });
        assert!(!output.contains("label"));
        assert!(output.contains("(1 rows)"));
    }
}
