use super::{FormatOptions, OutputFormatter, QueryResult};

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(result: &QueryResult, _options: &FormatOptions) -> String {
        serde_json::to_string_pretty(&result.to_json_rows()).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_empty_array() {
        let result = QueryResult {
            columns: vec!["label".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(
            JsonFormatter::format(&result, &FormatOptions { no_headers: false }),
            "[]"
        );
    }

    #[test]
    fn test_rows_become_objects() {
        let result = QueryResult {
            columns: vec!["field".to_string(), "value".to_string()],
            rows: vec![vec!["group".to_string(), "*".to_string()]],
        };
        let text = JsonFormatter::format(&result, &FormatOptions { no_headers: true });
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["field"], "group");
        assert_eq!(parsed[0]["value"], "*");
    }
}
