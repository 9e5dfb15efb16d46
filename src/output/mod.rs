// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Rendering of option lists and selection state

mod json;
mod table;

pub use json::JsonFormatter;
pub use table::TableFormatter;

use crate::cascade::{
    CascadeResolver, DataPoint, DataSourceInstanceSelection, Query, Selection, StaticVariables,
};
use crate::cli::OutputFormat;

pub struct FormatOptions {
    pub no_headers: bool,
}

pub trait OutputFormatter {
    fn format(result: &QueryResult, options: &FormatOptions) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn format(&self, format: &OutputFormat, no_headers: bool) -> String {
        let options = FormatOptions { no_headers };
        match format {
            OutputFormat::Table => TableFormatter::format(self, &options),
            OutputFormat::Json => JsonFormatter::format(self, &options),
        }
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_json_rows(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(col, val)| (col.clone(), serde_json::Value::String(val.clone())))
                    .collect()
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Group, resource or instance options, numbered from 1
pub fn selections_result(options: &[Selection]) -> QueryResult {
    let mut result = QueryResult::new(&["#", "label", "id"]);
    for (idx, option) in options.iter().enumerate() {
        result.push(vec![
            (idx + 1).to_string(),
            option.label().to_string(),
            option.id().unwrap_or_default().to_string(),
        ]);
    }
    result
}

pub fn data_sources_result(options: &[DataSourceInstanceSelection]) -> QueryResult {
    let mut result = QueryResult::new(&["#", "label", "hds", "data_source"]);
    for (idx, option) in options.iter().enumerate() {
        result.push(vec![
            (idx + 1).to_string(),
            option.label.clone(),
            option.id.to_string(),
            option.data_source_id.to_string(),
        ]);
    }
    result
}

pub fn data_points_result(options: &[DataPoint]) -> QueryResult {
    let mut result = QueryResult::new(&["#", "label", "id"]);
    for (idx, option) in options.iter().enumerate() {
        result.push(vec![
            (idx + 1).to_string(),
            option.label.clone(),
            option.id.to_string(),
        ]);
    }
    result
}

pub fn variables_result(variables: &StaticVariables) -> QueryResult {
    let mut result = QueryResult::new(&["name", "value"]);
    for (name, value) in variables.iter() {
        result.push(vec![name.to_string(), value.to_string()]);
    }
    result
}

fn selection_text(selection: Option<&Selection>) -> String {
    selection.map(Selection::to_string).unwrap_or_default()
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

/// One row per field of the query
pub fn query_state_result(query: &Query) -> QueryResult {
    let mut result = QueryResult::new(&["field", "value"]);
    let mut row = |field: &str, value: String| result.push(vec![field.to_string(), value]);

    row("type", query.type_selected.to_string());
    row("group", selection_text(query.group_selected.as_ref()));
    row("resource", selection_text(query.host_selected.as_ref()));
    row(
        "data source",
        query
            .hds_selected
            .as_ref()
            .map(|hds| format!("{} (hds {}, ds {})", hds.label, hds.id, hds.data_source_id))
            .unwrap_or_default(),
    );
    row("instance mode", query.instance_mode.to_string());
    row("instance search", query.instance_search.clone());
    row("instance regex", query.instance_regex.clone());
    row("regex valid", query.regex_valid.to_string());
    row(
        "instances",
        join_labels(query.instance_selected.iter().map(Selection::label)),
    );
    row(
        "data points",
        join_labels(query.data_point_selected.iter().map(|dp| dp.label.as_str())),
    );
    row(
        "collect interval",
        query
            .collect_interval
            .map(|s| format!("{}s", s))
            .unwrap_or_default(),
    );
    row(
        "last edited",
        query
            .last_query_edited_time_stamp
            .map(|ts| ts.to_string())
            .unwrap_or_default(),
    );
    row("interpolated", query.is_query_interpolated.to_string());
    result
}

/// Loading flags and option counts per level
pub fn levels_result(resolver: &CascadeResolver) -> QueryResult {
    let mut result = QueryResult::new(&["level", "options", "loading"]);
    let loading = resolver.loading();
    for level in crate::cascade::Level::ALL {
        result.push(vec![
            level.to_string(),
            resolver
                .options()
                .count(level)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            loading.get(level).to_string(),
        ]);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selections_result_numbers_from_one() {
        let result = selections_result(&[Selection::picked("5", "web"), Selection::sentinel()]);
        assert_eq!(result.columns, vec!["#", "label", "id"]);
        assert_eq!(result.rows[0], vec!["1", "web", "5"]);
        assert_eq!(result.rows[1], vec!["2", "*", ""]);
    }

    #[test]
    fn test_json_rows_keyed_by_column() {
        let result = data_points_result(&[DataPoint {
            id: 3,
            label: "CPUBusy".to_string(),
        }]);
        let rows = result.to_json_rows();
        assert_eq!(rows[0]["label"], "CPUBusy");
        assert_eq!(rows[0]["id"], "3");
    }

    #[test]
    fn test_query_state_lists_every_field() {
        let query = Query {
            group_selected: Some(Selection::sentinel()),
            collect_interval: Some(60),
            ..Default::default()
        };
        let result = query_state_result(&query);
        let field = |name: &str| {
            result
                .rows
                .iter()
                .find(|r| r[0] == name)
                .map(|r| r[1].clone())
                .unwrap()
        };
        assert_eq!(field("group"), "*");
        assert_eq!(field("resource"), "");
        assert_eq!(field("collect interval"), "60s");
        assert_eq!(field("regex valid"), "true");
        assert_eq!(field("type"), "device");
    }

    #[test]
    fn test_variables_in_insertion_order() {
        let mut variables = StaticVariables::new();
        variables.set("host", "9");
        variables.set("dc", "east");
        let result = variables_result(&variables);
        assert_eq!(result.rows, vec![vec!["host", "9"], vec!["dc", "east"]]);
    }

    #[test]
    fn test_format_dispatch() {
        let result = selections_result(&[Selection::picked("1", "a")]);
        assert!(result.format(&OutputFormat::Json, false).contains("\"label\""));
        assert!(result.format(&OutputFormat::Table, false).contains("(1 rows)"));
    }
}
