// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Selection state of one panel query
//!
//! The hierarchy is Group -> Resource -> DataSourceInstance -> Instance ->
//! DataPoint. Group, Resource and Instance values are either picked from an
//! option list (id and label) or typed in by the user (label only).
//! The persisted shape is the host's `{label, value}` object, with `value`
//! absent for label-only entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::logicmonitor::MATCH_ALL;

/// A Group, Resource or Instance value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SelectableValue", into = "SelectableValue")]
pub enum Selection {
    Picked { id: String, label: String },
    Custom { label: String },
}

impl Selection {
    pub fn picked(id: impl Into<String>, label: impl Into<String>) -> Self {
        Selection::Picked {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn custom(label: impl Into<String>) -> Self {
        Selection::Custom {
            label: label.into(),
        }
    }

    /// The "match everything" value
    pub fn sentinel() -> Self {
        Selection::custom(MATCH_ALL)
    }

    pub fn label(&self) -> &str {
        match self {
            Selection::Picked { label, .. } | Selection::Custom { label } => label,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Selection::Picked { id, .. } => Some(id),
            Selection::Custom { .. } => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Selection::Custom { .. })
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Picked { id, label } => write!(f, "{} ({})", label, id),
            Selection::Custom { label } => f.write_str(label),
        }
    }
}

/// Persisted `{label, value}` form
#[derive(Serialize, Deserialize)]
struct SelectableValue {
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl From<SelectableValue> for Selection {
    fn from(raw: SelectableValue) -> Self {
        // A missing, empty or zero id means the value was typed in
        let id = match raw.value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        match id {
            Some(id) if !id.is_empty() && id != "0" => Selection::Picked {
                id,
                label: raw.label,
            },
            _ => Selection::Custom { label: raw.label },
        }
    }
}

impl From<Selection> for SelectableValue {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::Picked { id, label } => SelectableValue {
                label,
                value: Some(Value::String(id)),
            },
            Selection::Custom { label } => SelectableValue { label, value: None },
        }
    }
}

/// Which group family the Group level lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    #[default]
    Device,
    Service,
    Both,
}

impl ResourceType {
    /// LogicMonitor `groupType`, `None` when both families are listed
    pub fn group_type(&self) -> Option<&'static str> {
        match self {
            ResourceType::Device => Some("Normal"),
            ResourceType::Service => Some("BizService"),
            ResourceType::Both => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "device" | "devices" => Some(ResourceType::Device),
            "service" | "services" => Some(ResourceType::Service),
            "both" | "all" => Some(ResourceType::Both),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceType::Device => "device",
            ResourceType::Service => "service",
            ResourceType::Both => "both",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceMode {
    #[default]
    Select,
    Regex,
}

impl fmt::Display for InstanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstanceMode::Select => "select",
            InstanceMode::Regex => "regex",
        })
    }
}

/// A monitoring template applied to a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceInstanceSelection {
    /// Host data source id
    #[serde(rename = "value")]
    pub id: i64,
    pub label: String,
    /// Id of the backing data source template
    #[serde(rename = "ds")]
    pub data_source_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(rename = "value")]
    pub id: i64,
    pub label: String,
}

/// Levels of the hierarchy, upstream first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Group,
    Resource,
    DataSource,
    Instance,
    DataPoint,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Group,
        Level::Resource,
        Level::DataSource,
        Level::Instance,
        Level::DataPoint,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Level::Group => "group",
            Level::Resource => "resource",
            Level::DataSource => "data source",
            Level::Instance => "instance",
            Level::DataPoint => "data point",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Persisted configuration of one panel query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    pub type_selected: ResourceType,
    pub group_selected: Option<Selection>,
    pub host_selected: Option<Selection>,
    /// Backing data source template, mirrors `hds_selected`
    pub data_source_selected: Option<i64>,
    pub hds_selected: Option<DataSourceInstanceSelection>,
    pub instance_mode: InstanceMode,
    pub instance_search: String,
    pub instance_regex: String,
    pub regex_valid: bool,
    pub instance_selected: Vec<Selection>,
    pub data_point_selected: Vec<DataPoint>,
    pub collect_interval: Option<u64>,
    pub last_query_edited_time_stamp: Option<i64>,
    pub is_query_interpolated: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            type_selected: ResourceType::default(),
            group_selected: None,
            host_selected: None,
            data_source_selected: None,
            hds_selected: None,
            instance_mode: InstanceMode::default(),
            instance_search: String::new(),
            instance_regex: String::new(),
            regex_valid: true,
            instance_selected: Vec::new(),
            data_point_selected: Vec::new(),
            collect_interval: None,
            last_query_edited_time_stamp: None,
            is_query_interpolated: false,
        }
    }
}

impl Query {
    /// Clear every level strictly below `level`
    pub fn clear_below(&mut self, level: Level) {
        for l in Level::ALL.into_iter().filter(|l| *l > level) {
            self.clear_level(l);
        }
    }

    /// Clear `level` and everything below it
    pub fn clear_from(&mut self, level: Level) {
        for l in Level::ALL.into_iter().filter(|l| *l >= level) {
            self.clear_level(l);
        }
    }

    fn clear_level(&mut self, level: Level) {
        match level {
            Level::Group => self.group_selected = None,
            Level::Resource => self.host_selected = None,
            Level::DataSource => {
                self.hds_selected = None;
                self.data_source_selected = None;
            }
            Level::Instance => {
                self.instance_selected.clear();
                self.instance_search.clear();
            }
            Level::DataPoint => {
                self.data_point_selected.clear();
                self.collect_interval = None;
            }
        }
    }

    /// Whether `level` currently holds a selection
    pub fn is_set(&self, level: Level) -> bool {
        match level {
            Level::Group => self.group_selected.is_some(),
            Level::Resource => self.host_selected.is_some(),
            Level::DataSource => self.hds_selected.is_some(),
            Level::Instance => !self.instance_selected.is_empty(),
            Level::DataPoint => !self.data_point_selected.is_empty(),
        }
    }

    pub fn group_label(&self) -> &str {
        self.group_selected
            .as_ref()
            .map(Selection::label)
            .unwrap_or(MATCH_ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_query() -> Query {
        Query {
            group_selected: Some(Selection::picked("1", "Servers")),
            host_selected: Some(Selection::picked("5", "web-01")),
            data_source_selected: Some(311),
            hds_selected: Some(DataSourceInstanceSelection {
                id: 88,
                label: "Interfaces".to_string(),
                data_source_id: 311,
            }),
            instance_search: "eth".to_string(),
            instance_selected: vec![Selection::picked("10", "eth0")],
            data_point_selected: vec![DataPoint {
                id: 1,
                label: "InOctets".to_string(),
            }],
            collect_interval: Some(60),
            ..Default::default()
        }
    }

    #[test]
    fn test_selection_accessors() {
        let picked = Selection::picked("12", "a:b");
        assert_eq!(picked.id(), Some("12"));
        assert_eq!(picked.label(), "a:b");
        assert!(!picked.is_custom());

        let custom = Selection::custom("web*");
        assert_eq!(custom.id(), None);
        assert!(custom.is_custom());
        assert_eq!(Selection::sentinel().label(), "*");
    }

    #[test]
    fn test_selection_serialized_shape() {
        assert_eq!(
            serde_json::to_value(Selection::picked("5", "web")).unwrap(),
            json!({"label": "web", "value": "5"})
        );
        assert_eq!(
            serde_json::to_value(Selection::custom("*")).unwrap(),
            json!({"label": "*"})
        );
    }

    #[test]
    fn test_selection_missing_or_zero_id_is_custom() {
        for raw in [
            json!({"label": "x"}),
            json!({"label": "x", "value": ""}),
            json!({"label": "x", "value": 0}),
            json!({"label": "x", "value": "0"}),
            json!({"label": "x", "value": null}),
        ] {
            let sel: Selection = serde_json::from_value(raw).unwrap();
            assert_eq!(sel, Selection::custom("x"));
        }
        let sel: Selection = serde_json::from_value(json!({"label": "x", "value": 42})).unwrap();
        assert_eq!(sel, Selection::picked("42", "x"));
    }

    #[test]
    fn test_query_wire_names() {
        let value = serde_json::to_value(full_query()).unwrap();
        assert_eq!(value["typeSelected"], "Device");
        assert_eq!(value["hostSelected"]["value"], "5");
        assert_eq!(value["hdsSelected"]["ds"], 311);
        assert_eq!(value["hdsSelected"]["value"], 88);
        assert_eq!(value["dataPointSelected"][0]["label"], "InOctets");
        assert_eq!(value["regexValid"], true);
        assert_eq!(value["isQueryInterpolated"], false);
        assert!(value.get("lastQueryEditedTimeStamp").is_some());
    }

    #[test]
    fn test_query_deserialize_partial() {
        let query: Query = serde_json::from_value(json!({
            "groupSelected": {"label": "*"},
            "instanceMode": "Regex"
        }))
        .unwrap();
        assert_eq!(query.group_selected, Some(Selection::sentinel()));
        assert_eq!(query.instance_mode, InstanceMode::Regex);
        assert!(query.regex_valid);
        assert!(query.host_selected.is_none());
    }

    #[test]
    fn test_clear_below_keeps_upstream() {
        let mut query = full_query();
        query.clear_below(Level::Resource);
        assert!(query.is_set(Level::Group));
        assert!(query.is_set(Level::Resource));
        assert!(!query.is_set(Level::DataSource));
        assert!(query.data_source_selected.is_none());
        assert!(!query.is_set(Level::Instance));
        assert!(query.instance_search.is_empty());
        assert!(!query.is_set(Level::DataPoint));
        assert!(query.collect_interval.is_none());
    }

    #[test]
    fn test_clear_from_includes_level() {
        let mut query = full_query();
        query.clear_from(Level::Group);
        for level in Level::ALL {
            assert!(!query.is_set(level), "{} still set", level);
        }
    }

    #[test]
    fn test_level_order() {
        assert!(Level::Group < Level::Resource);
        assert!(Level::Instance < Level::DataPoint);
        assert_eq!(Level::DataSource.to_string(), "data source");
    }

    #[test]
    fn test_resource_type_group_type() {
        assert_eq!(ResourceType::Device.group_type(), Some("Normal"));
        assert_eq!(ResourceType::Service.group_type(), Some("BizService"));
        assert_eq!(ResourceType::Both.group_type(), None);
        assert_eq!(ResourceType::parse("Services"), Some(ResourceType::Service));
        assert_eq!(ResourceType::parse("nope"), None);
    }
}
