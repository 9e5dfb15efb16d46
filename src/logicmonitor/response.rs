// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Response envelope parsing
//!
//! Autocomplete endpoints answer `{"items": [...]}` while full listings
//! answer `{"data": {"total": n, "items": [...]}}`. Both shapes are
//! accepted everywhere. Anything unexpected (missing fields, wrong types,
//! non-JSON body mapped to `null`) yields zero options rather than an error.

use serde_json::Value;

use crate::cascade::selection::{DataPoint, DataSourceInstanceSelection, Selection};

/// One entry of a raw instance listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub id: String,
    pub name: String,
}

/// Data points of a data source template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataPointListing {
    pub points: Vec<DataPoint>,
    pub collect_interval: Option<u64>,
}

/// Items of either envelope, bounded by `total` when the listing reports one
fn items(body: &Value) -> Vec<&Value> {
    let (list, total) = match body.get("items").and_then(Value::as_array) {
        Some(list) => (list, body.get("total").and_then(Value::as_u64)),
        None => {
            let data = body.get("data");
            match data.and_then(|d| d.get("items")).and_then(Value::as_array) {
                Some(list) => (
                    list,
                    data.and_then(|d| d.get("total")).and_then(Value::as_u64),
                ),
                None => return Vec::new(),
            }
        }
    };

    let limit = total.map(|t| t as usize).unwrap_or(list.len());
    list.iter().take(limit).collect()
}

/// Ids come back as numbers from listings and as strings from autocomplete
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn id_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

/// Split an `"<id>:<label>"` autocomplete entry; labels keep their own colons
pub fn split_prefixed(entry: &str) -> Option<(&str, &str)> {
    let (id, label) = entry.split_once(':')?;
    Some((id, label))
}

/// Autocomplete answered with `needIdPrefix=true`
pub fn parse_prefixed_autocomplete(body: &Value) -> Vec<Selection> {
    items(body)
        .into_iter()
        .filter_map(|item| {
            let entry = match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            split_prefixed(&entry).map(|(id, label)| Selection::picked(id, label))
        })
        .collect()
}

/// Autocomplete answered without id prefixes (group names only)
pub fn parse_label_autocomplete(body: &Value) -> Vec<Selection> {
    items(body)
        .into_iter()
        .filter_map(Value::as_str)
        .filter(|label| !label.is_empty())
        .map(Selection::custom)
        .collect()
}

/// `device/groups` listing; the root group has an empty full path and is skipped
pub fn parse_groups(body: &Value) -> Vec<Selection> {
    items(body)
        .into_iter()
        .filter_map(|item| {
            let label = str_field(item, "fullPath")?;
            if label.is_empty() {
                return None;
            }
            let id = id_string(item.get("id"))?;
            Some(Selection::picked(id, label))
        })
        .collect()
}

/// `device/devices` listing
pub fn parse_hosts(body: &Value) -> Vec<Selection> {
    items(body)
        .into_iter()
        .filter_map(|item| {
            let id = id_string(item.get("id"))?;
            let label = str_field(item, "displayName")?;
            Some(Selection::picked(id, label))
        })
        .collect()
}

/// `devicedatasources` listing
pub fn parse_data_sources(body: &Value) -> Vec<DataSourceInstanceSelection> {
    items(body)
        .into_iter()
        .filter_map(|item| {
            Some(DataSourceInstanceSelection {
                id: id_i64(item.get("id"))?,
                label: str_field(item, "dataSourceDisplayName")?.to_string(),
                data_source_id: id_i64(item.get("dataSourceId"))?,
            })
        })
        .collect()
}

/// Instance listing
pub fn parse_instances(body: &Value) -> Vec<InstanceRecord> {
    items(body)
        .into_iter()
        .filter_map(|item| {
            Some(InstanceRecord {
                id: id_string(item.get("id"))?,
                name: str_field(item, "name")?.to_string(),
            })
        })
        .collect()
}

/// `setting/datasources/{id}` answer, either wrapped in `data` or not
pub fn parse_data_points(body: &Value) -> DataPointListing {
    let root = match body.get("data") {
        Some(data) if data.get("dataPoints").is_some() => data,
        _ => body,
    };

    let points = root
        .get("dataPoints")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|dp| {
                    Some(DataPoint {
                        id: id_i64(dp.get("id"))?,
                        label: str_field(dp, "name")?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    DataPointListing {
        points,
        collect_interval: root.get("collectInterval").and_then(Value::as_u64),
    }
}
