// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Fixed REST endpoints of the LogicMonitor resource hierarchy
//!
//! Every listing the resolver issues is described by a [`ResourceRequest`]:
//! a request kind (used for logging and for header decisions), a path
//! relative to `/santaba/rest/`, and the query pairs. Filter expressions
//! embedded in query values are built with `serde_json` so labels
//! containing quotes or backslashes stay well-formed.

use serde_json::json;
use std::fmt;

/// Label meaning "match everything"
pub const MATCH_ALL: &str = "*";

/// Path of the generic autocomplete endpoint (also drives `x-version: 3`)
pub const AUTOCOMPLETE_PATH: &str = "autocomplete/names";

/// Page size of every autocomplete-style request
const AUTOCOMPLETE_PAGE_SIZE: &str = "10";

/// Kinds of outbound requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    AutoCompleteGroup,
    ServiceOrDeviceGroup,
    AutoCompleteHost,
    AllHost,
    DataSource,
    AutoCompleteInstance,
    AllInstance,
    DataPoint,
    HealthCheck,
    RawDataMultiInstance,
}

impl RequestKind {
    /// Route name used by the plugin's resource handler
    pub fn route(&self) -> &'static str {
        match self {
            RequestKind::AutoCompleteGroup => "AutoCompleteGroupReq",
            RequestKind::ServiceOrDeviceGroup => "ServiceOrDeviceGroupReq",
            RequestKind::AutoCompleteHost => "AutoCompleteHostReq",
            RequestKind::AllHost => "AllHostReq",
            RequestKind::DataSource => "DataSourceReq",
            RequestKind::AutoCompleteInstance => "AutoCompleteInstanceReq",
            RequestKind::AllInstance => "AllInstanceReq",
            RequestKind::DataPoint => "DataPointReq",
            RequestKind::HealthCheck => "HealthCheckReq",
            RequestKind::RawDataMultiInstance => "RawDataMultiInstanceReq",
        }
    }

    pub fn is_autocomplete(&self) -> bool {
        matches!(
            self,
            RequestKind::AutoCompleteGroup
                | RequestKind::AutoCompleteHost
                | RequestKind::AutoCompleteInstance
        )
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

/// One outbound GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub kind: RequestKind,
    /// Path relative to the REST root, without a leading slash
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ResourceRequest {
    fn new(kind: RequestKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            query: Vec::new(),
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Adds the `_=<epoch ms>` parameter that keeps proxies from serving stale listings
    fn cache_buster(self) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        self.param("_", now.to_string())
    }

    /// Value of a query parameter, if present
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Resource path as signed by LMv1 (leading slash, no query string)
    pub fn resource_path(&self) -> String {
        format!("/{}", self.path.trim_start_matches('/'))
    }
}

impl fmt::Display for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path)?;
        for (idx, (key, value)) in self.query.iter().enumerate() {
            let sep = if idx == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

/// A `parentsFilters` entry of the autocomplete endpoint
fn parent_filter(filter: &str, token: &str, glob: bool) -> serde_json::Value {
    json!({
        "filter": filter,
        "exclude": false,
        "token": token,
        "matchFilterAsGlob": glob,
    })
}

/// Group autocomplete (device and service groups together)
pub fn autocomplete_groups(query: &str) -> ResourceRequest {
    ResourceRequest::new(RequestKind::AutoCompleteGroup, AUTOCOMPLETE_PATH)
        .param("queryToken", "display")
        .param("filterFlag", "ImmediateChild")
        .param("size", AUTOCOMPLETE_PAGE_SIZE)
        .cache_buster()
        .param("type", "hostChain")
        .param("query", query)
        .param("parentsFilters", "[]")
}

/// `extraFilters` expression restricting groups to one group type
pub fn group_extra_filters(group_type: &str, label: &str) -> String {
    json!({
        "AND": [
            {"OR": [
                {"name": "groupType", "value": group_type, "op": ":"},
                {"name": "id", "value": 1, "op": ":"}
            ]},
            {"name": "userPermission", "value": "write", "op": ":"},
            {"OR": [
                {"name": "fullPath", "value": label, "op": "~"},
                {"name": "name", "value": label, "op": "~"}
            ]}
        ]
    })
    .to_string()
}

/// Device or service groups of one type, matched against a label
pub fn service_or_device_groups(group_type: &str, label: &str) -> ResourceRequest {
    ResourceRequest::new(RequestKind::ServiceOrDeviceGroup, "device/groups")
        .param("fields", "id,fullPath,name")
        .param("sort", "fullPath")
        .param("size", AUTOCOMPLETE_PAGE_SIZE)
        .cache_buster()
        .param("extraFilters", group_extra_filters(group_type, label))
}

/// Host autocomplete scoped to a group label
pub fn autocomplete_hosts(query: &str, group_label: &str) -> ResourceRequest {
    let parents = json!([parent_filter(group_label, "fullname", true)]).to_string();
    ResourceRequest::new(RequestKind::AutoCompleteHost, AUTOCOMPLETE_PATH)
        .param("queryToken", "display")
        .param("needIdPrefix", "true")
        .param("size", AUTOCOMPLETE_PAGE_SIZE)
        .cache_buster()
        .param("type", "hostChain")
        .param("query", query)
        .param("parentsFilters", parents)
}

/// Every device, unfiltered (autocomplete disabled)
pub fn all_hosts() -> ResourceRequest {
    ResourceRequest::new(RequestKind::AllHost, "device/devices")
        .param("format", "json")
        .param("fields", "id,displayName")
        .param("size", "-1")
}

/// Data source instances applied to a device that have at least one instance
pub fn data_sources(host_id: &str) -> ResourceRequest {
    ResourceRequest::new(
        RequestKind::DataSource,
        format!("device/devices/{}/devicedatasources", host_id),
    )
    .param("format", "json")
    .param("fields", "id,dataSourceDisplayName,dataSourceId,instanceNumber")
    .param("size", "-1")
    .param("filter", "instanceNumber>:1")
}

/// Instance autocomplete scoped by group, host and data source labels
pub fn autocomplete_instances(
    query: &str,
    group_label: &str,
    host_label: &str,
    data_source_label: &str,
) -> ResourceRequest {
    let parents = json!([
        parent_filter(group_label, "fullname", true),
        parent_filter(host_label, "display", true),
        parent_filter(data_source_label, "display", false),
    ])
    .to_string();
    ResourceRequest::new(RequestKind::AutoCompleteInstance, AUTOCOMPLETE_PATH)
        .param("queryToken", "shortname")
        .param("needIdPrefix", "true")
        .param("size", AUTOCOMPLETE_PAGE_SIZE)
        .cache_buster()
        .param("type", "hostDsChain")
        .param("query", query)
        .param("parentsFilters", parents)
}

/// Every instance of one data source instance on one device
pub fn all_instances(host_id: &str, hds_id: i64) -> ResourceRequest {
    ResourceRequest::new(
        RequestKind::AllInstance,
        format!("device/devices/{}/devicedatasources/{}/instances", host_id, hds_id),
    )
    .param("format", "json")
    .param("fields", "id,name")
    .param("size", "-1")
}

/// Data points and collect interval of a data source template
pub fn data_points(data_source_id: i64) -> ResourceRequest {
    ResourceRequest::new(
        RequestKind::DataPoint,
        format!("setting/datasources/{}", data_source_id),
    )
    .param("format", "json")
    .param("fields", "dataPoints,collectInterval")
}

/// Smallest authenticated call, used to verify settings
pub fn health_check() -> ResourceRequest {
    ResourceRequest::new(RequestKind::HealthCheck, "device/devices").param("size", "1")
}

/// Raw data of every instance of a data source instance
pub fn raw_data_multi_instance(
    host_id: &str,
    hds_id: i64,
    start: i64,
    end: i64,
    data_points: &[String],
) -> ResourceRequest {
    let request = ResourceRequest::new(
        RequestKind::RawDataMultiInstance,
        format!("device/devices/{}/devicedatasources/{}/data", host_id, hds_id),
    )
    .param("start", start.to_string())
    .param("end", end.to_string());

    if data_points.is_empty() {
        request
    } else {
        request.param("datapoints", data_points.join(","))
    }
}
