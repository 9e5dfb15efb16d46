// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Metrics request preconditions
//!
//! Built from a fully resolved query; the request is only described here,
//! fetching series is left to the host.

use super::CascadeError;
use super::selection::{Level, Query, Selection};
use crate::logicmonitor::endpoints::{self, ResourceRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRequest {
    pub host_id: String,
    pub hds_id: i64,
    pub instances: Vec<Selection>,
    pub data_points: Vec<String>,
    pub request: ResourceRequest,
}

impl MetricsRequest {
    /// Check every level in hierarchy order and describe the raw-data call
    pub fn from_query(query: &Query, from: i64, to: i64) -> Result<Self, CascadeError> {
        let missing = CascadeError::MissingSelection;

        query.group_selected.as_ref().ok_or(missing(Level::Group))?;
        let host = query
            .host_selected
            .as_ref()
            .ok_or(missing(Level::Resource))?;
        let hds = query
            .hds_selected
            .as_ref()
            .ok_or(missing(Level::DataSource))?;
        if query.instance_selected.is_empty() {
            return Err(missing(Level::Instance));
        }
        if query.data_point_selected.is_empty() {
            return Err(missing(Level::DataPoint));
        }

        // Raw data is addressed by resource id; a typed-in name cannot be used
        let host_id = host.id().ok_or(missing(Level::Resource))?.to_string();

        let data_points: Vec<String> = query
            .data_point_selected
            .iter()
            .map(|dp| dp.label.clone())
            .collect();

        let request =
            endpoints::raw_data_multi_instance(&host_id, hds.id, from, to, &data_points);

        Ok(Self {
            host_id,
            hds_id: hds.id,
            instances: query.instance_selected.clone(),
            data_points,
            request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::selection::{DataPoint, DataSourceInstanceSelection};

    fn resolved() -> Query {
        Query {
            group_selected: Some(Selection::sentinel()),
            host_selected: Some(Selection::picked("5", "web-01")),
            data_source_selected: Some(311),
            hds_selected: Some(DataSourceInstanceSelection {
                id: 88,
                label: "Interfaces".to_string(),
                data_source_id: 311,
            }),
            instance_selected: vec![Selection::picked("10", "eth0")],
            data_point_selected: vec![
                DataPoint {
                    id: 1,
                    label: "InOctets".to_string(),
                },
                DataPoint {
                    id: 2,
                    label: "OutOctets".to_string(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_resolved_query_builds_request() {
        let req = MetricsRequest::from_query(&resolved(), 100, 200).unwrap();
        assert_eq!(req.host_id, "5");
        assert_eq!(
            req.request.path,
            "device/devices/5/devicedatasources/88/data"
        );
        assert_eq!(req.request.param_value("datapoints"), Some("InOctets,OutOctets"));
        assert_eq!(req.request.param_value("end"), Some("200"));
    }

    #[test]
    fn test_first_missing_level_is_reported() {
        let mut query = resolved();
        query.data_point_selected.clear();
        query.instance_selected.clear();
        assert_eq!(
            MetricsRequest::from_query(&query, 0, 1).unwrap_err(),
            CascadeError::MissingSelection(Level::Instance)
        );

        query.group_selected = None;
        assert_eq!(
            MetricsRequest::from_query(&query, 0, 1).unwrap_err(),
            CascadeError::MissingSelection(Level::Group)
        );
    }

    #[test]
    fn test_missing_data_points() {
        let mut query = resolved();
        query.data_point_selected.clear();
        let err = MetricsRequest::from_query(&query, 0, 1).unwrap_err();
        assert_eq!(err.to_string(), "missing data point selection");
    }

    #[test]
    fn test_custom_resource_cannot_fetch() {
        let mut query = resolved();
        query.host_selected = Some(Selection::custom("web*"));
        assert_eq!(
            MetricsRequest::from_query(&query, 0, 1).unwrap_err(),
            CascadeError::MissingSelection(Level::Resource)
        );
    }
}
