// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Query execution trigger
//!
//! The metrics query runs when data points are selected, either because the
//! data point selection itself changed or because a regex re-evaluation
//! changed the derived instance set. Each firing stamps the query with a
//! strictly increasing edit timestamp.

use tracing::{debug, info};

use super::selection::Query;

/// State change that may run the metrics query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCause {
    DataPointsChanged,
    /// Regex re-evaluation; `changed` is whether the derived set differs
    RegexReevaluated { changed: bool },
}

#[derive(Debug, Default)]
pub struct QueryTrigger {
    last_stamp: Option<i64>,
    fired: usize,
}

impl QueryTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `cause` should run the query given the current selection
    pub fn should_fire(query: &Query, cause: TriggerCause) -> bool {
        if query.data_point_selected.is_empty() {
            return false;
        }
        match cause {
            TriggerCause::DataPointsChanged => true,
            TriggerCause::RegexReevaluated { changed } => changed,
        }
    }

    /// Fire if the rule allows it; returns whether the query was stamped
    pub fn fire(&mut self, query: &mut Query, cause: TriggerCause) -> bool {
        if !Self::should_fire(query, cause) {
            debug!(?cause, "Query trigger suppressed");
            return false;
        }

        let now = chrono::Utc::now().timestamp_millis();
        let floor = self
            .last_stamp
            .max(query.last_query_edited_time_stamp)
            .map(|prev| prev + 1);
        let stamp = floor.map_or(now, |floor| now.max(floor));

        query.last_query_edited_time_stamp = Some(stamp);
        self.last_stamp = Some(stamp);
        self.fired += 1;

        info!(
            ?cause,
            stamp,
            data_points = query.data_point_selected.len(),
            instances = query.instance_selected.len(),
            "Metrics query triggered"
        );
        true
    }

    /// Number of firings so far
    pub fn fired(&self) -> usize {
        self.fired
    }

    pub fn last_stamp(&self) -> Option<i64> {
        self.last_stamp
    }
}
