// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Host-variable interpolation
//!
//! A dashboard may bind one template variable to the Resource level. When
//! its value differs from the stored resource id, the effective query is a
//! copy with the resource replaced and `isQueryInterpolated` set. The stored
//! query is never modified.
//!
//! Only the first variable is consulted. With no variables the query is
//! returned as is; additional variables are ignored.

use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

use super::selection::{Query, Selection};

/// Template variables exposed by the host
pub trait TemplateVariables {
    /// Variable names in declaration order
    fn names(&self) -> Vec<String>;
    /// Current value of `name`
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Fixed set of variables, in insertion order
#[derive(Debug, Clone, Default)]
pub struct StaticVariables {
    order: Vec<String>,
    values: BTreeMap<String, String>,
}

impl StaticVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.values.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.values.insert(name, value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.order.retain(|n| n != name);
        self.values.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|n| self.values.get(n).map(|v| (n.as_str(), v.as_str())))
    }
}

impl TemplateVariables for StaticVariables {
    fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn resolve(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HostVariableAdapter {
    enabled: bool,
}

impl HostVariableAdapter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Effective query for one render
    pub fn apply<'a>(&self, query: &'a Query, variables: &dyn TemplateVariables) -> Cow<'a, Query> {
        if !self.enabled {
            return Cow::Borrowed(query);
        }
        let Some(name) = variables.names().into_iter().next() else {
            return Cow::Borrowed(query);
        };
        let Some(value) = variables.resolve(&name) else {
            return Cow::Borrowed(query);
        };

        let current = query.host_selected.as_ref().and_then(Selection::id);
        if current == Some(value.as_str()) {
            return Cow::Borrowed(query);
        }

        debug!(variable = %name, value = %value, ?current, "Interpolating resource from host variable");
        let mut interpolated = query.clone();
        interpolated.host_selected = Some(Selection::picked(value, ""));
        interpolated.is_query_interpolated = true;
        Cow::Owned(interpolated)
    }
}
