// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Cascade resolver
//!
//! Owns the selection state of one panel query and the option lists of each
//! level. A change at one level clears every level below it (selections,
//! option lists and, from the data source level down, the instance cache)
//! and reloads the next level directly from the mutating operation.
//!
//! Operations take `&mut self`, so the state is never mutated in parallel.
//! Each listing sets the level's loading flag before the request and clears
//! it once the request returns, whatever the outcome. Transport failures are
//! recorded and leave the level with zero options; selections are untouched.

use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::interpolate::{HostVariableAdapter, TemplateVariables};
use super::metrics::MetricsRequest;
use super::regex_filter;
use super::selection::{
    DataPoint, DataSourceInstanceSelection, InstanceMode, Level, Query, ResourceType, Selection,
};
use super::trigger::{QueryTrigger, TriggerCause};
use super::CascadeError;
use crate::config::Config;
use crate::logicmonitor::endpoints::{self, MATCH_ALL, ResourceRequest};
use crate::logicmonitor::response;
use crate::logicmonitor::{ErrorEnvelope, InstanceCache, Transport};
use crate::progress::ProgressHandle;

/// Feature switches the resolver branches on
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Autocomplete search endpoints instead of full listings
    pub autocomplete: bool,
    pub regex_enabled: bool,
    pub host_variable: bool,
    /// Artificial latency before each listing request
    pub listing_delay: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            autocomplete: true,
            regex_enabled: true,
            host_variable: true,
            listing_delay: Duration::ZERO,
        }
    }
}

impl ResolverOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            autocomplete: config.features.autocomplete,
            regex_enabled: config.features.regex_instance_selection,
            host_variable: config.features.host_variable,
            listing_delay: Duration::from_millis(config.listing_delay_ms),
        }
    }
}

/// Option lists per level; `None` means never loaded or cleared
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelOptions {
    pub groups: Option<Vec<Selection>>,
    pub resources: Option<Vec<Selection>>,
    pub data_sources: Option<Vec<DataSourceInstanceSelection>>,
    pub instances: Option<Vec<Selection>>,
    pub data_points: Option<Vec<DataPoint>>,
}

impl LevelOptions {
    fn clear_level(&mut self, level: Level) {
        match level {
            Level::Group => self.groups = None,
            Level::Resource => self.resources = None,
            Level::DataSource => self.data_sources = None,
            Level::Instance => self.instances = None,
            Level::DataPoint => self.data_points = None,
        }
    }

    fn clear_below(&mut self, level: Level) {
        for l in Level::ALL.into_iter().filter(|l| *l > level) {
            self.clear_level(l);
        }
    }

    /// Number of loaded options, `None` when the level has no list
    pub fn count(&self, level: Level) -> Option<usize> {
        match level {
            Level::Group => self.groups.as_ref().map(Vec::len),
            Level::Resource => self.resources.as_ref().map(Vec::len),
            Level::DataSource => self.data_sources.as_ref().map(Vec::len),
            Level::Instance => self.instances.as_ref().map(Vec::len),
            Level::DataPoint => self.data_points.as_ref().map(Vec::len),
        }
    }
}

/// Per-level in-flight flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub group: bool,
    pub resource: bool,
    pub data_source: bool,
    pub instance: bool,
    pub data_point: bool,
}

impl LoadingFlags {
    pub fn get(&self, level: Level) -> bool {
        match level {
            Level::Group => self.group,
            Level::Resource => self.resource,
            Level::DataSource => self.data_source,
            Level::Instance => self.instance,
            Level::DataPoint => self.data_point,
        }
    }

    fn set(&mut self, level: Level, value: bool) {
        match level {
            Level::Group => self.group = value,
            Level::Resource => self.resource = value,
            Level::DataSource => self.data_source = value,
            Level::Instance => self.instance = value,
            Level::DataPoint => self.data_point = value,
        }
    }

    pub fn any(&self) -> bool {
        Level::ALL.iter().any(|l| self.get(*l))
    }
}

pub struct CascadeResolver {
    transport: Arc<dyn Transport>,
    options: ResolverOptions,
    query: Query,
    level_options: LevelOptions,
    loading: LoadingFlags,
    /// In-progress group text, not committed
    group_search: Option<String>,
    /// In-progress resource text, not committed
    resource_search: Option<String>,
    cache: InstanceCache,
    trigger: QueryTrigger,
    errors: Vec<(Level, ErrorEnvelope)>,
    progress: Option<ProgressHandle>,
}

impl CascadeResolver {
    pub fn new(transport: Arc<dyn Transport>, options: ResolverOptions) -> Self {
        Self {
            transport,
            options,
            query: Query::default(),
            level_options: LevelOptions::default(),
            loading: LoadingFlags::default(),
            group_search: None,
            resource_search: None,
            cache: InstanceCache::new(),
            trigger: QueryTrigger::new(),
            errors: Vec::new(),
            progress: None,
        }
    }

    /// Start from a persisted query
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_progress(mut self, progress: ProgressHandle) -> Self {
        self.progress = Some(progress);
        self
    }

    // === Accessors ===

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn options(&self) -> &LevelOptions {
        &self.level_options
    }

    pub fn resolver_options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn loading(&self) -> LoadingFlags {
        self.loading
    }

    pub fn regex_valid(&self) -> bool {
        self.query.regex_valid
    }

    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    pub fn group_search(&self) -> Option<&str> {
        self.group_search.as_deref()
    }

    pub fn resource_search(&self) -> Option<&str> {
        self.resource_search.as_deref()
    }

    /// Number of metrics query firings
    pub fn triggered(&self) -> usize {
        self.trigger.fired()
    }

    pub fn last_error(&self) -> Option<&ErrorEnvelope> {
        self.errors.last().map(|(_, e)| e)
    }

    /// Failures recorded since the last call
    pub fn take_errors(&mut self) -> Vec<(Level, ErrorEnvelope)> {
        std::mem::take(&mut self.errors)
    }

    // === Transport plumbing ===

    /// One listing request for `level`; `None` when the transport failed
    async fn fetch(&mut self, level: Level, request: ResourceRequest) -> Option<Value> {
        self.loading.set(level, true);
        if let Some(progress) = &self.progress {
            progress.level_loading(level, &request.to_string());
        }

        if !self.options.listing_delay.is_zero() {
            tokio::time::sleep(self.options.listing_delay).await;
        }

        debug!(%level, request = %request, "Loading options");
        let transport = Arc::clone(&self.transport);
        let result = transport.get(&request).await;
        self.loading.set(level, false);

        match result {
            Ok(body) => Some(body),
            Err(envelope) => {
                warn!(%level, kind = %request.kind, error = %envelope, "Listing failed");
                if let Some(progress) = &self.progress {
                    progress.level_failed(level, &envelope.message);
                }
                self.errors.push((level, envelope));
                None
            }
        }
    }

    /// Fetch and parse; failures and malformed bodies both yield zero options
    async fn load<T>(
        &mut self,
        level: Level,
        request: ResourceRequest,
        parse: impl FnOnce(&Value) -> Vec<T>,
    ) -> Vec<T> {
        let started = Instant::now();
        match self.fetch(level, request).await {
            Some(body) => {
                let parsed = parse(&body);
                self.report_loaded(level, parsed.len(), started);
                parsed
            }
            None => Vec::new(),
        }
    }

    fn report_loaded(&self, level: Level, options: usize, started: Instant) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(%level, options, elapsed_ms, "Options loaded");
        if let Some(progress) = &self.progress {
            progress.level_loaded(level, options, elapsed_ms);
        }
    }

    fn fire(&mut self, cause: TriggerCause) {
        if !self.trigger.fire(&mut self.query, cause) {
            return;
        }
        if let (Some(progress), Some(stamp)) =
            (&self.progress, self.query.last_query_edited_time_stamp)
        {
            progress.query_triggered(stamp);
        }
    }

    /// Clear everything below `level`; the cache goes with the data source level
    fn invalidate_below(&mut self, level: Level) {
        self.query.clear_below(level);
        self.level_options.clear_below(level);
        if level < Level::DataSource {
            self.cache.invalidate();
        }
    }

    // === Operations ===

    /// Initial load of a panel
    pub async fn mount(&mut self) {
        info!(
            autocomplete = self.options.autocomplete,
            resource_type = %self.query.type_selected,
            "Mounting query editor"
        );

        if self.query.group_selected.is_none() {
            self.query.group_selected = Some(Selection::sentinel());
        }

        if self.options.autocomplete {
            self.reload_groups().await;
            self.resource_search = Some(MATCH_ALL.to_string());
        }
        self.reload_resources().await;

        if self.query.host_selected.is_some() {
            self.reload_data_sources().await;
        }
        if self.query.hds_selected.is_some() {
            self.reload_instances().await;
            self.reload_data_points().await;
        }
    }

    /// Switch the group family; clears Group and everything below it
    pub async fn set_resource_type(&mut self, resource_type: ResourceType) {
        info!(%resource_type, "Resource type changed");
        self.query.type_selected = resource_type;
        self.query.clear_from(Level::Group);
        self.level_options = LevelOptions::default();
        self.cache.invalidate();
        self.group_search = None;
        self.resource_search = None;

        if self.options.autocomplete {
            self.reload_groups().await;
        } else {
            // No group listing without autocomplete; match everything
            self.query.group_selected = Some(Selection::sentinel());
            self.reload_resources().await;
        }
    }

    /// Commit a group; returns false when it equals the current one
    pub async fn set_group(&mut self, selection: Option<Selection>) -> bool {
        if selection == self.query.group_selected {
            debug!(?selection, "Group unchanged");
            return false;
        }

        info!(group = ?selection, "Group changed");
        // The full host listing is not scoped by group and is fetched once
        let full_listing = if self.options.autocomplete {
            None
        } else {
            self.level_options.resources.take()
        };
        self.query.group_selected = selection;
        self.invalidate_below(Level::Group);
        self.group_search = None;
        self.resource_search = Some(MATCH_ALL.to_string());

        if full_listing.is_some() {
            self.level_options.resources = full_listing;
        } else if self.query.group_selected.is_some() {
            self.reload_resources().await;
        }
        true
    }

    /// Re-run the group search scoped by `text` without committing it
    pub async fn search_group(&mut self, text: &str) {
        if text.is_empty() || !self.options.autocomplete {
            return;
        }
        self.group_search = Some(text.to_string());
        self.reload_groups().await;
    }

    pub async fn reload_groups(&mut self) {
        if !self.options.autocomplete {
            debug!("Autocomplete disabled, group listing skipped");
            return;
        }

        let label = self
            .group_search
            .clone()
            .unwrap_or_else(|| self.query.group_label().to_string());

        let groups = match self.query.type_selected.group_type() {
            None => {
                let request = endpoints::autocomplete_groups(&label);
                self.load(Level::Group, request, response::parse_label_autocomplete)
                    .await
            }
            Some(group_type) => {
                let request = endpoints::service_or_device_groups(group_type, &label);
                self.load(Level::Group, request, response::parse_groups)
                    .await
            }
        };
        self.level_options.groups = Some(groups);
    }

    /// Re-run the resource search scoped by `text` without committing it
    pub async fn search_resource(&mut self, text: &str) {
        if text.is_empty() || !self.options.autocomplete {
            return;
        }
        self.resource_search = Some(text.to_string());
        self.reload_resources().await;
    }

    pub async fn reload_resources(&mut self) {
        let request = if self.options.autocomplete {
            let search = self.resource_search.as_deref().unwrap_or(MATCH_ALL);
            endpoints::autocomplete_hosts(search, self.query.group_label())
        } else {
            endpoints::all_hosts()
        };

        let parse = if self.options.autocomplete {
            response::parse_prefixed_autocomplete
        } else {
            response::parse_hosts
        };
        let resources = self.load(Level::Resource, request, parse).await;
        self.level_options.resources = Some(resources);
    }

    /// Commit a resource; returns false when it equals the current one
    pub async fn set_resource(&mut self, selection: Selection) -> bool {
        if self.query.host_selected.as_ref() == Some(&selection) {
            debug!(%selection, "Resource unchanged");
            return false;
        }

        info!(resource = %selection, "Resource changed");
        self.query.host_selected = Some(selection);
        self.invalidate_below(Level::Resource);
        self.reload_data_sources().await;
        true
    }

    pub async fn reload_data_sources(&mut self) {
        let Some(host) = self.query.host_selected.clone() else {
            return;
        };
        let Some(host_id) = host.id() else {
            warn!(resource = %host, "Typed-in resource has no id, data sources not listed");
            self.level_options.data_sources = Some(Vec::new());
            return;
        };

        let request = endpoints::data_sources(host_id);
        let data_sources = self
            .load(Level::DataSource, request, response::parse_data_sources)
            .await;
        self.level_options.data_sources = Some(data_sources);
    }

    /// Commit a data source instance; always clears the instance cache
    pub async fn set_data_source(&mut self, selection: DataSourceInstanceSelection) {
        info!(
            hds = selection.id,
            data_source = selection.data_source_id,
            label = %selection.label,
            "Data source changed"
        );
        self.cache.invalidate();
        self.query.data_source_selected = Some(selection.data_source_id);
        self.query.hds_selected = Some(selection);
        self.invalidate_below(Level::DataSource);

        self.reload_instances().await;
        self.reload_data_points().await;
    }

    pub async fn set_instance_mode(&mut self, mode: InstanceMode) -> Result<(), CascadeError> {
        if mode == InstanceMode::Regex && !self.options.regex_enabled {
            return Err(CascadeError::FeatureDisabled("regex instance selection"));
        }

        info!(%mode, "Instance mode changed");
        self.query.instance_mode = mode;
        self.query.instance_selected.clear();
        self.level_options.instances = None;
        if mode == InstanceMode::Select {
            self.query.regex_valid = true;
        }

        self.reload_instances().await;
        Ok(())
    }

    /// Store the pattern; in Regex mode the instance set is re-derived
    pub async fn set_instance_regex(&mut self, pattern: &str) {
        self.query.instance_regex = pattern.to_string();
        if self.query.instance_mode == InstanceMode::Regex {
            self.reload_instances().await;
        }
    }

    /// Select-mode instance search
    pub async fn search_instances(&mut self, text: &str) {
        if self.query.instance_mode != InstanceMode::Select || !self.options.autocomplete {
            return;
        }
        self.query.instance_search = text.to_string();
        self.reload_instances().await;
    }

    /// Commit picked instances (Select mode)
    pub fn set_instances(&mut self, selection: Vec<Selection>) -> Result<(), CascadeError> {
        if self.query.instance_mode == InstanceMode::Regex {
            return Err(CascadeError::DerivedSelection(Level::Instance));
        }
        info!(count = selection.len(), "Instances changed");
        self.query.instance_selected = selection;
        Ok(())
    }

    pub async fn reload_instances(&mut self) {
        let Some(hds) = self.query.hds_selected.clone() else {
            return;
        };
        match self.query.instance_mode {
            InstanceMode::Select => self.reload_instances_select(&hds).await,
            InstanceMode::Regex => self.reload_instances_regex(&hds).await,
        }
    }

    async fn reload_instances_select(&mut self, hds: &DataSourceInstanceSelection) {
        let instances = if self.options.autocomplete {
            let search = if self.query.instance_search.is_empty() {
                MATCH_ALL
            } else {
                self.query.instance_search.as_str()
            };
            let host_label = self
                .query
                .host_selected
                .as_ref()
                .map(Selection::label)
                .unwrap_or(MATCH_ALL);
            let request = endpoints::autocomplete_instances(
                search,
                self.query.group_label(),
                host_label,
                &hds.label,
            );
            self.load(Level::Instance, request, response::parse_prefixed_autocomplete)
                .await
        } else {
            match self.host_id() {
                Some(host_id) => {
                    let request = endpoints::all_instances(&host_id, hds.id);
                    self.load(Level::Instance, request, |body| {
                        response::parse_instances(body)
                            .into_iter()
                            .map(|i| Selection::picked(i.id, i.name))
                            .collect()
                    })
                    .await
                }
                None => Vec::new(),
            }
        };
        self.level_options.instances = Some(instances);
    }

    async fn reload_instances_regex(&mut self, hds: &DataSourceInstanceSelection) {
        let started = Instant::now();
        let mut fetched = false;
        let listing = match self.cache.get(hds.id) {
            Some(listing) => {
                debug!(hds = hds.id, "Instance listing served from cache");
                if let Some(progress) = &self.progress {
                    progress.cache_hit(hds.id);
                }
                listing.clone()
            }
            None => {
                let Some(host_id) = self.host_id() else {
                    self.level_options.instances = Some(Vec::new());
                    return;
                };
                let request = endpoints::all_instances(&host_id, hds.id);
                let Some(listing) = self.fetch(Level::Instance, request).await else {
                    self.level_options.instances = Some(Vec::new());
                    return;
                };
                self.cache.invalidate();
                self.cache.put(hds.id, listing.clone());
                fetched = true;
                listing
            }
        };

        let records = response::parse_instances(&listing);
        if fetched {
            self.report_loaded(Level::Instance, records.len(), started);
        }
        self.level_options.instances = Some(
            records
                .iter()
                .map(|r| {
                    Selection::picked(r.id.clone(), regex_filter::comparison_token(&r.name))
                })
                .collect(),
        );

        match regex_filter::filter_instances(&self.query.instance_regex, &records) {
            Ok(derived) => {
                let changed = derived != self.query.instance_selected;
                info!(
                    pattern = %self.query.instance_regex,
                    matched = derived.len(),
                    total = records.len(),
                    changed,
                    "Regex instances derived"
                );
                self.query.regex_valid = true;
                self.query.instance_selected = derived;
                self.fire(TriggerCause::RegexReevaluated { changed });
            }
            Err(e) => {
                debug!(pattern = %self.query.instance_regex, error = %e, "Invalid instance regex");
                self.query.regex_valid = false;
                self.query.instance_selected.clear();
            }
        }
    }

    pub async fn reload_data_points(&mut self) {
        let Some(hds) = self.query.hds_selected.clone() else {
            return;
        };

        let started = Instant::now();
        let request = endpoints::data_points(hds.data_source_id);
        let listing = match self.fetch(Level::DataPoint, request).await {
            Some(body) => response::parse_data_points(&body),
            None => response::DataPointListing::default(),
        };
        if listing.collect_interval.is_some() {
            self.query.collect_interval = listing.collect_interval;
        }
        self.report_loaded(Level::DataPoint, listing.points.len(), started);
        self.level_options.data_points = Some(listing.points);
    }

    /// Commit data points; a non-empty selection runs the metrics query
    pub fn set_data_points(&mut self, selection: Vec<DataPoint>) {
        info!(count = selection.len(), "Data points changed");
        self.query.data_point_selected = selection;
        self.fire(TriggerCause::DataPointsChanged);
    }

    // === Host collaboration ===

    /// Effective query after host-variable interpolation
    pub fn interpolated_query<'a>(&'a self, variables: &dyn TemplateVariables) -> Cow<'a, Query> {
        HostVariableAdapter::new(self.options.host_variable).apply(&self.query, variables)
    }

    /// Raw-data request for the current selection
    pub fn metrics_request(&self, from: i64, to: i64) -> Result<MetricsRequest, CascadeError> {
        MetricsRequest::from_query(&self.query, from, to)
    }

    fn host_id(&self) -> Option<String> {
        let host = self.query.host_selected.as_ref()?;
        match host.id() {
            Some(id) => Some(id.to_string()),
            None => {
                warn!(resource = %host, "Typed-in resource has no id, instances not listed");
                None
            }
        }
    }
}
