//! Generic widget queries: data for dashboard chart and table widgets.
//!
//! Each widget carries one or more sub-queries. Tabular widgets (table, big number,
//! world map) fetch one event table per sub-query; chart widgets fetch one
//! `events-stats` series set per sub-query. Sub-queries run concurrently and are
//! joined; a single failure fails the whole widget.

use crate::params::{EndpointParams, PageFilters, QueryPairs};
use crate::traits::IssueApi;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayType {
    Line,
    Area,
    Bar,
    Table,
    BigNumber,
    WorldMap,
    TopN,
}

impl DisplayType {
    pub fn is_tabular(self) -> bool {
        matches!(
            self,
            DisplayType::Table | DisplayType::BigNumber | DisplayType::WorldMap
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetQuery {
    #[serde(default)]
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub orderby: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub title: String,
    pub display_type: DisplayType,
    #[serde(default = "default_interval")]
    pub interval: String,
    pub queries: Vec<WidgetQuery>,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_interval() -> String {
    "5m".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub is_metrics_data: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountValue {
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsStats {
    /// `[[timestamp, [{"count": n}, ...]], ...]`
    pub data: Vec<(i64, Vec<CountValue>)>,
    #[serde(default)]
    pub is_metrics_data: Option<bool>,
    /// Position among the keys of a multi-axis response.
    #[serde(default)]
    pub order: Option<u32>,
}

/// `events-stats` returns one series for a single y-axis, or one per y-axis keyed by
/// the axis name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesResponse {
    Single(EventsStats),
    Multi(HashMap<String, EventsStats>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableResult {
    pub title: String,
    pub data: Vec<Map<String, Value>>,
    pub meta: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetResults {
    pub tables: Option<Vec<TableResult>>,
    pub timeseries: Option<Vec<Series>>,
    /// `None` until some response reports it; any exact result forces `Some(false)`.
    pub is_metrics_data: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("Error fetching widget \"{widget}\": {message}")]
    Request { widget: String, message: String },
    #[error("Widget \"{0}\" has no queries")]
    NoQueries(String),
}

/// Folds one response's sampling flag into the widget's.
pub fn merge_metrics_flag(acc: Option<bool>, next: Option<bool>) -> Option<bool> {
    if acc == Some(false) {
        Some(false)
    } else {
        next.or(acc)
    }
}

fn scope(filters: &PageFilters) -> QueryPairs {
    EndpointParams {
        projects: filters.projects.clone(),
        environments: filters.environments.clone(),
        range: filters.range.clone(),
        ..EndpointParams::default()
    }
    .scoped_pairs()
}

fn table_pairs(widget: &Widget, query: &WidgetQuery, filters: &PageFilters) -> QueryPairs {
    let mut pairs = scope(filters);
    for field in &query.fields {
        pairs.push(("field".to_string(), field.clone()));
    }
    pairs.push(("query".to_string(), query.conditions.clone()));
    if !query.orderby.is_empty() {
        pairs.push(("sort".to_string(), query.orderby.clone()));
    }
    let per_page = match widget.display_type {
        DisplayType::BigNumber => 1,
        _ => widget.limit.unwrap_or(20),
    };
    pairs.push(("per_page".to_string(), per_page.to_string()));
    pairs
}

fn series_pairs(widget: &Widget, query: &WidgetQuery, filters: &PageFilters) -> QueryPairs {
    let mut pairs = scope(filters);
    pairs.push(("interval".to_string(), widget.interval.clone()));
    for field in &query.fields {
        pairs.push(("yAxis".to_string(), field.clone()));
    }
    pairs.push(("query".to_string(), query.conditions.clone()));
    if widget.display_type == DisplayType::TopN {
        pairs.push(("topEvents".to_string(), widget.limit.unwrap_or(5).to_string()));
        if !query.orderby.is_empty() {
            pairs.push(("orderby".to_string(), query.orderby.clone()));
        }
    }
    pairs
}

fn series_from_stats(name: String, stats: &EventsStats) -> Series {
    Series {
        name,
        data: stats
            .data
            .iter()
            .map(|(timestamp, counts)| SeriesPoint {
                timestamp: *timestamp,
                value: counts.iter().map(|c| c.count).sum(),
            })
            .collect(),
    }
}

/// Turns one `events-stats` response into named series, in a stable order.
pub fn transform_series(query: &WidgetQuery, response: &SeriesResponse) -> Vec<Series> {
    let prefix = if query.name.is_empty() {
        String::new()
    } else {
        format!("{} : ", query.name)
    };
    match response {
        SeriesResponse::Single(stats) => {
            let axis = query.fields.first().map_or("count()", String::as_str);
            vec![series_from_stats(format!("{prefix}{axis}"), stats)]
        }
        SeriesResponse::Multi(by_axis) => {
            let mut keys: Vec<&String> = by_axis.keys().collect();
            keys.sort_by_key(|k| (by_axis[*k].order.unwrap_or(u32::MAX), (*k).clone()));
            keys.into_iter()
                .map(|key| series_from_stats(format!("{prefix}{key}"), &by_axis[key]))
                .collect()
        }
    }
}

fn series_metrics_flag(response: &SeriesResponse) -> Option<bool> {
    match response {
        SeriesResponse::Single(stats) => stats.is_metrics_data,
        SeriesResponse::Multi(by_axis) => by_axis
            .values()
            .fold(None, |acc, s| merge_metrics_flag(acc, s.is_metrics_data)),
    }
}

pub struct GenericWidgetQueries<'a> {
    api: &'a dyn IssueApi,
    filters: &'a PageFilters,
}

impl<'a> GenericWidgetQueries<'a> {
    pub fn new(api: &'a dyn IssueApi, filters: &'a PageFilters) -> Self {
        Self { api, filters }
    }

    pub async fn fetch(&self, widget: &Widget) -> Result<WidgetResults, WidgetError> {
        if widget.queries.is_empty() {
            return Err(WidgetError::NoQueries(widget.title.clone()));
        }
        tracing::debug!(widget = %widget.title, queries = widget.queries.len(), "fetching widget");
        if widget.display_type.is_tabular() {
            self.fetch_tables(widget).await
        } else {
            self.fetch_series(widget).await
        }
    }

    async fn fetch_tables(&self, widget: &Widget) -> Result<WidgetResults, WidgetError> {
        let requests = widget.queries.iter().map(|query| async move {
            let pairs = table_pairs(widget, query, self.filters);
            (query, self.api.events_table(&pairs).await)
        });
        let responses = join_all(requests).await;

        let mut results = WidgetResults::default();
        let mut tables = Vec::with_capacity(responses.len());
        for (query, response) in responses {
            let response = response.map_err(|e| WidgetError::Request {
                widget: widget.title.clone(),
                message: format!("{e}"),
            })?;
            results.is_metrics_data =
                merge_metrics_flag(results.is_metrics_data, response.is_metrics_data);
            tables.push(TableResult {
                title: query.name.clone(),
                data: response.data,
                meta: response.meta,
            });
        }
        results.tables = Some(tables);
        Ok(results)
    }

    async fn fetch_series(&self, widget: &Widget) -> Result<WidgetResults, WidgetError> {
        let requests = widget.queries.iter().map(|query| async move {
            let pairs = series_pairs(widget, query, self.filters);
            (query, self.api.events_stats(&pairs).await)
        });
        let responses = join_all(requests).await;

        let mut results = WidgetResults::default();
        let mut timeseries = Vec::new();
        for (query, response) in responses {
            let response = response.map_err(|e| WidgetError::Request {
                widget: widget.title.clone(),
                message: format!("{e}"),
            })?;
            results.is_metrics_data =
                merge_metrics_flag(results.is_metrics_data, series_metrics_flag(&response));
            timeseries.extend(transform_series(query, &response));
        }
        results.timeseries = Some(timeseries);
        Ok(results)
    }
}
