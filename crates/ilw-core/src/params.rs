//! Endpoint parameter builder.
//!
//! Turns the current selection (projects, environments, date range), the navigation
//! [`Location`] and the session's saved search into the minimal query parameters sent to
//! the issues endpoints. Values equal to their defaults are never serialized, and
//! [`EndpointParams::from_query_pairs`] restores them, so `build -> parse -> build`
//! yields identical pairs.

use crate::model::SavedSearch;
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use std::fmt;

pub const DEFAULT_QUERY: &str = "is:unresolved";
pub const DEFAULT_SORT: Sort = Sort::Date;
/// Granularity of the per-issue trend graph when nothing else applies.
pub const DEFAULT_GROUP_STATS_PERIOD: &str = "24h";
/// Date range assumed by the server when neither a period nor start/end is sent.
pub const DEFAULT_STATS_PERIOD: &str = "14d";
pub const DYNAMIC_COUNTS_STATS_PERIODS: &[&str] = &["14d", "24h", "auto"];
pub const MAX_ITEMS: usize = 25;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    Date,
    New,
    Priority,
    Freq,
    User,
    Trend,
    Inbox,
}

impl Sort {
    pub const ALL: [Sort; 7] = [
        Sort::Date,
        Sort::New,
        Sort::Priority,
        Sort::Freq,
        Sort::User,
        Sort::Trend,
        Sort::Inbox,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Sort::Date => "date",
            Sort::New => "new",
            Sort::Priority => "priority",
            Sort::Freq => "freq",
            Sort::User => "user",
            Sort::Trend => "trend",
            Sort::Inbox => "inbox",
        }
    }

    pub fn parse(s: &str) -> Option<Sort> {
        Sort::ALL.into_iter().find(|sort| sort.as_str() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Sort::Date => "Last Seen",
            Sort::New => "First Seen",
            Sort::Priority => "Priority",
            Sort::Freq => "Events",
            Sort::User => "Users",
            Sort::Trend => "Relative Change",
            Sort::Inbox => "Date Added",
        }
    }

    /// Next sort in display order, wrapping around.
    pub fn next(self) -> Sort {
        let idx = Sort::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Sort::ALL[(idx + 1) % Sort::ALL.len()]
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRange {
    /// e.g. `24h`, `14d`.
    Relative(String),
    /// Always stored in UTC with whole-second precision.
    Absolute {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl DateRange {
    pub fn absolute<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> Self {
        DateRange::Absolute {
            start: to_utc_seconds(start),
            end: to_utc_seconds(end),
        }
    }
}

fn to_utc_seconds<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<Utc> {
    let utc = dt.with_timezone(&Utc);
    utc.with_nanosecond(0).unwrap_or(utc)
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(to_utc_seconds(&dt));
    }
    NaiveDateTime::parse_from_str(s, DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Global selection shared by every view: projects, environments, date range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFilters {
    pub projects: Vec<i64>,
    pub environments: Vec<String>,
    pub range: Option<DateRange>,
}

/// Navigation state (the URL query string of a browser view).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub query: Option<String>,
    pub sort: Option<String>,
    pub cursor: Option<String>,
    pub group_stats_period: Option<String>,
}

impl Location {
    pub fn from_query_string(qs: &str) -> Self {
        let mut location = Location::default();
        let qs = qs.strip_prefix('?').unwrap_or(qs);
        for (key, value) in url::form_urlencoded::parse(qs.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "query" => location.query = Some(value),
                "sort" => location.sort = Some(value),
                "cursor" => location.cursor = Some(value),
                "groupStatsPeriod" => location.group_stats_period = Some(value),
                _ => {}
            }
        }
        location
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(query) = &self.query {
            serializer.append_pair("query", query);
        }
        if let Some(sort) = &self.sort {
            serializer.append_pair("sort", sort);
        }
        if let Some(cursor) = &self.cursor {
            serializer.append_pair("cursor", cursor);
        }
        if let Some(period) = &self.group_stats_period {
            serializer.append_pair("groupStatsPeriod", period);
        }
        serializer.finish()
    }

    /// Same location on another page.
    pub fn with_cursor(&self, cursor: Option<String>) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParams {
    pub projects: Vec<i64>,
    pub environments: Vec<String>,
    pub range: Option<DateRange>,
    pub query: String,
    pub sort: Sort,
    pub group_stats_period: String,
}

impl Default for EndpointParams {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            environments: Vec::new(),
            range: None,
            query: DEFAULT_QUERY.to_string(),
            sort: DEFAULT_SORT,
            group_stats_period: DEFAULT_GROUP_STATS_PERIOD.to_string(),
        }
    }
}

pub fn resolve_query(location: &Location, saved: Option<&SavedSearch>) -> String {
    location
        .query
        .clone()
        .or_else(|| saved.map(|s| s.query.clone()))
        .unwrap_or_else(|| DEFAULT_QUERY.to_string())
}

pub fn resolve_sort(location: &Location, saved: Option<&SavedSearch>) -> Sort {
    let raw = location
        .sort
        .as_deref()
        .or_else(|| saved.and_then(|s| s.sort.as_deref()));
    raw.and_then(Sort::parse).unwrap_or(DEFAULT_SORT)
}

pub fn resolve_group_stats_period(location: &Location, sort: Sort) -> String {
    match location.group_stats_period.as_deref() {
        Some(period) if DYNAMIC_COUNTS_STATS_PERIODS.contains(&period) => period.to_string(),
        _ if sort == Sort::Trend => "auto".to_string(),
        _ => DEFAULT_GROUP_STATS_PERIOD.to_string(),
    }
}

pub fn build_endpoint_params(
    filters: &PageFilters,
    location: &Location,
    saved: Option<&SavedSearch>,
) -> EndpointParams {
    let sort = resolve_sort(location, saved);
    EndpointParams {
        projects: filters.projects.clone(),
        environments: filters.environments.clone(),
        range: filters.range.clone(),
        query: resolve_query(location, saved),
        sort,
        group_stats_period: resolve_group_stats_period(location, sort),
    }
}

pub type QueryPairs = Vec<(String, String)>;

impl EndpointParams {
    /// Project/environment/date scope shared by every request.
    pub fn scope_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        for project in &self.projects {
            pairs.push(("project".to_string(), project.to_string()));
        }
        for env in &self.environments {
            pairs.push(("environment".to_string(), env.clone()));
        }
        match &self.range {
            Some(DateRange::Relative(period)) if period != DEFAULT_STATS_PERIOD => {
                pairs.push(("statsPeriod".to_string(), period.clone()));
            }
            Some(DateRange::Absolute { start, end }) => {
                pairs.push(("start".to_string(), start.format(DATE_FORMAT).to_string()));
                pairs.push(("end".to_string(), end.format(DATE_FORMAT).to_string()));
            }
            _ => {}
        }
        pairs
    }

    /// Minimal serialized form: nothing equal to its default is emitted.
    pub fn to_query_pairs(&self) -> QueryPairs {
        let mut pairs = self.scope_pairs();
        if self.query != DEFAULT_QUERY {
            pairs.push(("query".to_string(), self.query.clone()));
        }
        if self.sort != DEFAULT_SORT {
            pairs.push(("sort".to_string(), self.sort.to_string()));
        }
        if self.group_stats_period != DEFAULT_GROUP_STATS_PERIOD {
            pairs.push((
                "groupStatsPeriod".to_string(),
                self.group_stats_period.clone(),
            ));
        }
        pairs
    }

    pub fn from_query_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = EndpointParams::default();
        let mut start = None;
        let mut end = None;
        for (key, value) in pairs {
            match key.as_str() {
                "project" => {
                    if let Ok(id) = value.parse() {
                        params.projects.push(id);
                    }
                }
                "environment" => params.environments.push(value.clone()),
                "statsPeriod" => params.range = Some(DateRange::Relative(value.clone())),
                "start" => start = parse_utc(value),
                "end" => end = parse_utc(value),
                "query" => params.query.clone_from(value),
                "sort" => params.sort = Sort::parse(value).unwrap_or(DEFAULT_SORT),
                "groupStatsPeriod" => params.group_stats_period.clone_from(value),
                _ => {}
            }
        }
        if let (Some(start), Some(end)) = (start, end) {
            params.range = Some(DateRange::Absolute { start, end });
        }
        params
    }

    /// Servers want an explicit period when the selection has none. A relative range
    /// missing from the pairs can only be the default one.
    fn push_default_period(pairs: &mut QueryPairs) {
        let sends_range = pairs
            .iter()
            .any(|(k, _)| k == "statsPeriod" || k == "start");
        if !sends_range {
            pairs.push(("statsPeriod".to_string(), DEFAULT_STATS_PERIOD.to_string()));
        }
    }

    /// Parameters of the list request.
    pub fn list_pairs(&self, cursor: Option<&str>) -> QueryPairs {
        let mut pairs = self.to_query_pairs();
        Self::push_default_period(&mut pairs);
        if let Some(cursor) = cursor {
            pairs.push(("cursor".to_string(), cursor.to_string()));
        }
        pairs.push(("limit".to_string(), MAX_ITEMS.to_string()));
        pairs.push(("shortIdLookup".to_string(), "1".to_string()));
        pairs.push(("expand".to_string(), "owners".to_string()));
        pairs.push(("expand".to_string(), "inbox".to_string()));
        pairs.push(("collapse".to_string(), "stats".to_string()));
        pairs
    }

    /// Parameters of the per-item statistics request.
    pub fn stats_pairs(&self, ids: &[String]) -> QueryPairs {
        let mut pairs = self.to_query_pairs();
        Self::push_default_period(&mut pairs);
        for id in ids {
            pairs.push(("groups".to_string(), id.clone()));
        }
        pairs
    }

    /// Scope plus an explicit date range, for endpoints outside the issue list.
    pub fn scoped_pairs(&self) -> QueryPairs {
        let mut pairs = self.scope_pairs();
        Self::push_default_period(&mut pairs);
        pairs
    }

    /// Parameters of the per-tab counts request.
    pub fn counts_pairs(&self, queries: &[String]) -> QueryPairs {
        let mut pairs = self.scoped_pairs();
        for query in queries {
            pairs.push(("query".to_string(), query.clone()));
        }
        pairs
    }
}
