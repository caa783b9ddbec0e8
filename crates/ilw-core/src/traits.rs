use crate::model::{Group, GroupStats, GroupStatus, SavedSearch};
use crate::params::QueryPairs;
use crate::widgets::{SeriesResponse, TableResponse};
use async_trait::async_trait;
use color_eyre::eyre::Result;
use std::collections::HashMap;

/// Raw list response. Headers are kept unparsed; see [`crate::links`].
#[derive(Debug, Clone, Default)]
pub struct ListResponse {
    pub groups: Vec<Group>,
    /// `X-Hits`
    pub hits: Option<String>,
    /// `X-Max-Hits`
    pub max_hits: Option<String>,
    /// `Link`
    pub link: Option<String>,
    /// `X-Sentry-Direct-Hit: 1`
    pub direct_hit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChange {
    Status(GroupStatus),
    MarkReviewed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdate {
    pub ids: Vec<String>,
    pub projects: Vec<String>,
    pub change: GroupChange,
}

impl BulkUpdate {
    pub fn body(&self) -> serde_json::Value {
        match self.change {
            GroupChange::Status(status) => serde_json::json!({ "status": status.as_str() }),
            GroupChange::MarkReviewed => serde_json::json!({ "inbox": false }),
        }
    }
}

/// The REST surface of the error tracker, one method per endpoint.
#[async_trait]
pub trait IssueApi: Send + Sync {
    fn organization(&self) -> &str;
    async fn list_issues(&self, params: &QueryPairs) -> Result<ListResponse>;
    async fn issue_stats(&self, params: &QueryPairs) -> Result<Vec<GroupStats>>;
    /// `{query: count}` for each requested query.
    async fn issue_counts(&self, params: &QueryPairs) -> Result<HashMap<String, u64>>;
    async fn bulk_update(&self, update: &BulkUpdate) -> Result<()>;
    async fn saved_searches(&self) -> Result<Vec<SavedSearch>>;
    /// GET an absolute cursor URL previously handed out in a `Link` header.
    async fn poll(&self, endpoint: &str) -> Result<ListResponse>;
    async fn events_table(&self, params: &QueryPairs) -> Result<TableResponse>;
    async fn events_stats(&self, params: &QueryPairs) -> Result<SeriesResponse>;
}
