//! Wire-level data model: groups (issues), statistics, saved searches and tab counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counts above this are shown as "99+" instead of exactly.
pub const TAB_MAX_COUNT: u64 = 99;

pub const QUERY_FOR_REVIEW: &str = "is:unresolved is:for_review assigned_or_suggested:[me, none]";
pub const QUERY_UNRESOLVED: &str = "is:unresolved";
pub const QUERY_IGNORED: &str = "is:ignored";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Unresolved,
    Resolved,
    Ignored,
    #[serde(other)]
    Unknown,
}

impl GroupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupStatus::Unresolved => "unresolved",
            GroupStatus::Resolved => "resolved",
            GroupStatus::Ignored => "ignored",
            GroupStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub slug: String,
}

/// Why an issue landed in the review inbox. Presence alone marks it "for review".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxDetails {
    #[serde(default)]
    pub reason: Option<u32>,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
}

/// `period -> [[timestamp, count], ...]`, e.g. `{"24h": [[1700000000, 3], ...]}`.
pub type StatsBuckets = HashMap<String, Vec<(i64, u64)>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub short_id: String,
    pub title: String,
    #[serde(default)]
    pub culprit: String,
    pub status: GroupStatus,
    #[serde(default)]
    pub inbox: Option<InboxDetails>,
    pub project: ProjectRef,
    /// Sent as a string by the API (counts may exceed JS integer range).
    #[serde(default)]
    pub count: String,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stats: Option<StatsBuckets>,
    #[serde(default)]
    pub matching_event_id: Option<String>,
}

impl Group {
    pub fn is_for_review(&self) -> bool {
        self.inbox.is_some()
    }

    /// Folds a stats payload into this record. Only fields the payload carries are overwritten.
    pub fn merge_stats(&mut self, stats: &GroupStats) {
        if let Some(count) = &stats.count {
            self.count.clone_from(count);
        }
        if let Some(user_count) = stats.user_count {
            self.user_count = user_count;
        }
        if let Some(buckets) = &stats.stats {
            self.stats = Some(buckets.clone());
        }
        if let Some(first_seen) = stats.first_seen {
            self.first_seen = Some(first_seen);
        }
        if let Some(last_seen) = stats.last_seen {
            self.last_seen = Some(last_seen);
        }
    }
}

/// One entry of the `issues-stats` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub id: String,
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub user_count: Option<u64>,
    #[serde(default)]
    pub stats: Option<StatsBuckets>,
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lifetime: Option<serde_json::Value>,
    #[serde(default)]
    pub filtered: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: String,
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_global: bool,
}

/// Picks the session's saved search: the first pinned one, if any.
pub fn pinned_search(searches: &[SavedSearch]) -> Option<&SavedSearch> {
    searches.iter().find(|s| s.is_pinned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryCount {
    pub count: u64,
    pub has_more: bool,
}

impl QueryCount {
    /// Server-reported count for a tab that is not currently displayed.
    pub fn capped(count: u64) -> Self {
        Self {
            count: count.min(TAB_MAX_COUNT),
            has_more: count > TAB_MAX_COUNT,
        }
    }

    /// Count of the current tab, taken from `X-Hits`.
    pub fn exact(count: u64) -> Self {
        Self {
            count,
            has_more: false,
        }
    }

    pub fn label(&self) -> String {
        if self.has_more {
            format!("{}+", self.count)
        } else {
            self.count.to_string()
        }
    }
}

pub type QueryCounts = HashMap<String, QueryCount>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tab {
    pub query: &'static str,
    pub name: &'static str,
    pub count: bool,
}

pub const TABS: &[Tab] = &[
    Tab {
        query: QUERY_FOR_REVIEW,
        name: "For Review",
        count: true,
    },
    Tab {
        query: QUERY_UNRESOLVED,
        name: "Unresolved",
        count: true,
    },
    Tab {
        query: QUERY_IGNORED,
        name: "Ignored",
        count: true,
    },
];

pub fn tab_for_query(query: &str) -> Option<&'static Tab> {
    TABS.iter().find(|t| t.query == query)
}

pub fn is_for_review_query(query: &str) -> bool {
    query == QUERY_FOR_REVIEW
}
