//! Scripted in-memory `IssueApi` for unit tests.

use crate::model::{Group, GroupStats, GroupStatus, ProjectRef, SavedSearch};
use crate::params::QueryPairs;
use crate::traits::{BulkUpdate, IssueApi, ListResponse};
use crate::widgets::{SeriesResponse, TableResponse};
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn group(id: &str) -> Group {
    Group {
        id: id.to_string(),
        short_id: format!("BACKEND-{id}"),
        title: format!("Error {id}"),
        culprit: "app.handler".to_string(),
        status: GroupStatus::Unresolved,
        inbox: None,
        project: ProjectRef {
            id: "2".to_string(),
            slug: "backend".to_string(),
        },
        count: "1".to_string(),
        user_count: 0,
        first_seen: None,
        last_seen: None,
        stats: None,
        matching_event_id: None,
    }
}

#[derive(Default)]
struct State {
    calls: Vec<String>,
    list: VecDeque<Result<ListResponse, String>>,
    list_latency: Duration,
    stats_ids: Vec<String>,
    fail_stats: bool,
    counts: HashMap<String, u64>,
    fail_counts: bool,
    bulk_updates: Vec<BulkUpdate>,
    poll_pages: VecDeque<ListResponse>,
    polled: Vec<String>,
    poll_latency: Duration,
    fail_polls: bool,
    tables: HashMap<String, Result<TableResponse, String>>,
    series: HashMap<String, Result<SeriesResponse, String>>,
}

#[derive(Default)]
pub struct MockApi {
    state: Mutex<State>,
    polls_in_flight: AtomicUsize,
    max_polls_in_flight: AtomicUsize,
}

fn param<'a>(params: &'a QueryPairs, key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

impl MockApi {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn push_list(&self, response: Result<ListResponse, String>) {
        self.state().list.push_back(response);
    }

    pub fn set_list_latency(&self, latency: Duration) {
        self.state().list_latency = latency;
    }

    pub fn fail_stats(&self, fail: bool) {
        self.state().fail_stats = fail;
    }

    pub fn set_counts(&self, counts: HashMap<String, u64>) {
        self.state().counts = counts;
    }

    pub fn fail_counts(&self, fail: bool) {
        self.state().fail_counts = fail;
    }

    pub fn push_poll_page(&self, ids: &[&str], previous: Option<&str>) {
        let link = previous.map(|href| {
            format!(r#"<{href}>; rel="previous"; results="true"; cursor="c""#)
        });
        self.state().poll_pages.push_back(ListResponse {
            groups: ids.iter().map(|id| group(id)).collect(),
            link,
            ..Default::default()
        });
    }

    pub fn set_poll_latency(&self, latency: Duration) {
        self.state().poll_latency = latency;
    }

    pub fn fail_polls(&self, fail: bool) {
        self.state().fail_polls = fail;
    }

    pub fn set_table(&self, query: &str, response: Result<TableResponse, String>) {
        self.state().tables.insert(query.to_string(), response);
    }

    pub fn set_series(&self, query: &str, response: Result<SeriesResponse, String>) {
        self.state().series.insert(query.to_string(), response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn stats_requested_ids(&self) -> Vec<String> {
        self.state().stats_ids.clone()
    }

    pub fn bulk_updates(&self) -> Vec<BulkUpdate> {
        self.state().bulk_updates.clone()
    }

    pub fn polled_endpoints(&self) -> Vec<String> {
        self.state().polled.clone()
    }

    pub fn poll_calls(&self) -> usize {
        self.state().polled.len()
    }

    pub fn max_polls_in_flight(&self) -> usize {
        self.max_polls_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IssueApi for MockApi {
    fn organization(&self) -> &str {
        "acme"
    }

    async fn list_issues(&self, _params: &QueryPairs) -> Result<ListResponse> {
        let (latency, next) = {
            let mut state = self.state();
            state.calls.push("list".to_string());
            (state.list_latency, state.list.pop_front())
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        next.unwrap_or_else(|| Ok(ListResponse::default()))
            .map_err(|e| eyre!(e))
    }

    async fn issue_stats(&self, params: &QueryPairs) -> Result<Vec<GroupStats>> {
        let mut state = self.state();
        state.calls.push("stats".to_string());
        let ids: Vec<String> = params
            .iter()
            .filter(|(k, _)| k == "groups")
            .map(|(_, v)| v.clone())
            .collect();
        state.stats_ids.clone_from(&ids);
        if state.fail_stats {
            return Err(eyre!("stats unavailable"));
        }
        Ok(ids
            .into_iter()
            .map(|id| GroupStats {
                id,
                count: Some("99".to_string()),
                user_count: Some(4),
                stats: None,
                first_seen: None,
                last_seen: None,
                lifetime: None,
                filtered: None,
            })
            .collect())
    }

    async fn issue_counts(&self, params: &QueryPairs) -> Result<HashMap<String, u64>> {
        let mut state = self.state();
        state.calls.push("counts".to_string());
        if state.fail_counts {
            return Err(eyre!("counts unavailable"));
        }
        Ok(params
            .iter()
            .filter(|(k, _)| k == "query")
            .filter_map(|(_, q)| state.counts.get(q).map(|c| (q.clone(), *c)))
            .collect())
    }

    async fn bulk_update(&self, update: &BulkUpdate) -> Result<()> {
        let mut state = self.state();
        state.calls.push("bulk_update".to_string());
        state.bulk_updates.push(update.clone());
        Ok(())
    }

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>> {
        self.state().calls.push("saved_searches".to_string());
        Ok(Vec::new())
    }

    async fn poll(&self, endpoint: &str) -> Result<ListResponse> {
        let (latency, fail, page) = {
            let mut state = self.state();
            state.polled.push(endpoint.to_string());
            (state.poll_latency, state.fail_polls, state.poll_pages.pop_front())
        };
        let now = self.polls_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_polls_in_flight.fetch_max(now, Ordering::SeqCst);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.polls_in_flight.fetch_sub(1, Ordering::SeqCst);
        if fail {
            return Err(eyre!("connection refused"));
        }
        Ok(page.unwrap_or_default())
    }

    async fn events_table(&self, params: &QueryPairs) -> Result<TableResponse> {
        let query = param(params, "query").unwrap_or_default().to_string();
        let mut state = self.state();
        state.calls.push(format!("events:{query}"));
        state
            .tables
            .get(&query)
            .cloned()
            .unwrap_or_else(|| Ok(TableResponse::default()))
            .map_err(|e| eyre!(e))
    }

    async fn events_stats(&self, params: &QueryPairs) -> Result<SeriesResponse> {
        let query = param(params, "query").unwrap_or_default().to_string();
        let mut state = self.state();
        state.calls.push(format!("events-stats:{query}"));
        state
            .series
            .get(&query)
            .cloned()
            .unwrap_or_else(|| Err("no series scripted".to_string()))
            .map_err(|e| eyre!(e))
    }
}
