//! Fetch orchestration: the list → stats → counts cycle, bulk updates and undo.
//!
//! Each unit of work runs as a spawned task and reports back through [`AppEvent`]s.
//! The main loop keeps the [`CycleHandle`] of the current cycle and cancels it before
//! starting the next one, so at most one list/stats/counts request is in flight.
//! Results also carry the generation they were planned under, and the view ignores
//! anything older than its current generation.

use crate::events::AppEvent;
use crate::params::EndpointParams;
use crate::traits::{BulkUpdate, IssueApi, ListResponse};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Everything a fetch cycle needs, captured when the cycle starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub generation: u64,
    pub params: EndpointParams,
    pub cursor: Option<String>,
    /// Tab queries whose counts must be requested in this cycle.
    pub count_queries: Vec<String>,
}

pub struct CycleHandle(JoinHandle<()>);

impl CycleHandle {
    pub fn cancel(&self) {
        self.0.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

/// Path of the single issue a direct-hit search resolved to, if any.
pub fn direct_hit_path(org: &str, response: &ListResponse) -> Option<String> {
    if !response.direct_hit || response.groups.len() != 1 {
        return None;
    }
    let group = &response.groups[0];
    Some(match &group.matching_event_id {
        Some(event_id) => format!(
            "/organizations/{org}/issues/{}/events/{event_id}/",
            group.id
        ),
        None => format!("/organizations/{org}/issues/{}/", group.id),
    })
}

pub fn spawn_fetch_cycle(
    api: Arc<dyn IssueApi>,
    plan: FetchPlan,
    tx: mpsc::UnboundedSender<AppEvent>,
) -> CycleHandle {
    CycleHandle(tokio::spawn(async move {
        run_fetch_cycle(api.as_ref(), plan, &tx).await;
    }))
}

pub async fn run_fetch_cycle(
    api: &dyn IssueApi,
    plan: FetchPlan,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let generation = plan.generation;
    tracing::debug!(generation, query = %plan.params.query, "fetch cycle started");

    let response = match api
        .list_issues(&plan.params.list_pairs(plan.cursor.as_deref()))
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(generation, "issue list request failed: {e}");
            let _ = tx.send(AppEvent::ListFailed {
                generation,
                error: format!("{e}"),
            });
            return;
        }
    };

    if let Some(path) = direct_hit_path(api.organization(), &response) {
        let _ = tx.send(AppEvent::Redirect { generation, path });
        return;
    }

    let ids: Vec<String> = response.groups.iter().map(|g| g.id.clone()).collect();
    if tx
        .send(AppEvent::ListResult {
            generation,
            response,
        })
        .is_err()
    {
        return;
    }

    if !ids.is_empty() {
        let event = match api.issue_stats(&plan.params.stats_pairs(&ids)).await {
            Ok(stats) => AppEvent::StatsResult { generation, stats },
            Err(e) => {
                tracing::warn!(generation, "issue stats request failed: {e}");
                AppEvent::StatsFailed {
                    generation,
                    error: format!("{e}"),
                }
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }

    if !plan.count_queries.is_empty() {
        let event = match api
            .issue_counts(&plan.params.counts_pairs(&plan.count_queries))
            .await
        {
            Ok(counts) => AppEvent::CountsResult { generation, counts },
            Err(e) => {
                tracing::warn!(generation, "issue counts request failed: {e}");
                AppEvent::CountsFailed {
                    generation,
                    error: format!("{e}"),
                }
            }
        };
        let _ = tx.send(event);
    }
}

pub fn spawn_bulk_update(
    api: Arc<dyn IssueApi>,
    update: BulkUpdate,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = api.bulk_update(&update).await.map_err(|e| format!("{e}"));
        if let Err(e) = &result {
            tracing::warn!(ids = ?update.ids, "bulk update failed: {e}");
        }
        let _ = tx.send(AppEvent::BulkUpdateCompleted {
            change: update.change,
            result,
        });
    });
}

/// Issues the single status update that reverts an action. The view refetches on
/// completion whatever the outcome.
pub async fn run_undo(
    api: &dyn IssueApi,
    update: BulkUpdate,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let result = api.bulk_update(&update).await.map_err(|e| format!("{e}"));
    if let Err(e) = &result {
        tracing::warn!(ids = ?update.ids, "undo failed: {e}");
    }
    let _ = tx.send(AppEvent::UndoCompleted(result));
}

pub fn spawn_undo(
    api: Arc<dyn IssueApi>,
    update: BulkUpdate,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        run_undo(api.as_ref(), update, &tx).await;
    });
}

pub fn spawn_saved_searches(api: Arc<dyn IssueApi>, tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let result = api.saved_searches().await.map_err(|e| format!("{e}"));
        let _ = tx.send(AppEvent::SavedSearchesLoaded(result));
    });
}
