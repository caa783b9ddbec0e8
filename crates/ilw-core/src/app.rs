//! Issue list view state: what is displayed, how fetch results are reconciled, and the
//! optimistic triage actions.
//!
//! The view owns the [`GroupStore`] and lends it to the [`StreamManager`]; the stream
//! decides order, the store holds the records. Every fetch cycle bumps `generation`;
//! results planned under an older generation are ignored.

use crate::fetch::FetchPlan;
use crate::links::{parse_hits, parse_link_header, PageLinks};
use crate::model::{
    is_for_review_query, pinned_search, tab_for_query, Group, GroupStats, GroupStatus,
    QueryCount, QueryCounts, SavedSearch, QUERY_FOR_REVIEW, TABS,
};
use crate::params::{
    build_endpoint_params, resolve_query, resolve_sort, EndpointParams, Location, PageFilters,
    Sort,
};
use crate::store::{GroupStore, StreamManager};
use crate::traits::{BulkUpdate, GroupChange, ListResponse};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

pub const NOTIFICATION_TTL_SECS: u64 = 5;
/// Long enough to read; short enough to not permanently obscure the list.
pub const ERROR_TTL_SECS: u64 = 10;
/// Must match the length of `BRAILLE_FRAMES` in `tui::spinner`.
pub const SPINNER_FRAME_COUNT: usize = 10;
/// Below 60 cols, culprits and key hints don't fit.
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;

/// How "mark reviewed" behaves. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewWorkflow {
    /// Reviewed issues stay visible until the next fetch on the For Review tab drops them.
    Legacy,
    /// Reviewed issues leave the For Review tab immediately and its count drops.
    #[default]
    RemovalAction,
}

/// Immutable configuration set at startup.
pub struct ViewConfig {
    pub org: String,
    pub base_url: String,
    pub review_workflow: ReviewWorkflow,
    pub version_string: String,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub timestamp: Instant,
}

pub struct IssueListView {
    pub config: ViewConfig,

    // Inputs to the endpoint parameters
    pub filters: PageFilters,
    pub location: Location,
    pub saved_search: Option<SavedSearch>,
    pub saved_searches_loaded: bool,

    // Records
    pub store: GroupStore,
    pub stream: StreamManager,

    // Last fetch cycle
    pub generation: u64,
    pub params: EndpointParams,
    pub page_links: PageLinks,
    pub query_count: u64,
    pub query_max_count: u64,
    pub query_counts: QueryCounts,
    pub issues_loading: bool,
    /// Retryable list failure, rendered in place of the list.
    pub list_error: Option<String>,
    pub redirect: Option<String>,

    // Optimistic actions
    /// Legacy workflow: reviewed on the For Review tab, dropped on the next fetch.
    pub reviewed_ids: Vec<String>,
    pub undo_buffer: Vec<Group>,
    pub action_taken: bool,
    pub undo: bool,

    pub realtime_active: bool,

    // Transient UI
    pub cursor: usize,
    pub selected: BTreeSet<String>,
    pub notifications: Vec<Notification>,
    pub error: Option<(String, Instant)>,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl IssueListView {
    pub fn new(
        config: ViewConfig,
        filters: PageFilters,
        location: Location,
        realtime_active: bool,
    ) -> Self {
        let params = build_endpoint_params(&filters, &location, None);
        Self {
            config,
            filters,
            location,
            saved_search: None,
            saved_searches_loaded: false,
            store: GroupStore::new(),
            stream: StreamManager::default(),
            generation: 0,
            params,
            page_links: PageLinks::default(),
            query_count: 0,
            query_max_count: 0,
            query_counts: HashMap::new(),
            issues_loading: false,
            list_error: None,
            redirect: None,
            reviewed_ids: Vec::new(),
            undo_buffer: Vec::new(),
            action_taken: false,
            undo: false,
            realtime_active,
            cursor: 0,
            selected: BTreeSet::new(),
            notifications: Vec::new(),
            error: None,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn current_query(&self) -> String {
        resolve_query(&self.location, self.saved_search.as_ref())
    }

    pub fn current_sort(&self) -> Sort {
        resolve_sort(&self.location, self.saved_search.as_ref())
    }

    pub fn set_saved_searches(&mut self, result: Result<Vec<SavedSearch>, String>) {
        match result {
            Ok(searches) => {
                self.saved_search = pinned_search(&searches).cloned();
                if let Some(search) = &self.saved_search {
                    tracing::debug!(name = %search.name, "using pinned search");
                }
            }
            Err(e) => tracing::warn!("failed to load saved searches: {e}"),
        }
        self.saved_searches_loaded = true;
    }

    // --- Fetch cycle ---

    /// Starts a new fetch cycle and returns what it should request.
    pub fn begin_fetch(&mut self, refresh_counts: bool) -> FetchPlan {
        self.generation += 1;
        self.list_error = None;
        self.clear_error();
        self.redirect = None;
        self.issues_loading = true;
        // Realtime stays off until the new list supplies its own cursor.
        self.page_links = PageLinks::default();

        // Mid-action the old rows stay up until the authoritative response replaces them.
        if !self.undo && !self.action_taken {
            self.stream.reset(&mut self.store);
            self.cursor = 0;
            self.selected.clear();
        }

        self.params =
            build_endpoint_params(&self.filters, &self.location, self.saved_search.as_ref());
        let current = self.params.query.as_str();
        let count_queries = TABS
            .iter()
            .filter(|tab| tab.count && tab.query != current)
            .filter(|tab| refresh_counts || !self.query_counts.contains_key(tab.query))
            .map(|tab| tab.query.to_string())
            .collect();

        FetchPlan {
            generation: self.generation,
            params: self.params.clone(),
            cursor: self.location.cursor.clone(),
            count_queries,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "dropping stale result");
            return false;
        }
        true
    }

    /// Returns `false` when the result belongs to a superseded cycle.
    pub fn apply_list(&mut self, generation: u64, response: ListResponse) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.issues_loading = false;
        if self.undo || self.action_taken {
            self.stream.reset(&mut self.store);
        }
        self.undo = false;
        self.action_taken = false;

        self.stream.push(&mut self.store, response.groups);
        if self.config.review_workflow == ReviewWorkflow::Legacy
            && is_for_review_query(&self.params.query)
            && !self.reviewed_ids.is_empty()
        {
            self.store.remove(&self.reviewed_ids);
            self.reviewed_ids.clear();
        }

        self.query_count = parse_hits(response.hits.as_deref());
        self.query_max_count = parse_hits(response.max_hits.as_deref());
        self.page_links = parse_link_header(response.link.as_deref());
        if tab_for_query(&self.params.query).is_some() {
            self.query_counts
                .insert(self.params.query.clone(), QueryCount::exact(self.query_count));
        }
        self.clamp_cursor();
        true
    }

    /// Keeps whatever is displayed; only the error state changes.
    pub fn apply_list_failed(&mut self, generation: u64, error: String) {
        if !self.is_current(generation) {
            return;
        }
        self.issues_loading = false;
        self.undo = false;
        self.action_taken = false;
        self.list_error = Some(error);
    }

    /// Absolute URL of the direct hit, if the result is still relevant.
    pub fn apply_redirect(&mut self, generation: u64, path: &str) -> Option<String> {
        if !self.is_current(generation) {
            return None;
        }
        self.issues_loading = false;
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        self.redirect = Some(url.clone());
        self.add_notification(format!("Direct match: {url}"));
        Some(url)
    }

    pub fn apply_stats(&mut self, generation: u64, stats: &[GroupStats]) {
        if self.is_current(generation) {
            self.store.merge_stats(stats);
        }
    }

    pub fn apply_counts(&mut self, generation: u64, counts: HashMap<String, u64>) {
        if !self.is_current(generation) {
            return;
        }
        for (query, count) in counts {
            // The displayed tab's count comes from X-Hits, exactly.
            if query != self.params.query {
                self.query_counts.insert(query, QueryCount::capped(count));
            }
        }
    }

    pub fn apply_counts_failed(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.query_counts.clear();
        }
    }

    /// Cursor URL the realtime poller should follow, when it should run at all.
    pub fn realtime_endpoint(&self) -> Option<String> {
        if !self.realtime_active || self.page_links.has_previous() {
            return None;
        }
        self.page_links.previous.as_ref().map(|l| l.href.clone())
    }

    /// Prepends realtime arrivals polled under `generation`. Returns how many were new.
    pub fn apply_realtime(&mut self, generation: u64, groups: Vec<Group>) -> usize {
        if !self.is_current(generation) || self.issues_loading {
            return 0;
        }
        if !self.realtime_active || self.page_links.has_previous() {
            return 0;
        }
        let added = self.stream.unshift(&mut self.store, groups);
        if added > 0 {
            // Keep the highlighted row under the cursor.
            self.cursor = self.cursor.saturating_add(added);
            self.clamp_cursor();
            self.add_notification(format!(
                "{added} new issue{}",
                if added == 1 { "" } else { "s" }
            ));
        }
        added
    }

    pub fn toggle_realtime(&mut self) -> bool {
        self.realtime_active = !self.realtime_active;
        self.realtime_active
    }

    // --- Navigation (each returns whether a refetch is needed) ---

    pub fn next_page(&mut self) -> bool {
        match self.page_links.next_cursor() {
            Some(cursor) => {
                self.location = self.location.with_cursor(Some(cursor.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.page_links.previous_cursor() {
            Some(cursor) => {
                self.location = self.location.with_cursor(Some(cursor.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn select_tab(&mut self, idx: usize) -> bool {
        let Some(tab) = TABS.get(idx) else {
            return false;
        };
        if self.current_query() == tab.query {
            return false;
        }
        self.location.query = Some(tab.query.to_string());
        self.location.cursor = None;
        true
    }

    pub fn cycle_tab(&mut self) -> bool {
        let current = self.current_query();
        let idx = TABS
            .iter()
            .position(|t| t.query == current)
            .map_or(0, |i| (i + 1) % TABS.len());
        self.select_tab(idx)
    }

    pub fn cycle_sort(&mut self) -> bool {
        self.location.sort = Some(self.current_sort().next().to_string());
        self.location.cursor = None;
        true
    }

    pub fn set_filters(&mut self, filters: PageFilters) -> bool {
        if self.filters == filters {
            return false;
        }
        self.filters = filters;
        self.location.cursor = None;
        true
    }

    pub fn is_first_page(&self) -> bool {
        !self.page_links.has_previous()
    }

    // --- Rows and selection ---

    pub fn items(&self) -> Vec<&Group> {
        self.stream.get_all_items(&self.store)
    }

    pub fn current_item(&self) -> Option<&Group> {
        self.items().get(self.cursor).copied()
    }

    pub fn move_cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        let len = self.items().len();
        if len > 0 && self.cursor < len - 1 {
            self.cursor += 1;
        }
    }

    pub fn toggle_select(&mut self) {
        if let Some(id) = self.current_item().map(|g| g.id.clone()) {
            if !self.selected.remove(&id) {
                self.selected.insert(id);
            }
        }
    }

    /// Selected rows in display order, or the row under the cursor.
    pub fn target_ids(&self) -> Vec<String> {
        if self.selected.is_empty() {
            return self.current_item().map(|g| g.id.clone()).into_iter().collect();
        }
        self.items()
            .into_iter()
            .filter(|g| self.selected.contains(&g.id))
            .map(|g| g.id.clone())
            .collect()
    }

    fn clamp_cursor(&mut self) {
        let len = self.items().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
        let present: BTreeSet<String> = self
            .selected
            .iter()
            .filter(|id| self.store.contains(id))
            .cloned()
            .collect();
        self.selected = present;
    }

    /// Human-readable "25 of 42" summary; `+` when the server stopped counting.
    pub fn page_summary(&self) -> String {
        let shown = self.items().len();
        if self.query_max_count > 0 && self.query_count > self.query_max_count {
            format!("{shown} of {}+", self.query_max_count)
        } else {
            format!("{shown} of {}", self.query_count)
        }
    }

    // --- Optimistic actions ---

    fn bulk_update_for(&self, ids: &[String], change: GroupChange) -> BulkUpdate {
        let projects: BTreeSet<String> = ids
            .iter()
            .filter_map(|id| self.store.get(id))
            .map(|g| g.project.id.clone())
            .collect();
        BulkUpdate {
            ids: ids.to_vec(),
            projects: projects.into_iter().collect(),
            change,
        }
    }

    fn clear_inbox(&mut self, ids: &[String]) {
        for id in ids {
            if let Some(group) = self.store.get_mut(id) {
                group.inbox = None;
            }
        }
    }

    /// Marks issues reviewed locally and returns the server update to send.
    pub fn mark_reviewed(&mut self, ids: &[String]) -> Option<BulkUpdate> {
        if ids.is_empty() {
            return None;
        }
        let update = self.bulk_update_for(ids, GroupChange::MarkReviewed);
        let on_review_tab = is_for_review_query(&self.params.query);
        match self.config.review_workflow {
            ReviewWorkflow::RemovalAction if on_review_tab => {
                let in_inbox = ids
                    .iter()
                    .filter(|id| self.store.get(id).is_some_and(Group::is_for_review))
                    .count() as u64;
                if let Some(count) = self.query_counts.get_mut(QUERY_FOR_REVIEW) {
                    count.count = count.count.saturating_sub(in_inbox);
                }
                self.query_count = self.query_count.saturating_sub(in_inbox);
                self.store.remove(ids);
            }
            ReviewWorkflow::RemovalAction => self.clear_inbox(ids),
            ReviewWorkflow::Legacy => {
                self.clear_inbox(ids);
                if on_review_tab {
                    self.reviewed_ids.extend(ids.iter().cloned());
                }
            }
        }
        self.selected.clear();
        self.clamp_cursor();
        Some(update)
    }

    /// Removes acted-upon issues immediately and remembers them for undo. The caller
    /// sends the returned update and refetches when it completes.
    pub fn take_action(&mut self, ids: &[String], status: GroupStatus) -> Option<BulkUpdate> {
        if ids.is_empty() {
            return None;
        }
        let update = self.bulk_update_for(ids, GroupChange::Status(status));
        self.undo_buffer = ids
            .iter()
            .filter_map(|id| self.store.get(id).cloned())
            .collect();
        self.store.remove(ids);
        self.action_taken = true;
        self.selected.clear();
        self.clamp_cursor();
        let n = ids.len();
        self.add_notification(format!(
            "{} {n} issue{} (u to undo)",
            match status {
                GroupStatus::Resolved => "Resolved",
                GroupStatus::Ignored => "Ignored",
                _ => "Updated",
            },
            if n == 1 { "" } else { "s" }
        ));
        Some(update)
    }

    /// Returns whether the list must be refetched.
    pub fn bulk_update_completed(
        &mut self,
        change: GroupChange,
        result: Result<(), String>,
    ) -> bool {
        if let Err(e) = result {
            self.set_error(format!("Unable to update issues: {e}"));
        }
        matches!(change, GroupChange::Status(_))
    }

    /// Puts the last acted-upon records back and returns the revert to send.
    pub fn undo(&mut self) -> Option<BulkUpdate> {
        if self.undo_buffer.is_empty() {
            return None;
        }
        let records = std::mem::take(&mut self.undo_buffer);
        let ids: Vec<String> = records.iter().map(|g| g.id.clone()).collect();
        let projects: BTreeSet<String> = records.iter().map(|g| g.project.id.clone()).collect();
        // Ids still tracked are restored in place; ones dropped by a refetch go on top.
        self.stream.unshift(&mut self.store, records);
        self.undo = true;
        self.clamp_cursor();
        Some(BulkUpdate {
            ids,
            projects: projects.into_iter().collect(),
            change: GroupChange::Status(GroupStatus::Unresolved),
        })
    }

    pub fn undo_completed(&mut self, result: Result<(), String>) {
        if let Err(e) = result {
            self.set_error(format!("Unable to undo: {e}"));
        }
    }

    // --- Transient UI ---

    pub fn add_notification(&mut self, message: String) {
        self.notifications.push(Notification {
            message,
            timestamp: Instant::now(),
        });
    }

    pub fn prune_notifications(&mut self) {
        let now = Instant::now();
        self.notifications
            .retain(|n| now.duration_since(n.timestamp).as_secs() < NOTIFICATION_TTL_SECS);
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::group;
    use crate::model::{InboxDetails, QUERY_IGNORED, QUERY_UNRESOLVED};
    use pretty_assertions::assert_eq;

    const NEWEST_PAGE_LINK: &str =
        r#"<https://h/i/?cursor=p>; rel="previous"; results="false"; cursor="p""#;
    const FIRST_PAGE_LINKS: &str = concat!(
        r#"<https://h/i/?cursor=p>; rel="previous"; results="false"; cursor="p", "#,
        r#"<https://h/i/?cursor=n>; rel="next"; results="true"; cursor="n""#,
    );
    const LATER_PAGE_LINK: &str =
        r#"<https://h/i/?cursor=p2>; rel="previous"; results="true"; cursor="p2""#;

    fn config(workflow: ReviewWorkflow) -> ViewConfig {
        ViewConfig {
            org: "acme".to_string(),
            base_url: "https://sentry.example.com/".to_string(),
            review_workflow: workflow,
            version_string: String::new(),
        }
    }

    fn view_on(query: &str, workflow: ReviewWorkflow) -> IssueListView {
        let location = Location {
            query: Some(query.to_string()),
            ..Default::default()
        };
        IssueListView::new(config(workflow), PageFilters::default(), location, true)
    }

    fn inbox_group(id: &str) -> Group {
        let mut g = group(id);
        g.inbox = Some(InboxDetails {
            reason: Some(0),
            date_added: None,
        });
        g
    }

    fn response(groups: Vec<Group>, hits: &str) -> ListResponse {
        ListResponse {
            groups,
            hits: Some(hits.to_string()),
            ..Default::default()
        }
    }

    fn loaded(view: &mut IssueListView, groups: Vec<Group>, hits: &str) {
        let plan = view.begin_fetch(false);
        assert!(view.apply_list(plan.generation, response(groups, hits)));
    }

    fn displayed(view: &IssueListView) -> Vec<String> {
        view.items().iter().map(|g| g.id.clone()).collect()
    }

    #[test]
    fn begin_fetch_clears_rows_and_plans_uncached_counts() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        loaded(&mut view, vec![group("1")], "1");
        view.list_error = Some("old".to_string());

        let plan = view.begin_fetch(false);
        assert!(view.items().is_empty());
        assert!(view.list_error.is_none());
        assert!(view.issues_loading);
        assert_eq!(plan.generation, 2);
        assert_eq!(plan.count_queries, vec![QUERY_FOR_REVIEW, QUERY_IGNORED]);

        view.apply_counts(plan.generation, HashMap::from([(QUERY_IGNORED.to_string(), 3)]));
        let plan = view.begin_fetch(false);
        assert_eq!(plan.count_queries, vec![QUERY_FOR_REVIEW]);
        let plan = view.begin_fetch(true);
        assert_eq!(plan.count_queries, vec![QUERY_FOR_REVIEW, QUERY_IGNORED]);
    }

    #[test]
    fn headers_drive_totals_and_pagination() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        let plan = view.begin_fetch(false);
        view.apply_list(
            plan.generation,
            ListResponse {
                groups: vec![group("1")],
                hits: Some("42".to_string()),
                max_hits: Some("100".to_string()),
                link: None,
                direct_hit: false,
            },
        );
        assert_eq!(view.query_count, 42);
        assert_eq!(view.query_max_count, 100);
        assert!(!view.page_links.has_next());
        assert!(!view.page_links.has_previous());
        assert!(!view.next_page());
        assert!(!view.previous_page());
        assert_eq!(view.query_counts[QUERY_UNRESOLVED], QueryCount::exact(42));
        assert_eq!(view.page_summary(), "1 of 42");
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        let old = view.begin_fetch(false);
        let new = view.begin_fetch(false);
        assert!(!view.apply_list(old.generation, response(vec![group("1")], "1")));
        assert!(view.items().is_empty());
        view.apply_list_failed(old.generation, "boom".to_string());
        assert!(view.list_error.is_none());
        assert!(view.apply_list(new.generation, response(vec![group("2")], "1")));
        assert_eq!(displayed(&view), vec!["2"]);
    }

    #[test]
    fn list_failure_keeps_displayed_rows() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        loaded(&mut view, vec![group("1"), group("2")], "2");
        view.take_action(&["1".to_string()], GroupStatus::Resolved);
        let plan = view.begin_fetch(false);
        view.apply_list_failed(plan.generation, "500".to_string());
        assert_eq!(displayed(&view), vec!["2"]);
        assert_eq!(view.list_error.as_deref(), Some("500"));
        assert!(!view.issues_loading);
    }

    #[test]
    fn other_tab_counts_capped_current_exact() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        let plan = view.begin_fetch(false);
        view.apply_list(plan.generation, response(vec![], "250"));
        view.apply_counts(
            plan.generation,
            HashMap::from([
                (QUERY_IGNORED.to_string(), 250),
                (QUERY_UNRESOLVED.to_string(), 1),
            ]),
        );
        assert_eq!(view.query_counts[QUERY_IGNORED], QueryCount { count: 99, has_more: true });
        assert_eq!(view.query_counts[QUERY_UNRESOLVED], QueryCount::exact(250));

        view.apply_counts_failed(plan.generation);
        assert!(view.query_counts.is_empty());
    }

    #[test]
    fn stats_merge_into_store() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        let plan = view.begin_fetch(false);
        view.apply_list(plan.generation, response(vec![group("1")], "1"));
        view.apply_stats(
            plan.generation,
            &[GroupStats {
                id: "1".to_string(),
                count: Some("77".to_string()),
                user_count: Some(5),
                stats: None,
                first_seen: None,
                last_seen: None,
                lifetime: None,
                filtered: None,
            }],
        );
        assert_eq!(view.store.get("1").unwrap().count, "77");
    }

    #[test]
    fn mark_reviewed_on_review_tab_drops_inbox_count() {
        let mut view = view_on(QUERY_FOR_REVIEW, ReviewWorkflow::RemovalAction);
        loaded(
            &mut view,
            vec![inbox_group("1"), inbox_group("2"), group("3"), inbox_group("4")],
            "10",
        );
        assert_eq!(view.query_counts[QUERY_FOR_REVIEW].count, 10);
        let generation = view.generation;

        let ids = vec!["1".to_string(), "3".to_string(), "4".to_string()];
        let update = view.mark_reviewed(&ids).unwrap();
        assert_eq!(update.change, GroupChange::MarkReviewed);
        assert_eq!(update.projects, vec!["2"]);
        // Two of the three carried the inbox flag.
        assert_eq!(view.query_counts[QUERY_FOR_REVIEW].count, 8);
        assert_eq!(displayed(&view), vec!["2"]);
        assert!(!view.bulk_update_completed(GroupChange::MarkReviewed, Ok(())));
        assert_eq!(view.generation, generation);
    }

    #[test]
    fn mark_reviewed_elsewhere_only_clears_inbox() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::RemovalAction);
        loaded(&mut view, vec![inbox_group("1")], "1");
        view.mark_reviewed(&["1".to_string()]);
        assert_eq!(displayed(&view), vec!["1"]);
        assert!(!view.store.get("1").unwrap().is_for_review());
    }

    #[test]
    fn legacy_review_drops_ids_on_next_fetch() {
        let mut view = view_on(QUERY_FOR_REVIEW, ReviewWorkflow::Legacy);
        loaded(&mut view, vec![inbox_group("1"), inbox_group("2")], "2");
        view.mark_reviewed(&["1".to_string()]);
        assert_eq!(displayed(&view), vec!["1", "2"]);
        assert_eq!(view.reviewed_ids, vec!["1"]);

        // Server has not caught up yet and still returns issue 1.
        loaded(&mut view, vec![inbox_group("1"), inbox_group("2")], "2");
        assert_eq!(displayed(&view), vec!["2"]);
        assert!(view.reviewed_ids.is_empty());
    }

    #[test]
    fn take_action_then_undo_restores_records() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        loaded(&mut view, vec![group("1"), group("2"), group("3")], "3");

        let update = view
            .take_action(&["1".to_string(), "3".to_string()], GroupStatus::Resolved)
            .unwrap();
        assert_eq!(update.change, GroupChange::Status(GroupStatus::Resolved));
        assert_eq!(displayed(&view), vec!["2"]);
        assert!(view.action_taken);
        assert!(view.bulk_update_completed(update.change, Ok(())));

        let revert = view.undo().unwrap();
        assert_eq!(revert.ids, vec!["1", "3"]);
        assert_eq!(revert.change, GroupChange::Status(GroupStatus::Unresolved));
        assert_eq!(displayed(&view), vec!["1", "2", "3"]);
        assert!(view.undo);
        assert!(view.undo().is_none());

        // Mid-undo the rows stay up until the refetch lands.
        let plan = view.begin_fetch(false);
        assert_eq!(displayed(&view), vec!["1", "2", "3"]);
        view.apply_list(plan.generation, response(vec![group("3"), group("1")], "2"));
        assert_eq!(displayed(&view), vec!["3", "1"]);
        assert!(!view.undo);
    }

    #[test]
    fn failed_update_surfaces_error_and_still_refetches() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        let change = GroupChange::Status(GroupStatus::Ignored);
        assert!(view.bulk_update_completed(change, Err("403".to_string())));
        assert!(view.error_message().unwrap().contains("403"));
    }

    #[test]
    fn realtime_only_on_first_page() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        let plan = view.begin_fetch(false);
        view.apply_list(
            plan.generation,
            ListResponse {
                link: Some(FIRST_PAGE_LINKS.to_string()),
                ..Default::default()
            },
        );
        assert_eq!(view.realtime_endpoint().as_deref(), Some("https://h/i/?cursor=p"));
        view.toggle_realtime();
        assert_eq!(view.realtime_endpoint(), None);
        view.toggle_realtime();

        assert!(view.next_page());
        assert_eq!(view.location.cursor.as_deref(), Some("n"));
        let plan = view.begin_fetch(false);
        assert_eq!(plan.cursor.as_deref(), Some("n"));
        view.apply_list(
            plan.generation,
            ListResponse {
                link: Some(LATER_PAGE_LINK.to_string()),
                ..Default::default()
            },
        );
        assert!(!view.is_first_page());
        assert_eq!(view.realtime_endpoint(), None);
        assert_eq!(view.apply_realtime(plan.generation, vec![group("9")]), 0);
    }

    #[test]
    fn realtime_arrivals_prepend() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        loaded(&mut view, vec![group("1"), group("2")], "2");
        let generation = view.generation;
        assert_eq!(view.apply_realtime(generation, vec![group("0"), group("1")]), 1);
        assert_eq!(displayed(&view), vec!["0", "1", "2"]);
        assert_eq!(view.cursor, 1);
    }

    #[test]
    fn realtime_arrivals_counted_when_window_full() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        view.stream = StreamManager::new(3);
        loaded(&mut view, vec![group("1"), group("2"), group("3")], "3");
        view.move_cursor_down();
        let generation = view.generation;

        assert_eq!(view.apply_realtime(generation, vec![group("9")]), 1);
        assert_eq!(displayed(&view), vec!["9", "1", "2"]);
        // Still on issue 2.
        assert_eq!(view.cursor, 2);
        assert_eq!(view.notifications.last().unwrap().message, "1 new issue");
    }

    #[test]
    fn realtime_from_previous_query_dropped_after_tab_switch() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        let plan = view.begin_fetch(false);
        view.apply_list(
            plan.generation,
            ListResponse {
                groups: vec![group("unresolved-1")],
                link: Some(NEWEST_PAGE_LINK.to_string()),
                ..Default::default()
            },
        );
        let polled_under = view.generation;
        assert!(view.realtime_endpoint().is_some());

        assert!(view.cycle_tab());
        let plan = view.begin_fetch(false);
        // No cursor to poll until the new list lands.
        assert_eq!(view.realtime_endpoint(), None);
        assert_eq!(view.apply_realtime(polled_under, vec![group("unresolved-new")]), 0);

        view.apply_list(plan.generation, response(vec![group("ign-1")], "1"));
        assert_eq!(view.params.query, QUERY_IGNORED);
        assert_eq!(view.apply_realtime(polled_under, vec![group("unresolved-new")]), 0);
        assert_eq!(displayed(&view), vec!["ign-1"]);
    }

    #[test]
    fn undo_after_refetch_shows_restored_rows() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        loaded(&mut view, vec![group("1"), group("2"), group("3")], "3");
        let update = view.take_action(&["2".to_string()], GroupStatus::Resolved).unwrap();
        assert!(view.bulk_update_completed(update.change, Ok(())));

        // Post-action refetch no longer returns the resolved issue.
        loaded(&mut view, vec![group("1"), group("3")], "2");
        assert_eq!(displayed(&view), vec!["1", "3"]);

        let revert = view.undo().unwrap();
        assert_eq!(revert.ids, vec!["2"]);
        assert_eq!(displayed(&view), vec!["2", "1", "3"]);
        assert_eq!(view.stream.len(), view.store.len());
    }

    #[test]
    fn tab_and_sort_navigation_reset_cursor() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        view.location.cursor = Some("0:25:0".to_string());
        assert!(view.cycle_tab());
        assert_eq!(view.current_query(), QUERY_IGNORED);
        assert!(view.location.cursor.is_none());
        assert!(view.cycle_tab());
        assert_eq!(view.current_query(), QUERY_FOR_REVIEW);
        assert!(!view.select_tab(0));
        assert!(!view.select_tab(17));

        view.location.cursor = Some("x".to_string());
        view.cycle_sort();
        assert_eq!(view.current_sort(), Sort::New);
        assert!(view.location.cursor.is_none());
    }

    #[test]
    fn saved_search_supplies_query_until_url_overrides() {
        let mut view = IssueListView::new(
            config(ReviewWorkflow::default()),
            PageFilters::default(),
            Location::default(),
            false,
        );
        view.set_saved_searches(Ok(vec![SavedSearch {
            id: "7".to_string(),
            name: "Mine".to_string(),
            query: "assigned:me".to_string(),
            sort: Some("freq".to_string()),
            is_pinned: true,
            is_global: false,
        }]));
        assert!(view.saved_searches_loaded);
        let plan = view.begin_fetch(false);
        assert_eq!(plan.params.query, "assigned:me");
        assert_eq!(plan.params.sort, Sort::Freq);
        // Not a tab: every tab needs a count.
        assert_eq!(plan.count_queries.len(), TABS.len());
    }

    #[test]
    fn selection_targets_in_display_order() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        loaded(&mut view, vec![group("1"), group("2"), group("3")], "3");
        assert_eq!(view.target_ids(), vec!["1"]);
        view.move_cursor_down();
        view.move_cursor_down();
        view.toggle_select();
        view.move_cursor_up();
        view.move_cursor_up();
        view.toggle_select();
        assert_eq!(view.target_ids(), vec!["1", "3"]);
        view.toggle_select();
        assert_eq!(view.target_ids(), vec!["3"]);
    }

    #[test]
    fn cursor_clamped_when_rows_disappear() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        loaded(&mut view, vec![group("1"), group("2")], "2");
        view.move_cursor_down();
        view.take_action(&["2".to_string()], GroupStatus::Ignored);
        assert_eq!(view.cursor, 0);
    }

    #[test]
    fn redirect_builds_absolute_url() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        let plan = view.begin_fetch(false);
        let url = view.apply_redirect(plan.generation, "/organizations/acme/issues/1/");
        assert_eq!(
            url.as_deref(),
            Some("https://sentry.example.com/organizations/acme/issues/1/")
        );
        assert!(!view.issues_loading);
    }

    #[test]
    fn error_lifecycle() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        view.set_error("boom".to_string());
        assert_eq!(view.error_message(), Some("boom"));
        view.prune_error();
        assert!(view.error_message().is_some());
        view.clear_error();
        assert!(view.error_message().is_none());
    }

    #[test]
    fn spinner_wraps() {
        let mut view = view_on(QUERY_UNRESOLVED, ReviewWorkflow::default());
        for _ in 0..SPINNER_FRAME_COUNT {
            view.advance_spinner();
        }
        assert_eq!(view.spinner_frame, 0);
    }
}
