//! Realtime cursor poller.
//!
//! Polls the `previous` cursor of the first page for issues that arrived after the page
//! was loaded. Each successful poll advances the endpoint to the response's own
//! `previous` link, so the window keeps moving forward. A single background task does
//! the sleeping and requesting, which bounds in-flight requests to one.
//!
//! Results are tagged with the fetch generation the endpoint was configured under, so
//! arrivals for a list that has since been replaced can be dropped.
//!
//! On consecutive failures, exponential backoff (`base × 2^failures`) is applied up
//! to `MAX_BACKOFF_SECS` (5 minutes). The backoff resets to the base interval on the
//! next successful poll.

use crate::events::AppEvent;
use crate::links::parse_link_header;
use crate::traits::IssueApi;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

/// 5 minutes: the longest gap between automatic retries.
const MAX_BACKOFF_SECS: u64 = 300;

/// Compute backoff delay: `min(base_interval * 2^failures, MAX_BACKOFF_SECS)`.
pub fn backoff_delay(base_interval: u64, failures: u32) -> u64 {
    let multiplier = 1u64.checked_shl(failures).unwrap_or(u64::MAX);
    base_interval
        .saturating_mul(multiplier)
        .clamp(1, MAX_BACKOFF_SECS)
}

pub struct CursorPoller {
    api: Arc<dyn IssueApi>,
    tx: mpsc::UnboundedSender<AppEvent>,
    interval: u64,
    endpoint: Arc<Mutex<Option<String>>>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl CursorPoller {
    pub fn new(
        api: Arc<dyn IssueApi>,
        tx: mpsc::UnboundedSender<AppEvent>,
        interval: u64,
    ) -> Self {
        Self {
            api,
            tx,
            interval: interval.max(1),
            endpoint: Arc::new(Mutex::new(None)),
            generation: 0,
            task: None,
        }
    }

    /// Points the poller at a new cursor URL belonging to fetch `generation`. A running
    /// poller restarts on it.
    pub fn configure(&mut self, endpoint: String, generation: u64) {
        *self.endpoint.lock().unwrap_or_else(PoisonError::into_inner) = Some(endpoint);
        self.generation = generation;
        if self.is_enabled() {
            self.disable();
            self.enable();
        }
    }

    /// Starts polling. No-op when already running or never configured.
    pub fn enable(&mut self) {
        if self.is_enabled() || self.endpoint().is_none() {
            return;
        }
        tracing::debug!(
            interval = self.interval,
            generation = self.generation,
            "realtime poller enabled"
        );
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let endpoint = Arc::clone(&self.endpoint);
        let interval = self.interval;
        let generation = self.generation;
        self.task = Some(tokio::spawn(poll_loop(api, tx, endpoint, interval, generation)));
    }

    /// Cancels the pending timer and any in-flight request.
    pub fn disable(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("realtime poller disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn endpoint(&self) -> Option<String> {
        self.endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for CursorPoller {
    fn drop(&mut self) {
        self.disable();
    }
}

enum PollOutcome {
    Success,
    Failure,
    ChannelClosed,
}

async fn poll_loop(
    api: Arc<dyn IssueApi>,
    tx: mpsc::UnboundedSender<AppEvent>,
    endpoint: Arc<Mutex<Option<String>>>,
    interval: u64,
    generation: u64,
) {
    let mut failures: u32 = 0;
    loop {
        let delay = if failures > 0 {
            backoff_delay(interval, failures)
        } else {
            interval
        };
        time::sleep(time::Duration::from_secs(delay)).await;

        let current = endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(current) = current else {
            return;
        };

        match poll_once(api.as_ref(), &tx, &current, &endpoint, generation).await {
            PollOutcome::Success => failures = 0,
            PollOutcome::Failure => {
                failures = failures.saturating_add(1);
                tracing::warn!(
                    "realtime poll failed, retrying in {}s",
                    backoff_delay(interval, failures)
                );
            }
            PollOutcome::ChannelClosed => return,
        }
    }
}

async fn poll_once(
    api: &dyn IssueApi,
    tx: &mpsc::UnboundedSender<AppEvent>,
    current: &str,
    endpoint: &Mutex<Option<String>>,
    generation: u64,
) -> PollOutcome {
    match api.poll(current).await {
        Ok(response) => {
            let links = parse_link_header(response.link.as_deref());
            if let Some(previous) = links.previous {
                *endpoint.lock().unwrap_or_else(PoisonError::into_inner) = Some(previous.href);
            }
            if response.groups.is_empty() {
                return PollOutcome::Success;
            }
            tracing::debug!(count = response.groups.len(), "realtime poll delivered issues");
            if tx
                .send(AppEvent::RealtimeResult {
                    generation,
                    groups: response.groups,
                })
                .is_err()
            {
                return PollOutcome::ChannelClosed;
            }
            PollOutcome::Success
        }
        Err(e) => {
            tracing::debug!("realtime poll error: {e}");
            PollOutcome::Failure
        }
    }
}
