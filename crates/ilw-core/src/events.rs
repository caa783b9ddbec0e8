//! Terminal input thread and application event channel.
//!
//! [`EventHandler`] spawns an OS thread (not tokio task) because `crossterm::event::poll()`
//! blocks and would starve the async runtime. Drop signals shutdown without joining
//! to avoid deadlocking if `poll` blocks during panic unwinding.
//!
//! Network tasks (fetch cycles, poller, bulk updates) report back through the same
//! channel, so every state mutation happens on the main loop, one event at a time.

use crate::model::{Group, GroupStats, SavedSearch};
use crate::traits::{GroupChange, ListResponse};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    SavedSearchesLoaded(Result<Vec<SavedSearch>, String>),
    /// Fetch-cycle results carry the generation they were planned under; stale ones are dropped.
    ListResult {
        generation: u64,
        response: ListResponse,
    },
    ListFailed {
        generation: u64,
        error: String,
    },
    Redirect {
        generation: u64,
        path: String,
    },
    StatsResult {
        generation: u64,
        stats: Vec<GroupStats>,
    },
    StatsFailed {
        generation: u64,
        error: String,
    },
    CountsResult {
        generation: u64,
        counts: HashMap<String, u64>,
    },
    CountsFailed {
        generation: u64,
        error: String,
    },
    /// Tagged with the generation the poller was configured under.
    RealtimeResult {
        generation: u64,
        groups: Vec<Group>,
    },
    BulkUpdateCompleted {
        change: GroupChange,
        result: Result<(), String>,
    },
    UndoCompleted(Result<(), String>),
    /// Global toast, auto-dismisses after `ERROR_TTL_SECS`.
    Error(String),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let eventtx = tx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let thread = std::thread::spawn(move || {
            while !shutdown_flag.load(Ordering::Relaxed) {
                match event::poll(tick_rate) {
                    Err(e) => {
                        let _ = eventtx.send(AppEvent::Error(format!("Terminal poll error: {e}")));
                        break;
                    }
                    Ok(false) => {
                        if eventtx.send(AppEvent::Tick).is_err() {
                            break;
                        }
                        continue;
                    }
                    Ok(true) => {}
                }
                match event::read() {
                    Ok(CrosstermEvent::Key(key)) => {
                        if eventtx.send(AppEvent::Key(key)).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        let _ = eventtx.send(AppEvent::Error(format!("Terminal read error: {e}")));
                        break;
                    }
                    _ => {}
                }
            }
        });

        Self {
            rx,
            tx,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::error!("event thread panicked");
            }
        }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        // Signal only. Joining here could deadlock if `event::poll` is blocked
        // during panic unwinding; the thread exits on its next tick.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
