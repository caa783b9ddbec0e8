//! Group record store and the ordered stream of identifiers displayed over it.
//!
//! [`GroupStore`] is the single source of truth for group records. It is owned by the
//! view and lent out by `&mut` to [`StreamManager`], which only tracks identifiers and
//! their order. Removing a record from the store hides it from the stream without
//! forgetting its position, so an undo that re-adds the record puts it back in place.

use crate::model::{Group, GroupStats};
use std::collections::{HashMap, HashSet};

/// Bounds memory during long realtime sessions.
pub const DEFAULT_STREAM_LIMIT: usize = 100;

#[derive(Debug, Default)]
pub struct GroupStore {
    items: HashMap<String, Group>,
}

impl GroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes records by id.
    pub fn add(&mut self, groups: Vec<Group>) {
        for group in groups {
            self.items.insert(group.id.clone(), group);
        }
    }

    pub fn remove(&mut self, ids: &[String]) {
        for id in ids {
            self.items.remove(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Group> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.items.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merges per-group statistics into existing records. Stats for unknown ids are dropped.
    pub fn merge_stats(&mut self, stats: &[GroupStats]) {
        for entry in stats {
            if let Some(group) = self.items.get_mut(&entry.id) {
                group.merge_stats(entry);
            }
        }
    }
}

#[derive(Debug)]
pub struct StreamManager {
    ids: Vec<String>,
    limit: usize,
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new(DEFAULT_STREAM_LIMIT)
    }
}

impl StreamManager {
    pub fn new(limit: usize) -> Self {
        Self {
            ids: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn reset(&mut self, store: &mut GroupStore) {
        self.ids.clear();
        store.reset();
    }

    /// Appends records not already tracked. Tracked ones are refreshed in place.
    /// Over the limit, the oldest (head) identifiers are evicted.
    pub fn push(&mut self, store: &mut GroupStore, groups: Vec<Group>) {
        let new_ids = self.fresh_ids(&groups);
        store.add(groups);
        self.ids.extend(new_ids);
        if self.ids.len() > self.limit {
            let excess = self.ids.len() - self.limit;
            let evicted: Vec<String> = self.ids.drain(..excess).collect();
            store.remove(&evicted);
        }
    }

    /// Prepends records not already tracked (realtime arrivals). Over the limit, the
    /// tail is evicted. Returns how many identifiers were newly tracked.
    pub fn unshift(&mut self, store: &mut GroupStore, groups: Vec<Group>) -> usize {
        let mut new_ids = self.fresh_ids(&groups);
        let added = new_ids.len().min(self.limit);
        store.add(groups);
        new_ids.append(&mut self.ids);
        self.ids = new_ids;
        if self.ids.len() > self.limit {
            let evicted = self.ids.split_off(self.limit);
            store.remove(&evicted);
        }
        added
    }

    /// Ordered records that are still present in the store.
    pub fn get_all_items<'a>(&self, store: &'a GroupStore) -> Vec<&'a Group> {
        self.ids.iter().filter_map(|id| store.get(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn fresh_ids(&self, groups: &[Group]) -> Vec<String> {
        let mut seen: HashSet<&str> = self.ids.iter().map(String::as_str).collect();
        let mut fresh = Vec::new();
        for group in groups {
            if seen.insert(group.id.as_str()) {
                fresh.push(group.id.clone());
            }
        }
        fresh
    }
}
