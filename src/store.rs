//! In-memory work item store.
//!
//! Populated once per run from a snapshot of the project tracker, then
//! enriched in place with reverse dependency edges. Read-only after that.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::item::{IssueRef, WorkItem};
use crate::privacy::{task_id_for_log, PrivacyFilter};

/// Work items keyed by reference key.
#[derive(Debug, Clone, Default)]
pub struct WorkItemStore {
    items: BTreeMap<String, WorkItem>,
    /// Keys in arrival order, used as the tie-break for display ordering.
    arrival: Vec<String>,
}

impl WorkItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = WorkItem>) -> Self {
        let mut store = Self::new();
        for item in items {
            store.insert(item);
        }
        store
    }

    /// Insert an item under its reference key, replacing any previous item
    /// with the same key.
    pub fn insert(&mut self, item: WorkItem) -> Option<WorkItem> {
        let key = item.reference_key();
        let previous = self.items.insert(key.clone(), item);
        if previous.is_none() {
            self.arrival.push(key);
        }
        previous
    }

    pub fn get(&self, key: &str) -> Option<&WorkItem> {
        self.items.get(key)
    }

    pub fn get_issue(&self, issue: &IssueRef) -> Option<&WorkItem> {
        self.items.get(&issue.reference_key())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WorkItem)> {
        self.items.iter().map(|(key, item)| (key.as_str(), item))
    }

    /// Items sorted by tracker display order, ties kept in arrival order.
    pub fn in_display_order(&self) -> Vec<(&str, &WorkItem)> {
        let mut ordered: Vec<(&str, &WorkItem)> = self
            .arrival
            .iter()
            .filter_map(|key| self.items.get(key).map(|item| (key.as_str(), item)))
            .collect();
        ordered.sort_by_key(|(_, item)| item.order);
        ordered
    }

    /// Map from scheduler task id to reference key.
    pub fn task_index(&self) -> HashMap<String, String> {
        self.items
            .iter()
            .map(|(key, item)| (item.task_id(), key.clone()))
            .collect()
    }

    /// Materialize `blocked_by` edges from `blocking` edges declared on the
    /// other side. Each edge is recorded once regardless of which side
    /// declared it; edges to items outside the store are left alone.
    ///
    /// Returns the number of edges added.
    pub fn build_reverse_dependencies(&mut self, privacy: Option<&PrivacyFilter>) -> usize {
        let mut reverse_edges: Vec<(String, IssueRef)> = Vec::new();
        for item in self.items.values() {
            let Some(blocker) = item.issue_ref() else {
                continue;
            };
            for blocked in &item.blocking {
                reverse_edges.push((blocked.reference_key(), blocker.clone()));
            }
        }

        let mut added = 0;
        for (blocked_key, blocker) in reverse_edges {
            let Some(blocked) = self.items.get_mut(&blocked_key) else {
                continue;
            };
            if blocked.blocked_by.contains(&blocker) {
                continue;
            }
            debug!(
                "Added reverse dependency: {} blocked by {} (from blocking field)",
                task_id_for_log(privacy, &blocked.task_id()),
                task_id_for_log(privacy, &blocker.task_id())
            );
            blocked.blocked_by.push(blocker);
            added += 1;
        }
        added
    }

    /// Load a tracker snapshot: a JSON array of work items.
    ///
    /// Entries that fail to parse or cannot be keyed are logged and left out
    /// of the store; only an unreadable snapshot fails the load.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::SnapshotNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|err| Error::FetchFailed(format!("{}: {err}", path.display())))?;
        Self::from_snapshot_str(&content)
    }

    pub fn from_snapshot_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|err| Error::FetchFailed(format!("snapshot is not valid JSON: {err}")))?;
        let serde_json::Value::Array(entries) = value else {
            return Err(Error::FetchFailed(
                "snapshot must be a JSON array of work items".to_string(),
            ));
        };

        let mut store = Self::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let item: WorkItem = match serde_json::from_value(entry) {
                Ok(item) => item,
                Err(err) => {
                    warn!("Skipping snapshot entry {index}: {err}");
                    continue;
                }
            };
            if let Err(reason) = item.validate() {
                warn!("Skipping snapshot entry {index}: {reason}");
                continue;
            }
            if store.insert(item).is_some() {
                warn!("Snapshot entry {index} replaces an earlier item with the same key");
            }
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(owner: &str, repo: &str, number: u64, order: i64) -> WorkItem {
        WorkItem {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number: Some(number),
            title: format!("{owner}/{repo}#{number}"),
            order,
            ..Default::default()
        }
    }

    #[test]
    fn display_order_is_stable_for_ties() {
        let store = WorkItemStore::from_items(vec![
            issue("o", "r", 3, 1),
            issue("o", "r", 1, 0),
            issue("o", "r", 2, 1),
        ]);
        let titles: Vec<&str> = store
            .in_display_order()
            .into_iter()
            .map(|(_, item)| item.title.as_str())
            .collect();
        assert_eq!(titles, vec!["o/r#1", "o/r#3", "o/r#2"]);
    }

    #[test]
    fn snapshot_skips_bad_entries() {
        let content = r#"[
            {"owner": "o", "repo": "r", "number": 1, "title": "ok"},
            {"owner": "o", "repo": "r", "title": "no number"},
            {"owner": "o", "repo": "r", "number": "seven"}
        ]"#;
        let store = WorkItemStore::from_snapshot_str(content).expect("load");
        assert_eq!(store.len(), 1);
        assert!(store.contains_key("github.com/o/r/issues/1"));
    }

    #[test]
    fn snapshot_must_be_array() {
        let err = WorkItemStore::from_snapshot_str("{}").expect_err("not an array");
        assert!(matches!(err, Error::FetchFailed(_)));
    }
}
