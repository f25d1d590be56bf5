//! Per-task conversation state, the single source of truth for the
//! idempotency decisions the orchestrator makes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use inkwire_core::current_unix_timestamp_ms;
use inkwire_dotcms::CanonicalContent;

pub const DEFAULT_TASK_STATE_CAPACITY: usize = 10_000;
pub const DEFAULT_TASK_STATE_TTL_MS: u64 = 30 * 24 * 60 * 60 * 1_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskState {
    pub created_seen: bool,
    pub skeleton_created: bool,
    pub skeleton_created_at: Option<String>,
    pub last_update_at: Option<String>,
    pub snapshot: Option<CanonicalContent>,
    pub last_snapshot_hash: Option<String>,
    pub last_no_changes_at: Option<String>,
    pub last_touched_unix_ms: u64,
}

pub trait TaskStateStore: Send + Sync {
    /// Current state for `task_id`, or the default record when none exists.
    fn get(&self, task_id: &str) -> TaskState;

    fn put(&self, task_id: &str, state: TaskState);

    /// Drops records idle for longer than the store's TTL; returns how many.
    fn evict(&self, now_unix_ms: u64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct StoreRecords {
    entries: HashMap<String, (u64, TaskState)>,
    next_sequence: u64,
}

impl StoreRecords {
    fn retain_fresh(&mut self, now_unix_ms: u64, ttl_ms: u64) {
        self.entries.retain(|_, (_, state)| {
            now_unix_ms.saturating_sub(state.last_touched_unix_ms) <= ttl_ms
        });
    }

    /// Drops the least recently written fifth once over `capacity`.
    fn evict_least_recent(&mut self, capacity: usize) {
        if self.entries.len() <= capacity {
            return;
        }
        let batch = (capacity / 5).max(1);
        let mut by_age = self
            .entries
            .iter()
            .map(|(task_id, (sequence, state))| {
                (state.last_touched_unix_ms, *sequence, task_id.clone())
            })
            .collect::<Vec<_>>();
        by_age.sort();
        for (_, _, task_id) in by_age.into_iter().take(batch) {
            self.entries.remove(&task_id);
        }
    }
}

#[derive(Debug)]
pub struct InMemoryTaskStateStore {
    capacity: usize,
    ttl_ms: u64,
    records: Mutex<StoreRecords>,
}

impl Default for InMemoryTaskStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_STATE_CAPACITY, DEFAULT_TASK_STATE_TTL_MS)
    }
}

impl InMemoryTaskStateStore {
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl_ms: ttl_ms.max(1),
            records: Mutex::new(StoreRecords::default()),
        }
    }

    fn records(&self) -> MutexGuard<'_, StoreRecords> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TaskStateStore for InMemoryTaskStateStore {
    fn get(&self, task_id: &str) -> TaskState {
        self.records()
            .entries
            .get(task_id)
            .map(|(_, state)| state.clone())
            .unwrap_or_default()
    }

    fn put(&self, task_id: &str, mut state: TaskState) {
        let now = current_unix_timestamp_ms();
        state.last_touched_unix_ms = now;
        let mut records = self.records();
        let sequence = records.next_sequence;
        records.next_sequence = sequence.saturating_add(1);
        records
            .entries
            .insert(task_id.to_string(), (sequence, state));
        if records.entries.len() > self.capacity {
            records.retain_fresh(now, self.ttl_ms);
            records.evict_least_recent(self.capacity);
        }
    }

    fn evict(&self, now_unix_ms: u64) -> usize {
        let mut records = self.records();
        let before = records.entries.len();
        records.retain_fresh(now_unix_ms, self.ttl_ms);
        before - records.entries.len()
    }

    fn len(&self) -> usize {
        self.records().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_missing_task_reads_as_default_state() {
        let store = InMemoryTaskStateStore::default();
        let state = store.get("IEAT1");
        assert!(!state.skeleton_created);
        assert!(state.snapshot.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn functional_put_then_get_round_trips_and_touches() {
        let store = InMemoryTaskStateStore::default();
        let state = TaskState {
            skeleton_created: true,
            skeleton_created_at: Some("2025-06-01T10:00:00.000Z".to_string()),
            ..TaskState::default()
        };
        store.put("IEAT1", state);
        let stored = store.get("IEAT1");
        assert!(stored.skeleton_created);
        assert!(stored.last_touched_unix_ms > 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn functional_evict_drops_records_idle_past_ttl() {
        let store = InMemoryTaskStateStore::new(10, 1_000);
        store.put("IEAT1", TaskState::default());
        let touched = store.get("IEAT1").last_touched_unix_ms;
        assert_eq!(store.evict(touched + 1_000), 0);
        assert_eq!(store.evict(touched + 1_001), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn regression_store_stays_bounded_past_capacity() {
        let store = InMemoryTaskStateStore::new(5, DEFAULT_TASK_STATE_TTL_MS);
        for index in 0..20 {
            store.put(&format!("IEAT{index}"), TaskState::default());
        }
        assert!(store.len() <= 5);
        assert!(store.get("IEAT19").last_touched_unix_ms > 0);
        assert_eq!(store.get("IEAT0").last_touched_unix_ms, 0);
    }
}
