//! Batch Store - thread-safe sink for completed runs
//!
//! Runs finish in any order on the worker pool; each inserts its own entry
//! keyed by batch index. Reads return entries ordered by index.

use dashmap::DashMap;

use super::RunRecord;
use crate::experiment::ExperimentLog;

/// One finished run: its record and, on success or cancellation, its log.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    /// Lifecycle record.
    pub record: RunRecord,
    /// Experiment log, absent when the run failed.
    pub log: Option<ExperimentLog>,
}

/// Concurrent store of batch results.
///
/// Uses `DashMap` so workers insert without a global lock.
#[derive(Debug, Default)]
pub struct BatchStore {
    entries: DashMap<usize, BatchEntry>,
}

impl BatchStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the number of finished runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record a finished run. Replaces any entry with the same index.
    pub fn insert(&self, entry: BatchEntry) {
        self.entries.insert(entry.record.index(), entry);
    }

    /// Get a copy of the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<BatchEntry> {
        self.entries.get(&index).map(|e| e.value().clone())
    }

    /// Drain the store into entries ordered by batch index.
    #[must_use]
    pub fn into_sorted(self) -> Vec<BatchEntry> {
        let mut entries: Vec<BatchEntry> = self.entries.into_iter().map(|(_, e)| e).collect();
        entries.sort_by_key(|e| e.record.index());
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_default() {
        let store = BatchStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_into_sorted_orders_by_index() {
        let store = BatchStore::with_capacity(3);
        for index in [2, 0, 1] {
            store.insert(BatchEntry {
                record: RunRecord::new(index, 0),
                log: None,
            });
        }

        assert!(store.get(1).is_some());
        let entries = store.into_sorted();
        let indices: Vec<usize> = entries.iter().map(|e| e.record.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
