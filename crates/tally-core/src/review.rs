//! Review queue
//!
//! Categorized transactions the user should look at, most urgent first: high
//! priority before medium, then ascending confidence. A transaction id appears at
//! most once; enqueueing an id that is already present replaces the old entry.

use serde::{Deserialize, Serialize};

use crate::models::ReviewEntry;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueue {
    entries: Vec<ReviewEntry>,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry and restore the ordering
    pub fn enqueue(&mut self, entry: ReviewEntry) {
        self.insert_unsorted(entry);
        self.sort();
    }

    /// Add many entries, sorting once at the end
    pub fn extend(&mut self, entries: impl IntoIterator<Item = ReviewEntry>) {
        for entry in entries {
            self.insert_unsorted(entry);
        }
        self.sort();
    }

    fn insert_unsorted(&mut self, entry: ReviewEntry) {
        let id = entry.transaction.id;
        self.entries.retain(|e| e.transaction.id != id);
        self.entries.push(entry);
    }

    /// Remove the entry for a transaction id, if any
    pub fn remove(&mut self, transaction_id: i64) -> Option<ReviewEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.transaction.id == transaction_id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, transaction_id: i64) -> Option<&ReviewEntry> {
        self.entries
            .iter()
            .find(|e| e.transaction.id == transaction_id)
    }

    pub fn entries(&self) -> &[ReviewEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // Stable, so equal (priority, confidence) keep arrival order.
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then(
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });
    }
}
