//! Bounded snapshot stack for one-step undo

use super::models::ContextItem;
use std::collections::VecDeque;

/// Maximum number of retained snapshots; the oldest is dropped on overflow.
pub const HISTORY_CAPACITY: usize = 10;

/// Bounded stack of pre-mutation item lists
///
/// Each entry is the complete ordered working set as it stood before the
/// mutation that captured it. Snapshots are cheap clones: item content is
/// shared behind `Arc<str>`.
#[derive(Debug, Default)]
pub struct HistoryStack {
    snapshots: VecDeque<Vec<ContextItem>>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a snapshot, evicting the oldest entry once the stack is full
    pub fn push(&mut self, snapshot: Vec<ContextItem>) {
        if self.snapshots.len() == HISTORY_CAPACITY {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Pop the most recent snapshot
    pub fn pop(&mut self) -> Option<Vec<ContextItem>> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::models::{ContextPriority, ItemType};
    use chrono::Utc;

    fn snapshot_of(id: &str) -> Vec<ContextItem> {
        vec![ContextItem {
            id: id.to_string(),
            title: id.to_string(),
            item_type: ItemType::Document,
            content: "content".into(),
            image_data: None,
            priority: ContextPriority::Medium,
            token_cost: 2,
            added_at: Utc::now(),
        }]
    }

    #[test]
    fn test_pop_returns_most_recent() {
        let mut history = HistoryStack::new();
        history.push(snapshot_of("first"));
        history.push(snapshot_of("second"));

        let restored = history.pop().unwrap();
        assert_eq!(restored[0].id, "second");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_pop_on_empty_is_none() {
        let mut history = HistoryStack::new();
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = HistoryStack::new();
        for i in 0..15 {
            history.push(snapshot_of(&format!("snap-{i}")));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);

        // Most recent first on the way back out
        let top = history.pop().unwrap();
        assert_eq!(top[0].id, "snap-14");

        // Drain the rest; the oldest surviving snapshot is snap-5
        let mut last = top;
        while let Some(snapshot) = history.pop() {
            last = snapshot;
        }
        assert_eq!(last[0].id, "snap-5");
    }
}
