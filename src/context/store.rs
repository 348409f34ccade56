//! Keyed, insertion-ordered storage for the context working set

use super::models::ContextItem;
use indexmap::IndexMap;

/// Keyed collection of context items
///
/// Preserves insertion order (stable summary rendering, deterministic
/// eviction tie-breaking) while keeping membership lookup O(1). The store is
/// a plain collection: history capture, sink notification, and token
/// estimation are orchestrated by the manager.
#[derive(Debug, Default)]
pub struct ContextStore {
    items: IndexMap<String, ContextItem>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item at the end of the ordering. Returns false without
    /// mutating when the id is already present.
    pub fn insert(&mut self, item: ContextItem) -> bool {
        if self.items.contains_key(&item.id) {
            return false;
        }
        self.items.insert(item.id.clone(), item);
        true
    }

    /// Remove an item by id, preserving the relative order of the rest
    pub fn remove(&mut self, id: &str) -> Option<ContextItem> {
        self.items.shift_remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ContextItem> {
        self.items.get(id)
    }

    /// Insertion index of an item, the eviction tie-breaker among equal
    /// priorities
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current usage: sum of the token costs of all resident items
    pub fn usage(&self) -> usize {
        self.items.values().map(|item| item.token_cost).sum()
    }

    /// Items in insertion order
    pub fn items(&self) -> impl Iterator<Item = &ContextItem> {
        self.items.values()
    }

    /// Clone the current ordered item list, e.g. for a history snapshot.
    /// Cheap: item content is shared behind `Arc<str>`.
    pub fn snapshot(&self) -> Vec<ContextItem> {
        self.items.values().cloned().collect()
    }

    /// Replace the entire contents with a previously captured item list
    pub fn replace_all(&mut self, items: Vec<ContextItem>) {
        self.items = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
    }

    /// Remove everything, returning the removed items in order
    pub fn clear(&mut self) -> Vec<ContextItem> {
        self.items.drain(..).map(|(_, item)| item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::models::{ContextPriority, ItemType};
    use chrono::Utc;

    fn item(id: &str, cost: usize) -> ContextItem {
        ContextItem {
            id: id.to_string(),
            title: id.to_uppercase(),
            item_type: ItemType::Document,
            content: "content".into(),
            image_data: None,
            priority: ContextPriority::Medium,
            token_cost: cost,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut store = ContextStore::new();
        assert!(store.insert(item("a", 10)));
        assert!(!store.insert(item("a", 20)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.usage(), 10);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = ContextStore::new();
        store.insert(item("a", 1));
        store.insert(item("b", 1));
        store.insert(item("c", 1));
        store.remove("b");
        let ids: Vec<&str> = store.items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(store.position("c"), Some(1));
    }

    #[test]
    fn test_remove_absent_is_none() {
        let mut store = ContextStore::new();
        assert!(store.remove("missing").is_none());
    }

    #[test]
    fn test_usage_sums_token_costs() {
        let mut store = ContextStore::new();
        store.insert(item("a", 10));
        store.insert(item("b", 25));
        assert_eq!(store.usage(), 35);
    }

    #[test]
    fn test_replace_all_restores_snapshot() {
        let mut store = ContextStore::new();
        store.insert(item("a", 1));
        store.insert(item("b", 2));
        let snapshot = store.snapshot();

        store.clear();
        store.insert(item("c", 3));

        store.replace_all(snapshot);
        let ids: Vec<&str> = store.items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.usage(), 3);
    }

    #[test]
    fn test_clear_returns_removed_items() {
        let mut store = ContextStore::new();
        store.insert(item("a", 1));
        store.insert(item("b", 2));
        let removed = store.clear();
        assert_eq!(removed.len(), 2);
        assert!(store.is_empty());
    }
}
