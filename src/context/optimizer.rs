//! Deterministic budget enforcement: duplicate suppression, then priority
//! eviction

use super::models::ItemType;
use super::store::ContextStore;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Outcome of one optimization pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizationReport {
    /// Ids removed by duplicate suppression, in store order
    pub duplicates_removed: Vec<String>,
    /// Ids removed by priority eviction, in removal order
    pub evicted: Vec<String>,
    pub freed_tokens: usize,
}

impl OptimizationReport {
    /// Whether the pass mutated the store at all
    pub fn changed(&self) -> bool {
        !self.duplicates_removed.is_empty() || !self.evicted.is_empty()
    }

    /// All removed ids, duplicates first
    pub fn removed_ids(&self) -> impl Iterator<Item = &str> {
        self.duplicates_removed
            .iter()
            .chain(self.evicted.iter())
            .map(String::as_str)
    }
}

/// Run one optimization pass over the store.
///
/// Phase 1 removes exact-content duplicates (image items never participate),
/// keeping the earliest-added item of each group. Phase 2, entered only if
/// usage still exceeds the limit, evicts items ordered by priority ascending
/// then insertion order ascending, re-checking the budget after each
/// removal. Items of the highest priority tier present are never evicted, so
/// a pass may leave usage above the limit when only that tier remains, and
/// never empties the store. Zero-cost items are skipped: removing them frees
/// nothing. Idempotent.
pub fn optimize(store: &mut ContextStore, limit: usize) -> OptimizationReport {
    let mut report = OptimizationReport::default();

    // Phase 1: duplicate suppression on exact canonical content
    let duplicate_ids = {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut duplicates = Vec::new();
        for item in store.items() {
            if item.item_type == ItemType::Image {
                continue;
            }
            if !seen.insert(item.content.as_ref()) {
                duplicates.push(item.id.clone());
            }
        }
        duplicates
    };

    for id in duplicate_ids {
        if let Some(removed) = store.remove(&id) {
            debug!("Removed duplicate context item: id={}", removed.id);
            report.freed_tokens += removed.token_cost;
            report.duplicates_removed.push(removed.id);
        }
    }

    // Phase 2: priority eviction, lowest tier first, oldest first within a
    // tier
    while store.usage() > limit {
        let candidate = {
            let Some(top_tier) = store.items().map(|item| item.priority).max() else {
                break;
            };
            store
                .items()
                .enumerate()
                .filter(|(_, item)| item.priority < top_tier && item.token_cost > 0)
                .min_by_key(|(index, item)| (item.priority, *index))
                .map(|(_, item)| item.id.clone())
        };

        let Some(id) = candidate else {
            // Only the highest tier present remains
            break;
        };

        if let Some(removed) = store.remove(&id) {
            debug!(
                "Evicted context item: id={}, priority={}, freed={}",
                removed.id,
                removed.priority.as_str(),
                removed.token_cost
            );
            report.freed_tokens += removed.token_cost;
            report.evicted.push(removed.id);
        }
    }

    report
}
