//! Public manager API composing the store, history stack, optimizer,
//! estimator, and serializers
//!
//! The manager is the only surface external collaborators touch. Every
//! mutation captures a pre-mutation history snapshot, applies the change,
//! notifies the membership sink, then (when enabled) runs auto-optimization.
//! The mutation surface never panics and never returns errors; refusals are
//! boolean returns with state left unchanged.

use super::history::HistoryStack;
use super::models::{
    ContextItem, ContextPriority, ContextStats, ItemType, NewContextItem, TokenUsage,
};
use super::optimizer::{self, OptimizationReport};
use super::serializer::{self, VisionContext};
use super::store::ContextStore;
use super::token_estimator::{HeuristicEstimator, TokenEstimator};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Membership sink notified best-effort after every successful
/// add/remove/clear/undo, so an external owner can mirror "is this item in
/// context" without the manager depending on its storage model.
///
/// Failures are caught and discarded at the call site; a misbehaving
/// consumer cannot corrupt manager state. Implementations must not panic.
pub trait ContextSink: Send + Sync {
    fn item_membership_changed(&self, id: &str, in_context: bool) -> anyhow::Result<()>;
}

/// Manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextManagerConfig {
    /// Maximum total estimated token cost the working set may hold
    pub max_tokens: usize,
    /// Run the optimizer automatically after any add that exceeds the limit
    pub auto_optimize: bool,
}

impl Default for ContextManagerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 100_000,
            auto_optimize: true,
        }
    }
}

impl ContextManagerConfig {
    /// Validate that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(crate::error::ContextError::InvalidLimit(self.max_tokens));
        }
        Ok(())
    }
}

/// Result of a toggle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Context budget manager
///
/// Explicitly constructed and owned; hold one instance per independent
/// budget. All operations are synchronous and CPU-bound with no internal
/// locking: wrap the instance in a mutex or single-writer channel if it must
/// be shared across threads.
pub struct ContextManager {
    config: ContextManagerConfig,
    store: ContextStore,
    history: HistoryStack,
    estimator: Box<dyn TokenEstimator>,
    sink: Option<Box<dyn ContextSink>>,
}

impl ContextManager {
    /// Create a manager with the default heuristic estimator and no sink
    pub fn new(config: ContextManagerConfig) -> Result<Self> {
        Self::build(config, Box::new(HeuristicEstimator), None)
    }

    /// Create a manager that notifies the given membership sink
    pub fn with_sink(config: ContextManagerConfig, sink: Box<dyn ContextSink>) -> Result<Self> {
        Self::build(config, Box::new(HeuristicEstimator), Some(sink))
    }

    /// Create a manager with a custom estimation strategy
    pub fn with_estimator(
        config: ContextManagerConfig,
        estimator: Box<dyn TokenEstimator>,
    ) -> Result<Self> {
        Self::build(config, estimator, None)
    }

    fn build(
        config: ContextManagerConfig,
        estimator: Box<dyn TokenEstimator>,
        sink: Option<Box<dyn ContextSink>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: ContextStore::new(),
            history: HistoryStack::new(),
            estimator,
            sink,
        })
    }

    /// Add an item to the working set.
    ///
    /// Returns false without mutating (and without polluting history) when
    /// the id is already present. A successful add computes the token cost
    /// once, notifies the sink, and may immediately trigger auto-optimization
    /// when the limit is exceeded; optimizer removals fold into the same
    /// undo step.
    pub fn add_to_context(&mut self, item: NewContextItem, priority: ContextPriority) -> bool {
        if self.store.contains(&item.id) {
            debug!("Item already in context, skipping add: {}", item.id);
            return false;
        }

        let content: Arc<str> = Arc::from(item.content.canonical_text());
        // Attachments are advisory: drop anything inconsistent with the
        // declared type rather than trusting it downstream.
        let image_data = match (item.item_type, item.image_data) {
            (ItemType::Image, Some(image)) if image.is_plausible() => Some(image),
            (_, Some(_)) => {
                warn!("Dropping inconsistent image attachment on item {}", item.id);
                None
            }
            (_, None) => None,
        };
        let token_cost = self.estimator.estimate(&content, item.item_type);

        self.history.push(self.store.snapshot());
        let id = item.id.clone();
        self.store.insert(ContextItem {
            id: item.id,
            title: item.title,
            item_type: item.item_type,
            content,
            image_data,
            priority,
            token_cost,
            added_at: Utc::now(),
        });
        debug!("Added context item: id={}, tokens={}", id, token_cost);
        self.notify_sink(&id, true);

        if self.config.auto_optimize && self.store.usage() > self.config.max_tokens {
            let report = optimizer::optimize(&mut self.store, self.config.max_tokens);
            if report.changed() {
                for removed in report.removed_ids() {
                    self.notify_sink(removed, false);
                }
                info!(
                    "Context auto-optimization: removed={}, freed_tokens={}",
                    report.duplicates_removed.len() + report.evicted.len(),
                    report.freed_tokens
                );
            }
        }

        true
    }

    /// Remove an item by id. Returns false (no mutation, no history entry)
    /// when the id is not present.
    pub fn remove_from_context(&mut self, id: &str) -> bool {
        if !self.store.contains(id) {
            debug!("Item not in context, skipping removal: {}", id);
            return false;
        }

        self.history.push(self.store.snapshot());
        if let Some(removed) = self.store.remove(id) {
            info!(
                "Removed from context: id={}, freed_tokens={}",
                removed.id, removed.token_cost
            );
            self.notify_sink(id, false);
        }
        true
    }

    /// Add the item if absent, remove it if present
    pub fn toggle_item_context(
        &mut self,
        item: NewContextItem,
        priority: ContextPriority,
    ) -> ToggleOutcome {
        if self.store.contains(&item.id) {
            self.remove_from_context(&item.id);
            ToggleOutcome::Removed
        } else {
            self.add_to_context(item, priority);
            ToggleOutcome::Added
        }
    }

    /// Remove every item.
    ///
    /// Guardrail: with more than 3 resident items the call is refused unless
    /// `force` is set, so a large working set cannot be destroyed by
    /// accident.
    pub fn clear_all_context(&mut self, force: bool) -> bool {
        if !force && self.store.len() > 3 {
            warn!(
                "Large context clear blocked ({} items); pass force to confirm",
                self.store.len()
            );
            return false;
        }
        if self.store.is_empty() {
            return true;
        }

        self.history.push(self.store.snapshot());
        let removed = self.store.clear();
        let freed: usize = removed.iter().map(|item| item.token_cost).sum();
        info!(
            "Context cleared: {} items, {} tokens freed",
            removed.len(),
            freed
        );
        for item in &removed {
            self.notify_sink(&item.id, false);
        }
        true
    }

    /// Restore the most recent history snapshot verbatim.
    ///
    /// The sink is re-notified for every membership delta between the
    /// discarded state and the restored one. Returns false with no effect
    /// when the history stack is empty.
    pub fn undo_last_context_change(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            debug!("Undo requested with empty history");
            return false;
        };

        let current_ids: HashSet<String> =
            self.store.items().map(|item| item.id.clone()).collect();
        let restored_ids: HashSet<String> =
            snapshot.iter().map(|item| item.id.clone()).collect();

        self.store.replace_all(snapshot);
        info!("Context change undone: {} items restored", self.store.len());

        for id in current_ids.difference(&restored_ids) {
            self.notify_sink(id, false);
        }
        for id in restored_ids.difference(&current_ids) {
            self.notify_sink(id, true);
        }

        true
    }

    /// Run an optimization pass on demand.
    ///
    /// A history snapshot is pushed only when the pass actually changed the
    /// store, so idempotent re-runs never pollute history.
    pub fn optimize_context(&mut self) -> OptimizationReport {
        let snapshot = self.store.snapshot();
        let report = optimizer::optimize(&mut self.store, self.config.max_tokens);

        if report.changed() {
            self.history.push(snapshot);
            for id in report.removed_ids() {
                self.notify_sink(id, false);
            }
            info!(
                "Context optimized: {} duplicates removed, {} evicted, {} tokens freed",
                report.duplicates_removed.len(),
                report.evicted.len(),
                report.freed_tokens
            );
        }

        report
    }

    /// Textual summary for prompt assembly; empty string for an empty set
    pub fn get_context_summary(&self) -> String {
        serializer::render_summary(self.store.items())
    }

    /// Vision view for a multimodal consumer
    pub fn get_vision_context(&self) -> VisionContext {
        serializer::render_vision(self.store.items())
    }

    pub fn is_in_context(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    /// Current token accounting against the configured limit
    pub fn token_usage(&self) -> TokenUsage {
        TokenUsage::measure(self.store.usage(), self.config.max_tokens)
    }

    /// Aggregate statistics over the working set
    pub fn get_context_stats(&self) -> ContextStats {
        let mut type_distribution: HashMap<ItemType, usize> = HashMap::new();
        let mut priority_distribution: HashMap<ContextPriority, usize> = HashMap::new();
        let mut oldest_item: Option<DateTime<Utc>> = None;

        for item in self.store.items() {
            *type_distribution.entry(item.item_type).or_insert(0) += 1;
            *priority_distribution.entry(item.priority).or_insert(0) += 1;
            oldest_item = Some(oldest_item.map_or(item.added_at, |o| o.min(item.added_at)));
        }

        let total_items = self.store.len();
        let average_tokens_per_item = if total_items == 0 {
            0
        } else {
            (self.store.usage() as f64 / total_items as f64).round() as usize
        };

        ContextStats {
            total_items,
            type_distribution,
            priority_distribution,
            average_tokens_per_item,
            oldest_item,
        }
    }

    /// Estimate the token cost of content without adding it
    pub fn estimate_tokens(&self, content: &str, item_type: ItemType) -> usize {
        self.estimator.estimate(content, item_type)
    }

    /// Resident items in insertion order
    pub fn items(&self) -> impl Iterator<Item = &ContextItem> {
        self.store.items()
    }

    pub fn auto_optimize(&self) -> bool {
        self.config.auto_optimize
    }

    pub fn set_auto_optimize(&mut self, enabled: bool) {
        self.config.auto_optimize = enabled;
    }

    /// Number of undo steps currently available
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn config(&self) -> &ContextManagerConfig {
        &self.config
    }

    /// Invoke the sink, swallowing any consumer failure
    fn notify_sink(&self, id: &str, in_context: bool) {
        if let Some(sink) = &self.sink {
            if let Err(err) = sink.item_membership_changed(id, in_context) {
                warn!("Context sink rejected membership update for {}: {}", id, err);
            }
        }
    }
}
