//! Context budget management
//!
//! A bounded working-set cache that holds curated context items under a
//! strict token budget, with deterministic eviction, duplicate suppression,
//! one-step undo, and two serialization views for downstream consumers.

pub mod history;
pub mod manager;
pub mod models;
pub mod optimizer;
pub mod serializer;
pub mod store;
pub mod token_estimator;

pub use history::{HistoryStack, HISTORY_CAPACITY};
pub use manager::{ContextManager, ContextManagerConfig, ContextSink, ToggleOutcome};
pub use models::{
    ContextItem, ContextPriority, ContextStats, ImageData, ItemContent, ItemType, NewContextItem,
    TokenUsage,
};
pub use optimizer::OptimizationReport;
pub use serializer::{VisionContext, VisionImage};
pub use token_estimator::{HeuristicEstimator, TokenEstimator, IMAGE_BASE_TOKENS};
