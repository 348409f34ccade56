//! Bounded working-set context cache under a strict token budget
//!
//! Holds a curated collection of context items (content fragments nominated
//! by a user or an agent) used to assemble input for a downstream consumer
//! such as an LLM prompt. The manager accounts for, ranks, evicts, and
//! serializes items handed to it; it performs no I/O, no persistence, and no
//! item creation of its own.
//!
//! # Example
//!
//! ```
//! use context_budget::{
//!     ContextManager, ContextManagerConfig, ContextPriority, ItemType, NewContextItem,
//! };
//!
//! let mut manager = ContextManager::new(ContextManagerConfig::default()).unwrap();
//! manager.add_to_context(
//!     NewContextItem::new("note-1", "Meeting notes", ItemType::Document, "Ship on Friday"),
//!     ContextPriority::High,
//! );
//!
//! let prompt_block = manager.get_context_summary();
//! assert!(prompt_block.contains("Meeting notes"));
//! ```

pub mod context;
pub mod error;

pub use context::{
    ContextItem, ContextManager, ContextManagerConfig, ContextPriority, ContextSink, ContextStats,
    HeuristicEstimator, HistoryStack, ImageData, ItemContent, ItemType, NewContextItem,
    OptimizationReport, TokenEstimator, TokenUsage, ToggleOutcome, VisionContext, VisionImage,
    HISTORY_CAPACITY, IMAGE_BASE_TOKENS,
};
pub use error::{ContextError, Result};
