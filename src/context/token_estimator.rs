//! Heuristic token estimation with per-type cost multipliers

use super::models::ItemType;

/// Fixed vision-token allowance charged for every image item, on top of any
/// caption text cost.
pub const IMAGE_BASE_TOKENS: usize = 85;

/// Coarse character-to-token ratio for the base cost.
const CHARS_PER_TOKEN: usize = 4;

/// Token estimator trait for different estimation strategies
pub trait TokenEstimator: Send + Sync {
    /// Estimate the token cost of content with the given semantic type.
    /// Never fails; degenerate content yields cost 0.
    fn estimate(&self, content: &str, item_type: ItemType) -> usize;
}

/// Per-type cost multiplier applied on top of the base character heuristic
///
/// Code packs more information per character than prose; table delimiters
/// inflate length without adding information. Exhaustive so a new item type
/// is a compile-time, single-point change.
fn type_multiplier(item_type: ItemType) -> f64 {
    match item_type {
        ItemType::Code => 1.3,
        ItemType::Table => 0.8,
        ItemType::Document | ItemType::Window | ItemType::Image => 1.0,
    }
}

/// Character-ratio estimator: `ceil(utf8_len / 4)` scaled by the type
/// multiplier, plus a fixed baseline for image items
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, content: &str, item_type: ItemType) -> usize {
        let base = content.len().div_ceil(CHARS_PER_TOKEN);
        let scaled = (base as f64 * type_multiplier(item_type)).ceil() as usize;

        match item_type {
            ItemType::Image => scaled + IMAGE_BASE_TOKENS,
            _ => scaled,
        }
    }
}
