//! Data models for context budget management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Priority level for context items
///
/// The sole ranking key used by the budget optimizer: lower tiers are
/// evicted first, oldest first within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextPriority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl ContextPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Semantic type of a context item
///
/// Drives the estimator's per-type cost multiplier and the vision path's
/// image partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Prose / document content
    Document,
    /// Source code
    Code,
    /// Delimited tabular content
    Table,
    /// Reference to a host window
    Window,
    /// Image with an encoded payload
    Image,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Code => "code",
            Self::Table => "table",
            Self::Window => "window",
            Self::Image => "image",
        }
    }
}

/// Encoded image payload attached to an image-typed item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Base64-encoded image bytes
    pub data: Arc<str>,
    /// MIME type tag, e.g. `image/png`
    pub mime_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageData {
    pub fn new(data: impl Into<Arc<str>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Check the attachment is plausibly usable: an `image/*` MIME tag and a
    /// non-empty payload. Attachments come from external callers and are
    /// never trusted blindly.
    pub fn is_plausible(&self) -> bool {
        self.mime_type.starts_with("image/") && !self.data.is_empty()
    }

    /// Assemble a data URI from the MIME type and encoded payload
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Content payload supplied at ingestion time
///
/// Non-string payloads are canonicalized to their JSON serialization before
/// estimation and rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemContent {
    Text(String),
    Structured(serde_json::Value),
}

impl ItemContent {
    /// Canonical string form of the payload
    ///
    /// `null` and unserializable values degrade to the empty string; this
    /// path never fails.
    pub fn canonical_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(serde_json::Value::Null) => String::new(),
            Self::Structured(value) => serde_json::to_string(value).unwrap_or_default(),
        }
    }
}

impl From<String> for ItemContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ItemContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for ItemContent {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// Ingestion shape handed to the manager by external callers
///
/// The manager never fetches or creates items itself; ids are externally
/// assigned and unique per caller convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContextItem {
    pub id: String,
    pub title: String,
    pub item_type: ItemType,
    pub content: ItemContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
}

impl NewContextItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        item_type: ItemType,
        content: impl Into<ItemContent>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            item_type,
            content: content.into(),
            image_data: None,
        }
    }

    pub fn with_image(mut self, image_data: ImageData) -> Self {
        self.image_data = Some(image_data);
        self
    }
}

/// A budgeted, ranked unit of content resident in the working set
///
/// `token_cost` is computed once at add time and never re-estimated.
/// Content is held behind `Arc<str>` so history snapshots share payload
/// storage instead of deep-copying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: String,
    pub title: String,
    pub item_type: ItemType,
    pub content: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
    pub priority: ContextPriority,
    pub token_cost: usize,
    pub added_at: DateTime<Utc>,
}

impl ContextItem {
    /// Whether this item takes the vision path: image-typed with an attached
    /// payload
    pub fn has_image(&self) -> bool {
        self.item_type == ItemType::Image && self.image_data.is_some()
    }
}

/// Current token accounting for the working set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub current: usize,
    pub limit: usize,
    pub percentage: f64,
    /// Usage at or above 70% of the limit
    pub warning: bool,
    /// Usage at or above 90% of the limit
    pub critical: bool,
}

impl TokenUsage {
    pub fn measure(current: usize, limit: usize) -> Self {
        let percentage = if limit == 0 {
            0.0
        } else {
            (current as f64 / limit as f64) * 100.0
        };

        Self {
            current,
            limit,
            percentage,
            warning: percentage >= 70.0,
            critical: percentage >= 90.0,
        }
    }
}

/// Aggregate statistics over the working set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextStats {
    pub total_items: usize,
    pub type_distribution: HashMap<ItemType, usize>,
    pub priority_distribution: HashMap<ContextPriority, usize>,
    pub average_tokens_per_item: usize,
    pub oldest_item: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(ContextPriority::Low < ContextPriority::Medium);
        assert!(ContextPriority::Medium < ContextPriority::High);
    }

    #[test]
    fn test_canonical_text_for_string() {
        let content = ItemContent::from("hello");
        assert_eq!(content.canonical_text(), "hello");
    }

    #[test]
    fn test_canonical_text_for_structured() {
        let content = ItemContent::from(serde_json::json!({"rows": [1, 2]}));
        assert_eq!(content.canonical_text(), r#"{"rows":[1,2]}"#);
    }

    #[test]
    fn test_canonical_text_for_null_is_empty() {
        let content = ItemContent::from(serde_json::Value::Null);
        assert_eq!(content.canonical_text(), "");
    }

    #[test]
    fn test_image_data_uri() {
        let image = ImageData::new("aGVsbG8=", "image/png");
        assert_eq!(image.data_uri(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_image_plausibility() {
        assert!(ImageData::new("aGVsbG8=", "image/jpeg").is_plausible());
        assert!(!ImageData::new("aGVsbG8=", "text/plain").is_plausible());
        assert!(!ImageData::new("", "image/png").is_plausible());
    }

    #[test]
    fn test_token_usage_thresholds() {
        let usage = TokenUsage::measure(70, 100);
        assert!(usage.warning);
        assert!(!usage.critical);

        let usage = TokenUsage::measure(90, 100);
        assert!(usage.critical);

        let usage = TokenUsage::measure(10, 100);
        assert!(!usage.warning);
        assert!(!usage.critical);
    }
}
