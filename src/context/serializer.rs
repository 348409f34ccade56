//! Read-only serialization views over the working set

use super::models::ContextItem;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

pub const CONTEXT_HEADER: &str = "=== CONTEXT ===";
pub const CONTEXT_FOOTER: &str = "=== END CONTEXT ===";

/// One image entry in the vision view, ready for a multimodal consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionImage {
    pub title: String,
    pub mime_type: String,
    /// `data:{mime};base64,{payload}` URI
    pub data_uri: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Vision view: textual context plus a structured image list, independently
/// consumable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionContext {
    pub text_content: String,
    pub images: Vec<VisionImage>,
}

/// Items ordered for rendering: priority descending, then most recent first
fn render_order<'a, I>(items: I) -> Vec<&'a ContextItem>
where
    I: IntoIterator<Item = &'a ContextItem>,
{
    let mut ordered: Vec<&ContextItem> = items.into_iter().collect();
    ordered.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.added_at.cmp(&a.added_at))
    });
    ordered
}

fn write_entry(out: &mut String, item: &ContextItem) {
    let _ = writeln!(out, "[{}: {}]", item.item_type.as_str(), item.title);
    if let Some(image) = item.image_data.as_ref().filter(|_| item.has_image()) {
        let dimension = |d: Option<u32>| d.map_or_else(|| "?".to_string(), |v| v.to_string());
        let _ = writeln!(
            out,
            "[IMAGE: {}, {}x{}]",
            image.mime_type,
            dimension(image.width),
            dimension(image.height)
        );
    }
    let _ = writeln!(out, "{}\n", item.content);
}

/// Render the textual summary used for prompt assembly.
///
/// Empty working set renders as the empty string; otherwise a delimited
/// block with one entry per item.
pub fn render_summary<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a ContextItem>,
{
    let ordered = render_order(items);
    if ordered.is_empty() {
        return String::new();
    }

    let mut summary = String::new();
    let _ = writeln!(summary, "{CONTEXT_HEADER}");
    for item in ordered {
        write_entry(&mut summary, item);
    }
    let _ = writeln!(summary, "{CONTEXT_FOOTER}");
    summary
}

/// Render the vision view: summary-style text restricted to non-image items,
/// an `IMAGES (n)` marker section when image items exist, and one structured
/// entry per image item.
pub fn render_vision<'a, I>(items: I) -> VisionContext
where
    I: IntoIterator<Item = &'a ContextItem>,
{
    let ordered = render_order(items);
    if ordered.is_empty() {
        return VisionContext::default();
    }

    let (image_items, text_items): (Vec<&ContextItem>, Vec<&ContextItem>) =
        ordered.into_iter().partition(|item| item.has_image());

    let mut text_content = String::new();
    let _ = writeln!(text_content, "{CONTEXT_HEADER}");
    for &item in &text_items {
        write_entry(&mut text_content, item);
    }

    if !image_items.is_empty() {
        let _ = writeln!(text_content, "=== IMAGES ({}) ===", image_items.len());
        for (index, item) in image_items.iter().enumerate() {
            let _ = writeln!(text_content, "Image {}: {} - {}", index + 1, item.title, item.content);
        }
    }
    let _ = writeln!(text_content, "{CONTEXT_FOOTER}");

    let images = image_items
        .iter()
        .filter_map(|item| {
            let image = item.image_data.as_ref()?;
            Some(VisionImage {
                title: item.title.clone(),
                mime_type: image.mime_type.clone(),
                data_uri: image.data_uri(),
                width: image.width,
                height: image.height,
            })
        })
        .collect();

    VisionContext {
        text_content,
        images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::models::{ContextPriority, ImageData, ItemType};
    use chrono::Utc;

    fn item(id: &str, priority: ContextPriority) -> ContextItem {
        ContextItem {
            id: id.to_string(),
            title: format!("Title {id}"),
            item_type: ItemType::Document,
            content: format!("Content of {id}").into(),
            image_data: None,
            priority,
            token_cost: 4,
            added_at: Utc::now(),
        }
    }

    fn image_item(id: &str) -> ContextItem {
        ContextItem {
            item_type: ItemType::Image,
            image_data: Some(ImageData::new("aGVsbG8=", "image/png").with_dimensions(640, 480)),
            ..item(id, ContextPriority::Medium)
        }
    }

    #[test]
    fn test_summary_empty_store() {
        assert_eq!(render_summary(std::iter::empty()), "");
    }

    #[test]
    fn test_summary_orders_by_priority() {
        let low = item("low", ContextPriority::Low);
        let high = item("high", ContextPriority::High);
        let summary = render_summary([&low, &high]);

        let high_pos = summary.find("Title high").unwrap();
        let low_pos = summary.find("Title low").unwrap();
        assert!(high_pos < low_pos);
        assert!(summary.starts_with(CONTEXT_HEADER));
        assert!(summary.trim_end().ends_with(CONTEXT_FOOTER));
    }

    #[test]
    fn test_summary_renders_image_metadata_line() {
        let img = image_item("img");
        let summary = render_summary([&img]);
        assert!(summary.contains("[IMAGE: image/png, 640x480]"));
    }

    #[test]
    fn test_vision_empty_store() {
        let vision = render_vision(std::iter::empty());
        assert_eq!(vision.text_content, "");
        assert!(vision.images.is_empty());
    }

    #[test]
    fn test_vision_partitions_images() {
        let doc = item("doc", ContextPriority::Medium);
        let img = image_item("img");
        let vision = render_vision([&doc, &img]);

        assert_eq!(vision.images.len(), 1);
        assert_eq!(
            vision.images[0].data_uri,
            "data:image/png;base64,aGVsbG8="
        );
        assert!(vision.text_content.contains("=== IMAGES (1) ==="));
        assert!(vision.text_content.contains("Image 1: Title img"));
        // Image content does not appear as a text entry
        assert!(!vision.text_content.contains("[image: Title img]"));
    }

    #[test]
    fn test_vision_image_without_payload_stays_textual() {
        // Image item without an attachment falls back to the text path
        let mut img = image_item("img");
        img.image_data = None;
        let vision = render_vision([&img]);

        assert!(vision.images.is_empty());
        assert!(vision.text_content.contains("[image: Title img]"));
        assert!(!vision.text_content.contains("=== IMAGES"));
    }
}
