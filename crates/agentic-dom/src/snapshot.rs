//! The snapshot pass: one ordered traversal producing element records.

use std::time::Instant;

use indexmap::IndexMap;

use crate::cache::QueryCache;
use crate::classify::{self, MIN_ELEMENT_SIZE};
use crate::config::SnapshotOptions;
use crate::document::{Document, NodeId};
use crate::types::{DomError, DomResult, ElementRecord, SnapshotResult};

/// Attributes copied onto every record when present, in this order.
/// Every `data-*` attribute is copied as well.
const IMPORTANT_ATTRIBUTES: [&str; 12] = [
    "id",
    "class",
    "name",
    "href",
    "src",
    "value",
    "type",
    "placeholder",
    "role",
    "aria-label",
    "title",
    "alt",
];

/// Suffix appended to truncated text.
const ELLIPSIS: &str = "...";

/// Run one snapshot pass over the document.
///
/// The pass owns a fresh [`QueryCache`]; nothing is shared with earlier or
/// later passes. A single node whose geometry query fails is degraded
/// (kept without a box when interactive, dropped otherwise); only a
/// missing root fails the pass as a whole.
pub fn extract(doc: &dyn Document, options: &SnapshotOptions) -> DomResult<SnapshotResult> {
    let started = Instant::now();
    let mut cache = QueryCache::new(options.cache_enabled);

    if doc.root().is_none() {
        return Err(DomError::DetachedRoot);
    }

    let viewport = doc.viewport();
    let mut elements = Vec::new();
    let mut total_nodes = 0u32;
    let mut skipped_nodes = 0u32;
    let mut next_id = 0u32;

    for node in doc.nodes() {
        total_nodes += 1;

        let tag = doc.tag_name(node);
        if classify::is_skip_tag(&tag) {
            continue;
        }

        next_id += 1;
        let id = next_id;

        let is_visible = classify::is_visible(doc, &mut cache, node, options);
        if !is_visible && !options.include_all() {
            skipped_nodes += 1;
            continue;
        }

        let is_clickable = classify::is_interactive(doc, &mut cache, node);

        let rect = cache.rect(doc, node);
        let has_usable_geometry = rect
            .is_some_and(|r| r.width >= MIN_ELEMENT_SIZE && r.height >= MIN_ELEMENT_SIZE);
        if !has_usable_geometry && !is_clickable {
            skipped_nodes += 1;
            continue;
        }
        let bounding_box = rect.map(|r| r.to_document(viewport.scroll_x, viewport.scroll_y));

        let attributes = collect_attributes(doc, node);
        let text = extract_text(
            &tag,
            &attributes,
            doc.text_content(node),
            options.max_text_length,
        );

        elements.push(ElementRecord {
            id,
            tag,
            text,
            attributes,
            bounding_box,
            is_clickable,
            is_visible,
            selector: None,
            confidence: None,
        });
    }

    let sizes = doc.size_metrics();
    let processed_nodes = elements.len() as u32;
    let result = SnapshotResult {
        elements,
        document_width: sizes.max_width(),
        document_height: sizes.max_height(),
        viewport_width: viewport.width,
        viewport_height: viewport.height,
        total_nodes,
        processed_nodes,
        skipped_nodes,
        processing_time_ms: started.elapsed().as_millis() as u64,
        cache: cache.stats(),
    };

    if options.debug_mode {
        tracing::debug!(
            total = result.total_nodes,
            processed = result.processed_nodes,
            skipped = result.skipped_nodes,
            cache_hits = result.cache.hits,
            cache_misses = result.cache.misses,
            elapsed_ms = result.processing_time_ms,
            "snapshot pass complete"
        );
    }

    Ok(result)
}

fn collect_attributes(doc: &dyn Document, node: NodeId) -> IndexMap<String, String> {
    let raw = doc.attributes(node);
    let mut attributes = IndexMap::new();

    for name in IMPORTANT_ATTRIBUTES {
        if let Some((_, value)) = raw.iter().find(|(attr_name, _)| attr_name == name) {
            attributes.insert(name.to_string(), value.clone());
        }
    }
    for (name, value) in &raw {
        if name.starts_with("data-") {
            attributes.insert(name.clone(), value.clone());
        }
    }

    attributes
}

/// Pick the text source per tag (form controls prefer value/placeholder,
/// images prefer alt/title), then trim and truncate.
fn extract_text(
    tag: &str,
    attributes: &IndexMap<String, String>,
    content: String,
    max_length: usize,
) -> Option<String> {
    let raw = match tag {
        "input" | "textarea" => attr_or_fallback(attributes, "value", "placeholder")
            .unwrap_or_default()
            .to_string(),
        "img" => attr_or_fallback(attributes, "alt", "title")
            .unwrap_or_default()
            .to_string(),
        _ => content,
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(truncate(trimmed, max_length))
}

fn attr_or_fallback<'a>(
    attributes: &'a IndexMap<String, String>,
    primary: &str,
    fallback: &str,
) -> Option<&'a str> {
    let non_empty = |name: &str| {
        attributes
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    };
    non_empty(primary).or_else(|| non_empty(fallback))
}

fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_length).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
