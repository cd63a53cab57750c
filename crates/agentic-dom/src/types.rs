//! Core data types for DOM snapshots and analysis results.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

/// One extracted element produced by a snapshot pass.
///
/// Records are immutable once the pass that created them returns; the
/// `selector` and `confidence` slots stay empty until the contextual
/// analyzer fills them for a selected element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// Monotonic id within one pass. No identity across passes.
    pub id: u32,
    /// Lowercased tag name.
    pub tag: String,
    /// Trimmed, truncated text content (`None` when empty).
    pub text: Option<String>,
    /// Allow-listed attributes plus every `data-*` attribute, in order.
    pub attributes: IndexMap<String, String>,
    /// Document-coordinate rectangle, `None` for an interactive element
    /// whose geometry query failed.
    pub bounding_box: Option<Rect>,
    pub is_clickable: bool,
    pub is_visible: bool,
    pub selector: Option<String>,
    pub confidence: Option<f64>,
}

impl ElementRecord {
    /// Attribute value lookup.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whitespace-separated class tokens, empty when no class attribute.
    pub fn class_tokens(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// A document-coordinate rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Everything one snapshot pass produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotResult {
    pub elements: Vec<ElementRecord>,
    /// Largest of the document-level width signals.
    pub document_width: f64,
    /// Largest of the document-level height signals.
    pub document_height: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Element nodes walked, including skip-tag nodes.
    pub total_nodes: u32,
    /// Records that survived filtering (`elements.len()`).
    pub processed_nodes: u32,
    /// Nodes dropped by the visibility or retention tests.
    pub skipped_nodes: u32,
    pub processing_time_ms: u64,
    /// Cache hit/miss counters for the pass.
    pub cache: CacheStats,
}

/// Errors surfaced by the analysis engine.
#[derive(thiserror::Error, Debug)]
pub enum DomError {
    #[error("document root is missing or detached")]
    DetachedRoot,

    #[error("geometry query failed: {0}")]
    Geometry(String),

    #[error("style query failed: {0}")]
    Style(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result type.
pub type DomResult<T> = Result<T, DomError>;
