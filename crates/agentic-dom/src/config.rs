//! Snapshot pass configuration.

use serde::{Deserialize, Serialize};

/// Sentinel for [`SnapshotOptions::viewport_expansion`]: ignore the viewport
/// and include every element, on-screen or not.
pub const INCLUDE_ALL: i32 = -1;

/// Default margin (in document units) added around the viewport.
pub const DEFAULT_VIEWPORT_EXPANSION: i32 = 200;

/// Default cap on extracted text length, in characters.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 200;

/// Options recognized by a snapshot pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotOptions {
    /// Margin added around the viewport when deciding visibility, or
    /// [`INCLUDE_ALL`] to keep off-viewport elements.
    #[serde(default = "default_viewport_expansion")]
    pub viewport_expansion: i32,
    /// Emit traversal diagnostics at debug level.
    #[serde(default)]
    pub debug_mode: bool,
    /// Memoize geometry/style queries for the duration of the pass.
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Extracted text is truncated to this many characters.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            viewport_expansion: DEFAULT_VIEWPORT_EXPANSION,
            debug_mode: false,
            cache_enabled: true,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

impl SnapshotOptions {
    /// Whether the pass keeps elements regardless of viewport position.
    pub fn include_all(&self) -> bool {
        self.viewport_expansion == INCLUDE_ALL
    }
}

fn default_viewport_expansion() -> i32 {
    DEFAULT_VIEWPORT_EXPANSION
}

fn default_cache_enabled() -> bool {
    true
}

fn default_max_text_length() -> usize {
    DEFAULT_MAX_TEXT_LENGTH
}
