//! Per-pass memoization of expensive document queries.

use std::collections::HashMap;

use serde::Serialize;

use crate::document::{ClientRect, ComputedStyle, Document, NodeId};

/// Hit/miss counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Pass-local cache of geometry, style, and classifier verdicts.
///
/// Keyed by node identity ([`NodeId`]), never by content: identity is
/// stable for the duration of one synchronous pass and cheaper than
/// hashing derived facts. The cache is created by the pass that owns it
/// and dropped with it, so stale geometry cannot leak into a later pass.
pub struct QueryCache {
    enabled: bool,
    rects: HashMap<NodeId, Option<ClientRect>>,
    styles: HashMap<NodeId, ComputedStyle>,
    visible: HashMap<NodeId, bool>,
    interactive: HashMap<NodeId, bool>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            rects: HashMap::new(),
            styles: HashMap::new(),
            visible: HashMap::new(),
            interactive: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Viewport-relative rectangle, memoized. A failed geometry query is
    /// absorbed and memoized as `None` so one bad node cannot fail the
    /// pass.
    pub fn rect(&mut self, doc: &dyn Document, node: NodeId) -> Option<ClientRect> {
        if self.enabled {
            if let Some(&hit) = self.rects.get(&node) {
                self.hits += 1;
                return hit;
            }
        }
        self.misses += 1;
        let value = match doc.bounding_rect(node) {
            Ok(rect) => rect,
            Err(err) => {
                tracing::debug!(node = node.0, "geometry query degraded: {err}");
                None
            }
        };
        if self.enabled {
            self.rects.insert(node, value);
        }
        value
    }

    /// Computed style, memoized. A failed style query degrades to the
    /// default style.
    pub fn style(&mut self, doc: &dyn Document, node: NodeId) -> ComputedStyle {
        if self.enabled {
            if let Some(hit) = self.styles.get(&node) {
                self.hits += 1;
                return hit.clone();
            }
        }
        self.misses += 1;
        let value = match doc.computed_style(node) {
            Ok(style) => style,
            Err(err) => {
                tracing::debug!(node = node.0, "style query degraded: {err}");
                ComputedStyle::default()
            }
        };
        if self.enabled {
            self.styles.insert(node, value.clone());
        }
        value
    }

    /// Memoized visibility verdict, if one was stored this pass.
    pub fn lookup_visibility(&mut self, node: NodeId) -> Option<bool> {
        Self::lookup(&self.visible, self.enabled, node, &mut self.hits, &mut self.misses)
    }

    pub fn store_visibility(&mut self, node: NodeId, value: bool) {
        if self.enabled {
            self.visible.insert(node, value);
        }
    }

    /// Memoized interactivity verdict, if one was stored this pass.
    pub fn lookup_interactivity(&mut self, node: NodeId) -> Option<bool> {
        Self::lookup(&self.interactive, self.enabled, node, &mut self.hits, &mut self.misses)
    }

    pub fn store_interactivity(&mut self, node: NodeId, value: bool) {
        if self.enabled {
            self.interactive.insert(node, value);
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
        }
    }

    fn lookup(
        table: &HashMap<NodeId, bool>,
        enabled: bool,
        node: NodeId,
        hits: &mut u64,
        misses: &mut u64,
    ) -> Option<bool> {
        if enabled {
            if let Some(&value) = table.get(&node) {
                *hits += 1;
                return Some(value);
            }
        }
        *misses += 1;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{SizeMetrics, StaticDocument, StaticNode, Viewport};

    fn one_node_doc() -> (StaticDocument, NodeId) {
        let mut doc = StaticDocument::new(Viewport::new(800.0, 600.0), SizeMetrics::default());
        let root = doc.set_root(StaticNode::new("body").rect(0.0, 0.0, 800.0, 600.0));
        (doc, root)
    }

    #[test]
    fn test_second_rect_access_hits() {
        let (doc, root) = one_node_doc();
        let mut cache = QueryCache::new(true);

        cache.rect(&doc, root);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 1 });

        cache.rect(&doc, root);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_disabled_cache_never_hits() {
        let (doc, root) = one_node_doc();
        let mut cache = QueryCache::new(false);

        cache.rect(&doc, root);
        cache.rect(&doc, root);
        cache.style(&doc, root);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 3 });
    }

    #[test]
    fn test_geometry_failure_memoized_as_missing() {
        let mut doc = StaticDocument::new(Viewport::new(800.0, 600.0), SizeMetrics::default());
        let root = doc.set_root(StaticNode::new("body"));
        let bad = doc.append(root, StaticNode::new("div").broken_geometry());

        let mut cache = QueryCache::new(true);
        assert_eq!(cache.rect(&doc, bad), None);
        // The degraded answer is served from cache afterwards.
        assert_eq!(cache.rect(&doc, bad), None);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_verdict_roundtrip() {
        let (_, root) = one_node_doc();
        let mut cache = QueryCache::new(true);

        assert_eq!(cache.lookup_visibility(root), None);
        cache.store_visibility(root, true);
        assert_eq!(cache.lookup_visibility(root), Some(true));

        assert_eq!(cache.lookup_interactivity(root), None);
        cache.store_interactivity(root, false);
        assert_eq!(cache.lookup_interactivity(root), Some(false));
    }
}
