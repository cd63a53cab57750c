//! The rendered-document boundary and an in-memory implementation.
//!
//! The snapshot pass never talks to a browser directly; it consumes the
//! [`Document`] trait, which an embedder implements over its live page
//! handle (CDP, WebDriver). [`StaticDocument`] is the arena-backed
//! implementation used by tests and by embedders that already hold a
//! materialized tree with known geometry.

use serde::{Deserialize, Serialize};

use crate::types::{DomResult, Rect};

/// Stable per-node handle, valid for the lifetime of one document snapshot.
///
/// Identity, not content: two nodes with identical markup still get
/// distinct handles, and a handle from one snapshot means nothing in the
/// next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Viewport dimensions and scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    /// Viewport at scroll origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }
}

/// Document-level size signals.
///
/// Browsers disagree about which probe reflects the real page size
/// (quirks mode, overflow), so the pass takes the per-axis maximum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeMetrics {
    pub scroll_width: f64,
    pub scroll_height: f64,
    pub offset_width: f64,
    pub offset_height: f64,
    pub client_width: f64,
    pub client_height: f64,
}

impl SizeMetrics {
    /// All signals agree on one size.
    pub fn uniform(width: f64, height: f64) -> Self {
        Self {
            scroll_width: width,
            scroll_height: height,
            offset_width: width,
            offset_height: height,
            client_width: width,
            client_height: height,
        }
    }

    pub fn max_width(&self) -> f64 {
        self.scroll_width.max(self.offset_width).max(self.client_width)
    }

    pub fn max_height(&self) -> f64 {
        self.scroll_height
            .max(self.offset_height)
            .max(self.client_height)
    }
}

/// Viewport-relative rectangle as returned by a geometry query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Translate into document coordinates using the pass's scroll offsets.
    pub fn to_document(&self, scroll_x: f64, scroll_y: f64) -> Rect {
        Rect {
            x: self.x + scroll_x,
            y: self.y + scroll_y,
            width: self.width,
            height: self.height,
            right: self.x + self.width + scroll_x,
            bottom: self.y + self.height + scroll_y,
        }
    }
}

/// Computed-style snapshot for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    pub cursor: String,
    /// The element is clipped to a zero-area rect.
    pub zero_clip: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            cursor: "auto".to_string(),
            zero_clip: false,
        }
    }
}

impl ComputedStyle {
    /// Style that hides the element outright.
    pub fn hidden() -> Self {
        Self {
            display: "none".to_string(),
            ..Self::default()
        }
    }

    pub fn with_cursor(mut self, cursor: &str) -> Self {
        self.cursor = cursor.to_string();
        self
    }
}

/// A rendered document as seen by one snapshot pass.
///
/// Geometry and style queries are fallible: a live page can mutate under
/// the handle mid-query. The pass absorbs per-node failures rather than
/// failing the whole run.
pub trait Document {
    /// Root element handle, `None` when the document is detached or empty.
    fn root(&self) -> Option<NodeId>;

    /// Every element node in document order, starting at the root.
    fn nodes(&self) -> Vec<NodeId>;

    /// Lowercased tag name.
    fn tag_name(&self, node: NodeId) -> String;

    /// Attributes as `(name, value)` pairs in document order.
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    /// Concatenated text content of the node's subtree.
    fn text_content(&self, node: NodeId) -> String;

    /// Viewport-relative bounding rectangle, `None` for non-rendered nodes.
    fn bounding_rect(&self, node: NodeId) -> DomResult<Option<ClientRect>>;

    /// Computed-style snapshot.
    fn computed_style(&self, node: NodeId) -> DomResult<ComputedStyle>;

    /// Viewport size and scroll offsets.
    fn viewport(&self) -> Viewport;

    /// Document-level size signals.
    fn size_metrics(&self) -> SizeMetrics;
}

/// One element in a [`StaticDocument`].
#[derive(Debug, Clone)]
pub struct StaticNode {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    rect: Option<ClientRect>,
    style: ComputedStyle,
    broken_geometry: bool,
    children: Vec<usize>,
}

impl StaticNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            text: String::new(),
            rect: None,
            style: ComputedStyle::default(),
            broken_geometry: false,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Some(ClientRect::new(x, y, width, height));
        self
    }

    pub fn style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    /// Make every geometry query for this node fail, as a live handle does
    /// when the page mutates mid-pass.
    pub fn broken_geometry(mut self) -> Self {
        self.broken_geometry = true;
        self
    }
}

/// Arena-backed in-memory document.
#[derive(Debug, Clone, Default)]
pub struct StaticDocument {
    nodes: Vec<StaticNode>,
    viewport: Viewport,
    sizes: SizeMetrics,
}

impl StaticDocument {
    pub fn new(viewport: Viewport, sizes: SizeMetrics) -> Self {
        Self {
            nodes: Vec::new(),
            viewport,
            sizes,
        }
    }

    /// A document with no root at all, as after a detached navigation.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Install the root element. Panics if a root already exists.
    pub fn set_root(&mut self, node: StaticNode) -> NodeId {
        assert!(self.nodes.is_empty(), "root already set");
        self.nodes.push(node);
        NodeId(0)
    }

    /// Append a child under `parent` and return its handle.
    pub fn append(&mut self, parent: NodeId, node: StaticNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        NodeId(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn collect_text(&self, index: usize, out: &mut String) {
        let node = &self.nodes[index];
        if !node.text.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&node.text);
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }
}

impl Document for StaticDocument {
    fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    fn nodes(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root() else {
            return order;
        };
        let mut stack = vec![root.0];
        while let Some(index) = stack.pop() {
            order.push(NodeId(index));
            for &child in self.nodes[index].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.nodes[node.0].tag.clone()
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.nodes[node.0].attributes.clone()
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node.0, &mut out);
        out
    }

    fn bounding_rect(&self, node: NodeId) -> DomResult<Option<ClientRect>> {
        let entry = &self.nodes[node.0];
        if entry.broken_geometry {
            return Err(crate::types::DomError::Geometry(format!(
                "node {} detached during layout query",
                node.0
            )));
        }
        Ok(entry.rect)
    }

    fn computed_style(&self, node: NodeId) -> DomResult<ComputedStyle> {
        Ok(self.nodes[node.0].style.clone())
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn size_metrics(&self) -> SizeMetrics {
        self.sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_level_doc() -> StaticDocument {
        let mut doc = StaticDocument::new(Viewport::new(1280.0, 720.0), SizeMetrics::uniform(1280.0, 2000.0));
        let body = doc.set_root(StaticNode::new("body"));
        let section = doc.append(body, StaticNode::new("section").text("intro"));
        doc.append(section, StaticNode::new("p").text("hello"));
        doc.append(body, StaticNode::new("footer").text("bye"));
        doc
    }

    #[test]
    fn test_document_order_is_preorder() {
        let doc = three_level_doc();
        let tags: Vec<String> = doc.nodes().iter().map(|&n| doc.tag_name(n)).collect();
        assert_eq!(tags, vec!["body", "section", "p", "footer"]);
    }

    #[test]
    fn test_detached_document_has_no_root() {
        let doc = StaticDocument::detached();
        assert!(doc.root().is_none());
        assert!(doc.nodes().is_empty());
    }

    #[test]
    fn test_text_content_covers_subtree() {
        let doc = three_level_doc();
        let root = doc.root().unwrap();
        assert_eq!(doc.text_content(root), "intro hello bye");
    }

    #[test]
    fn test_broken_geometry_errors() {
        let mut doc = StaticDocument::new(Viewport::new(100.0, 100.0), SizeMetrics::default());
        let root = doc.set_root(StaticNode::new("body"));
        let bad = doc.append(root, StaticNode::new("div").broken_geometry());
        assert!(doc.bounding_rect(bad).is_err());
        assert!(doc.bounding_rect(root).is_ok());
    }

    #[test]
    fn test_client_rect_to_document_adds_scroll() {
        let rect = ClientRect::new(10.0, 20.0, 100.0, 50.0);
        let doc_rect = rect.to_document(5.0, 300.0);
        assert_eq!(doc_rect.x, 15.0);
        assert_eq!(doc_rect.y, 320.0);
        assert_eq!(doc_rect.right, 115.0);
        assert_eq!(doc_rect.bottom, 370.0);
        assert_eq!(doc_rect.width, 100.0);
        assert_eq!(doc_rect.height, 50.0);
    }

    #[test]
    fn test_size_metrics_max() {
        let sizes = SizeMetrics {
            scroll_width: 1280.0,
            scroll_height: 4000.0,
            offset_width: 1300.0,
            offset_height: 3800.0,
            client_width: 1264.0,
            client_height: 720.0,
        };
        assert_eq!(sizes.max_width(), 1300.0);
        assert_eq!(sizes.max_height(), 4000.0);
    }
}
