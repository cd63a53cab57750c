//! Element visibility and interactivity classification.
//!
//! Both classifiers read geometry and style through the pass's
//! [`QueryCache`] and memoize their own verdicts there, so repeated
//! queries against the same node are free within a pass.

use crate::cache::QueryCache;
use crate::config::SnapshotOptions;
use crate::document::{ClientRect, Document, NodeId, Viewport};

/// Minimum rendered dimension (units) for an element to count as visible.
pub const MIN_ELEMENT_SIZE: f64 = 5.0;

/// Tags that never carry visual content.
pub const SKIP_TAGS: [&str; 7] = [
    "script", "style", "meta", "link", "title", "head", "noscript",
];

/// Natively interactive tags.
const INTERACTIVE_TAGS: [&str; 7] = [
    "a", "button", "input", "select", "textarea", "details", "summary",
];

/// Input types that keep an `<input>` interactive. An unset type is
/// interactive by default; a set type outside this list falls through to
/// the attribute and style rules.
const INTERACTIVE_INPUT_TYPES: [&str; 7] = [
    "checkbox", "radio", "submit", "reset", "button", "image", "file",
];

/// Inline handler attributes that imply clickability.
const CLICK_HANDLER_ATTRS: [&str; 3] = ["onclick", "onmousedown", "ontouchstart"];

/// ARIA roles that imply clickability.
const INTERACTIVE_ROLES: [&str; 7] = [
    "button", "link", "checkbox", "radio", "tab", "option", "menuitem",
];

/// True for tags the traversal skips outright.
pub fn is_skip_tag(tag: &str) -> bool {
    SKIP_TAGS.contains(&tag)
}

/// Decide whether a node is visible, memoizing the verdict.
///
/// Order of elimination: no rectangle or a sub-minimum rectangle, then a
/// hiding computed style, then the expanded-viewport window (skipped
/// entirely when the options say include-all).
pub fn is_visible(
    doc: &dyn Document,
    cache: &mut QueryCache,
    node: NodeId,
    options: &SnapshotOptions,
) -> bool {
    if let Some(verdict) = cache.lookup_visibility(node) {
        return verdict;
    }
    let verdict = compute_visibility(doc, cache, node, options);
    cache.store_visibility(node, verdict);
    verdict
}

fn compute_visibility(
    doc: &dyn Document,
    cache: &mut QueryCache,
    node: NodeId,
    options: &SnapshotOptions,
) -> bool {
    let rect = match cache.rect(doc, node) {
        Some(rect) => rect,
        None => return false,
    };
    if rect.width < MIN_ELEMENT_SIZE || rect.height < MIN_ELEMENT_SIZE {
        return false;
    }

    let style = cache.style(doc, node);
    if style.display == "none"
        || style.visibility == "hidden"
        || style.opacity == 0.0
        || style.zero_clip
    {
        return false;
    }

    if options.include_all() {
        return true;
    }
    in_expanded_viewport(rect, doc.viewport(), f64::from(options.viewport_expansion))
}

/// Whether a viewport-relative rect intersects the viewport outset by
/// `margin` on every side.
fn in_expanded_viewport(rect: ClientRect, viewport: Viewport, margin: f64) -> bool {
    rect.x + rect.width >= -margin
        && rect.x <= viewport.width + margin
        && rect.y + rect.height >= -margin
        && rect.y <= viewport.height + margin
}

/// Decide whether a node is interactive, memoizing the verdict.
///
/// The rules are disjunctive, so their order only affects how early we can
/// answer without touching the style cache.
pub fn is_interactive(doc: &dyn Document, cache: &mut QueryCache, node: NodeId) -> bool {
    if let Some(verdict) = cache.lookup_interactivity(node) {
        return verdict;
    }
    let verdict = compute_interactivity(doc, cache, node);
    cache.store_interactivity(node, verdict);
    verdict
}

fn compute_interactivity(doc: &dyn Document, cache: &mut QueryCache, node: NodeId) -> bool {
    let tag = doc.tag_name(node);
    let attributes = doc.attributes(node);

    if let Some(verdict) = interactive_tag_rule(&tag, &attributes) {
        return verdict;
    }
    if anchor_rule(&tag, &attributes) {
        return true;
    }
    if attribute_rule(&attributes) {
        return true;
    }
    if cache.style(doc, node).cursor == "pointer" {
        return true;
    }
    editable_rule(&attributes)
}

/// Natively interactive tags: `disabled` vetoes the whole chain, and
/// `<input>` types outside the allow-list fall through to later rules.
fn interactive_tag_rule(tag: &str, attributes: &[(String, String)]) -> Option<bool> {
    if !INTERACTIVE_TAGS.contains(&tag) {
        return None;
    }
    if attr(attributes, "disabled").is_some() {
        return Some(false);
    }
    if tag == "input" {
        return match attr(attributes, "type") {
            None => Some(true),
            Some(input_type) => {
                let input_type = input_type.to_ascii_lowercase();
                if INTERACTIVE_INPUT_TYPES.contains(&input_type.as_str()) {
                    Some(true)
                } else {
                    None
                }
            }
        };
    }
    Some(true)
}

fn anchor_rule(tag: &str, attributes: &[(String, String)]) -> bool {
    tag == "a" && (attr(attributes, "href").is_some() || attr(attributes, "role").is_some())
}

fn attribute_rule(attributes: &[(String, String)]) -> bool {
    if CLICK_HANDLER_ATTRS
        .iter()
        .any(|name| attr(attributes, name).is_some())
    {
        return true;
    }
    if attr(attributes, "tabindex").is_some_and(|value| value != "-1") {
        return true;
    }
    attr(attributes, "role").is_some_and(|role| {
        let role = role.to_ascii_lowercase();
        INTERACTIVE_ROLES.contains(&role.as_str())
    })
}

fn editable_rule(attributes: &[(String, String)]) -> bool {
    attr(attributes, "contenteditable").is_some_and(|value| !value.eq_ignore_ascii_case("false"))
}

fn attr<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(attr_name, _)| attr_name == name)
        .map(|(_, value)| value.as_str())
}
