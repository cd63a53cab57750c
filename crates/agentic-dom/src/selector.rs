//! Deterministic CSS selector synthesis and confidence scoring.
//!
//! # Confidence model
//!
//! Every synthesized selector is paired with a confidence score in
//! `[0.1, 0.99]`. An `id` attribute scores a flat 0.95 because ids survive
//! redeploys far more often than anything else. Without an id, confidence
//! starts at 0.5 and grows with the fraction of stable class tokens and
//! the presence of a test-id attribute.

use regex::Regex;

use crate::types::ElementRecord;

/// Attributes that mark an element as test-addressable, in lookup order.
pub const TEST_ID_ATTRS: [&str; 3] = ["data-testid", "data-cy", "data-test"];

/// State words that make a class token unstable.
const STATE_WORDS: [&str; 3] = ["active", "selected", "hover"];

/// Maximum class tokens folded into a synthesized selector.
const MAX_SELECTOR_CLASSES: usize = 2;

// Confidence weights.
const BASE_CONFIDENCE: f64 = 0.5;
const ID_CONFIDENCE: f64 = 0.95;
const STABLE_CLASS_WEIGHT: f64 = 0.3;
const TEST_ID_BONUS: f64 = 0.2;
const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.99;

/// True when a class token looks stable enough to build a selector on:
/// not a generated `word-123` token, not purely numeric, not a state
/// word, and longer than one character.
pub fn is_stable_class(token: &str) -> bool {
    if token.len() <= 1 {
        return false;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if STATE_WORDS.iter().any(|word| token.contains(word)) {
        return false;
    }
    let generated = Regex::new(r"^[a-z]+-\d+$").expect("generated-class regex is valid");
    !generated.is_match(token)
}

/// Build the best-effort selector for a record.
///
/// Priority order: id, then tag plus up to two stable classes, then
/// tag-specific attribute refinements, then the first test-id attribute.
pub fn synthesize_selector(record: &ElementRecord) -> String {
    if let Some(id) = record.attr("id") {
        return format!("#{}", css_escape(id));
    }

    let mut selector = record.tag.clone();

    for token in record
        .class_tokens()
        .into_iter()
        .filter(|token| is_stable_class(token))
        .take(MAX_SELECTOR_CLASSES)
    {
        selector.push('.');
        selector.push_str(&css_escape(token));
    }

    if record.tag == "input" {
        if let Some(input_type) = record.attr("type") {
            selector.push_str(&format!("[type=\"{input_type}\"]"));
        }
        if let Some(name) = record.attr("name") {
            selector.push_str(&format!("[name=\"{name}\"]"));
        }
    }
    if record.tag == "a" && record.attr("href").is_some() {
        selector.push_str("[href]");
    }
    if let Some(role) = record.attr("role") {
        selector.push_str(&format!("[role=\"{role}\"]"));
    }

    for name in TEST_ID_ATTRS {
        if let Some(value) = record.attr(name) {
            selector.push_str(&format!("[{name}=\"{value}\"]"));
            break;
        }
    }

    selector
}

/// Heuristic confidence that the synthesized selector re-identifies the
/// same element later. Always in `[0.1, 0.99]`; exactly 0.95 whenever an
/// id is present.
pub fn score_confidence(record: &ElementRecord) -> f64 {
    if record.attr("id").is_some() {
        return ID_CONFIDENCE;
    }

    let mut confidence = BASE_CONFIDENCE;

    let tokens = record.class_tokens();
    if !tokens.is_empty() {
        let stable = tokens.iter().filter(|token| is_stable_class(token)).count();
        confidence += stable as f64 / tokens.len() as f64 * STABLE_CLASS_WEIGHT;
    }

    if TEST_ID_ATTRS.iter().any(|name| record.attr(name).is_some()) {
        confidence += TEST_ID_BONUS;
    }

    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Escape a raw value for use as a CSS identifier: every character
/// outside `[a-zA-Z0-9_-]` is backslash-escaped.
fn css_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            escaped.push(ch);
        } else {
            escaped.push('\\');
            escaped.push(ch);
        }
    }
    escaped
}
