//! Post-hoc contextual analysis of one selected element against the full
//! snapshot: similarity search, page-structure classification, qualitative
//! insights, and extraction recommendations.
//!
//! # Scoring model
//!
//! Similarity between two records is a weighted sum in `[0.0, 1.0]`:
//! shared tag (0.4), class-token overlap (up to 0.3), shared row and
//! similar size (0.15 + 0.05), attribute-key overlap (up to 0.1). Scores
//! at or below 0.3 are discarded; the survivors are ranked and capped at
//! ten. Page type is an ordered first-match rule chain so the priority of
//! each heuristic stays auditable on its own.

use std::collections::HashMap;

use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::selector::{is_stable_class, score_confidence, synthesize_selector};
use crate::types::{DomError, DomResult, ElementRecord};

// Similarity weights.
const W_TAG: f64 = 0.4;
const W_CLASS: f64 = 0.3;
const W_POSITION: f64 = 0.15;
const W_SIZE: f64 = 0.05;
const W_ATTRS: f64 = 0.1;

/// Scores at or below this are not similar enough to report.
const SIMILARITY_THRESHOLD: f64 = 0.3;
/// Maximum similar elements reported.
const MAX_SIMILAR: usize = 10;
/// Vertical distance (units) under which two elements share a row.
const ROW_TOLERANCE: f64 = 50.0;
/// Combined width+height delta (units) under which two sizes match.
const SIZE_TOLERANCE: f64 = 100.0;
/// Similar-element count above which the selector is ambiguous enough to
/// warn about.
const AMBIGUITY_LIMIT: usize = 5;
/// Maximum field-name suggestions returned.
const MAX_SUGGESTIONS: usize = 5;

/// Fraction of the page height treated as header / footer.
const HEADER_BAND: f64 = 0.15;
const FOOTER_BAND: f64 = 0.85;

/// How alike another record is to the selected one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Similarity {
    pub element_id: u32,
    /// Weighted score in `[0.0, 1.0]`.
    pub score: f64,
    /// Which rules contributed, in evaluation order.
    pub reasons: Vec<String>,
}

/// Coarse page classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Article,
    Ecommerce,
    List,
    News,
    Form,
    Dashboard,
    General,
}

/// Element counts per page region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentDistribution {
    pub header: u32,
    pub main: u32,
    pub sidebar: u32,
    pub footer: u32,
    pub navigation: u32,
}

/// Aggregate shape of the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageStructure {
    pub total_elements: u32,
    pub element_types: HashMap<String, u32>,
    pub interactive_elements: u32,
    pub visible_elements: u32,
    pub page_type: PageType,
    pub content_distribution: ContentDistribution,
}

/// Qualitative grade used by the element insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightLevel {
    High,
    Medium,
    Low,
}

/// Qualitative read on how extractable the selected element is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementInsights {
    pub uniqueness: InsightLevel,
    pub stability: InsightLevel,
    pub semantic_value: InsightLevel,
    pub extraction_difficulty: InsightLevel,
    pub notes: Vec<String>,
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Inferred data type for the selected element's extractable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Url,
    ImageUrl,
    Number,
    Date,
    Boolean,
    Text,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Url => "url",
            DataType::ImageUrl => "image_url",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
            DataType::Text => "text",
        }
    }
}

/// One actionable recommendation for rule building.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recommendation {
    Selector {
        priority: Priority,
        message: String,
        selector: String,
    },
    FieldName {
        priority: Priority,
        message: String,
        suggestions: Vec<String>,
    },
    DataType {
        priority: Priority,
        message: String,
        data_type: DataType,
    },
    Warning {
        priority: Priority,
        message: String,
        suggestion: String,
    },
}

impl Recommendation {
    pub fn priority(&self) -> Priority {
        match self {
            Recommendation::Selector { priority, .. }
            | Recommendation::FieldName { priority, .. }
            | Recommendation::DataType { priority, .. }
            | Recommendation::Warning { priority, .. } => *priority,
        }
    }
}

/// Full analyzer output for one selected element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextResult {
    /// The selected record with its selector and confidence filled in.
    pub selected: ElementRecord,
    pub similar_elements: Vec<Similarity>,
    pub page_structure: PageStructure,
    pub insights: ElementInsights,
    pub recommendations: Vec<Recommendation>,
}

/// Analyze one selected record against the full snapshot.
pub fn analyze_context(
    selected: &ElementRecord,
    all: &[ElementRecord],
) -> DomResult<ContextResult> {
    if all.is_empty() {
        return Err(DomError::InvalidInput(
            "context analysis requires a non-empty element list".to_string(),
        ));
    }

    let similar_elements = find_similar(selected, all);
    let page_structure = analyze_page_structure(all);
    let insights = element_insights(selected, &similar_elements);
    let recommendations = build_recommendations(selected, &similar_elements, &page_structure);

    let mut annotated = selected.clone();
    annotated.selector = Some(synthesize_selector(selected));
    annotated.confidence = Some(score_confidence(selected));

    Ok(ContextResult {
        selected: annotated,
        similar_elements,
        page_structure,
        insights,
        recommendations,
    })
}

/// Score how alike `other` is to `selected`.
pub fn similarity(selected: &ElementRecord, other: &ElementRecord) -> Similarity {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if other.tag == selected.tag {
        score += W_TAG;
        reasons.push("same_tag".to_string());
    }

    let selected_classes = selected.class_tokens();
    let other_classes = other.class_tokens();
    if !selected_classes.is_empty() && !other_classes.is_empty() {
        let common: Vec<&str> = selected_classes
            .iter()
            .filter(|token| other_classes.contains(token))
            .copied()
            .collect();
        let overlap =
            common.len() as f64 / selected_classes.len().max(other_classes.len()) as f64;
        score += overlap * W_CLASS;
        if !common.is_empty() {
            reasons.push(format!("common_classes:{}", common.join(",")));
        }
    }

    if let (Some(a), Some(b)) = (&selected.bounding_box, &other.bounding_box) {
        if (a.y - b.y).abs() < ROW_TOLERANCE {
            score += W_POSITION;
            reasons.push("similar_y_position".to_string());
        }
        let size_delta = (a.width - b.width).abs() + (a.height - b.height).abs();
        if size_delta < SIZE_TOLERANCE {
            score += W_SIZE;
            reasons.push("similar_size".to_string());
        }
    }

    let common_attrs: Vec<&str> = selected
        .attributes
        .keys()
        .filter(|key| other.attributes.contains_key(*key))
        .map(String::as_str)
        .collect();
    if !common_attrs.is_empty() {
        let overlap = common_attrs.len() as f64
            / selected.attributes.len().max(other.attributes.len()) as f64;
        score += overlap * W_ATTRS;
        reasons.push(format!("common_attributes:{}", common_attrs.join(",")));
    }

    Similarity {
        element_id: other.id,
        score,
        reasons,
    }
}

/// Rank every other record by similarity and keep the meaningful top ten.
pub fn find_similar(selected: &ElementRecord, all: &[ElementRecord]) -> Vec<Similarity> {
    let mut matches: Vec<Similarity> = all
        .iter()
        .filter(|other| other.id != selected.id)
        .map(|other| similarity(selected, other))
        .filter(|result| result.score > SIMILARITY_THRESHOLD)
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(MAX_SIMILAR);
    matches
}

/// Aggregate counts feeding the page-type rules.
struct PageProfile {
    articles: u32,
    mains: u32,
    forms: u32,
    buttons: u32,
    inputs: u32,
    list_tags: u32,
    anchors: u32,
    images: u32,
    tables: u32,
    divs: u32,
    interactive: u32,
    has_currency_text: bool,
}

impl PageProfile {
    fn build(all: &[ElementRecord], element_types: &HashMap<String, u32>, interactive: u32) -> Self {
        let count = |tag: &str| element_types.get(tag).copied().unwrap_or(0);
        let currency = Regex::new(r"[$£€¥][\d,]+").expect("currency regex is valid");

        Self {
            articles: count("article"),
            mains: count("main"),
            forms: count("form"),
            buttons: count("button"),
            inputs: count("input"),
            list_tags: count("ul") + count("ol") + count("li"),
            anchors: count("a"),
            images: count("img"),
            tables: count("table"),
            divs: count("div"),
            interactive,
            has_currency_text: all.iter().any(|el| {
                el.text.as_deref().is_some_and(|text| currency.is_match(text))
            }),
        }
    }
}

/// Ordered page-type rules; the first whose predicate holds wins.
const PAGE_TYPE_RULES: [(PageType, fn(&PageProfile) -> bool); 6] = [
    (PageType::Article, |p| p.articles > 0 || p.mains > 0),
    (PageType::Ecommerce, |p| {
        p.forms > 0 && (p.buttons > 5 || p.inputs > 5) && p.has_currency_text
    }),
    (PageType::List, |p| p.list_tags > 10),
    (PageType::News, |p| p.anchors > 20 && p.images > 10),
    (PageType::Form, |p| p.forms > 0 && p.inputs > 3),
    (PageType::Dashboard, |p| {
        p.tables > 0 || (p.divs > 50 && p.interactive > 20)
    }),
];

fn classify_page_type(profile: &PageProfile) -> PageType {
    PAGE_TYPE_RULES
        .iter()
        .find(|(_, applies)| applies(profile))
        .map(|(page_type, _)| *page_type)
        .unwrap_or(PageType::General)
}

/// Summarize the whole snapshot: tag counts, interactivity, page type, and
/// vertical content distribution.
pub fn analyze_page_structure(all: &[ElementRecord]) -> PageStructure {
    let mut element_types: HashMap<String, u32> = HashMap::new();
    let mut interactive_elements = 0;
    let mut visible_elements = 0;

    for el in all {
        *element_types.entry(el.tag.clone()).or_insert(0) += 1;
        if el.is_clickable {
            interactive_elements += 1;
        }
        if el.is_visible {
            visible_elements += 1;
        }
    }

    let profile = PageProfile::build(all, &element_types, interactive_elements);
    let page_type = classify_page_type(&profile);

    PageStructure {
        total_elements: all.len() as u32,
        element_types,
        interactive_elements,
        visible_elements,
        page_type,
        content_distribution: content_distribution(all),
    }
}

/// Bucket records by normalized vertical position; navigation is counted
/// independently of geometry.
fn content_distribution(all: &[ElementRecord]) -> ContentDistribution {
    let mut distribution = ContentDistribution::default();

    let page_height = all
        .iter()
        .filter_map(|el| el.bounding_box.as_ref().map(|b| b.bottom))
        .fold(0.0_f64, f64::max);

    for el in all {
        if let Some(rect) = &el.bounding_box {
            if page_height > 0.0 {
                let ratio = rect.y / page_height;
                if ratio < HEADER_BAND {
                    distribution.header += 1;
                } else if ratio > FOOTER_BAND {
                    distribution.footer += 1;
                } else {
                    distribution.main += 1;
                }
            }
        }
        if el.tag == "nav" || el.attr("role").is_some_and(|role| role == "navigation") {
            distribution.navigation += 1;
        }
    }

    distribution
}

/// Semantic attributes that raise an element's semantic value.
const SEMANTIC_ATTRS: [&str; 4] = ["aria-label", "title", "alt", "role"];

/// Grade the selected element on uniqueness, stability, semantic value,
/// and extraction difficulty.
pub fn element_insights(selected: &ElementRecord, similar: &[Similarity]) -> ElementInsights {
    let mut notes = Vec::new();

    let uniqueness = if selected.attr("id").is_some() {
        notes.push("Element has unique ID - very reliable selector".to_string());
        InsightLevel::High
    } else if similar.is_empty() {
        notes.push("No similar elements found - unique structure".to_string());
        InsightLevel::High
    } else if similar.len() > MAX_SIMILAR {
        notes.push("Many similar elements - consider parent context".to_string());
        InsightLevel::Low
    } else {
        InsightLevel::Medium
    };

    let classes = selected.class_tokens();
    let stability = if classes.is_empty() {
        InsightLevel::Medium
    } else if classes.iter().any(|token| insight_stable_class(token)) {
        notes.push("Has stable CSS classes".to_string());
        InsightLevel::High
    } else {
        notes.push("Classes appear dynamic - use structural selector".to_string());
        InsightLevel::Low
    };

    let has_semantic_attr = SEMANTIC_ATTRS
        .iter()
        .any(|name| selected.attr(name).is_some());
    let semantic_value = if selected.tag == "main" || selected.tag == "article" || has_semantic_attr
    {
        notes.push("Element has semantic meaning".to_string());
        InsightLevel::High
    } else {
        InsightLevel::Medium
    };

    let extraction_difficulty = if selected.text.as_deref().is_some_and(|t| t.len() > 5) {
        notes.push("Element has clear text content".to_string());
        InsightLevel::Low
    } else if selected.attr("href").is_some() || selected.attr("src").is_some() {
        notes.push("Element has extractable URL/source".to_string());
        InsightLevel::Low
    } else {
        notes.push("Consider what data to extract from this element".to_string());
        InsightLevel::High
    };

    ElementInsights {
        uniqueness,
        stability,
        semantic_value,
        extraction_difficulty,
        notes,
    }
}

/// Stability probe for insights: longer than three characters, not a
/// generated token, not a state token. Looser than the selector filter:
/// it asks "is there anything to hold on to", not "is this token
/// selector-grade".
fn insight_stable_class(token: &str) -> bool {
    if token.len() <= 3 || token.contains("active") {
        return false;
    }
    let generated = Regex::new(r"^[a-z]+-\d+$").expect("generated-class regex is valid");
    !generated.is_match(token)
}

/// Build the full recommendation list for a selected element.
pub fn build_recommendations(
    selected: &ElementRecord,
    similar: &[Similarity],
    structure: &PageStructure,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if selected.attr("id").is_some() {
        recommendations.push(Recommendation::Selector {
            priority: Priority::High,
            message: "Use ID selector for maximum reliability".to_string(),
            selector: synthesize_selector(selected),
        });
    } else {
        recommendations.push(Recommendation::Selector {
            priority: Priority::Medium,
            message: "Generated CSS selector should work reliably".to_string(),
            selector: synthesize_selector(selected),
        });
    }

    recommendations.push(Recommendation::FieldName {
        priority: Priority::Medium,
        message: "Suggested field names based on element analysis".to_string(),
        suggestions: field_name_suggestions(selected, structure),
    });

    let data_type = infer_data_type(selected);
    recommendations.push(Recommendation::DataType {
        priority: Priority::Medium,
        message: format!("Inferred data type: {}", data_type.as_str()),
        data_type,
    });

    if similar.len() > AMBIGUITY_LIMIT {
        recommendations.push(Recommendation::Warning {
            priority: Priority::High,
            message: format!(
                "Found {} similar elements - selector may match multiple items",
                similar.len()
            ),
            suggestion: "Consider using more specific selector or parent context".to_string(),
        });
    }

    recommendations
}

/// Suggest field names from the element's text, classes, the page type,
/// and the tag. Bilingual keyword tables (English/Korean) mirror the
/// sites this engine was tuned on.
pub fn field_name_suggestions(
    selected: &ElementRecord,
    structure: &PageStructure,
) -> Vec<String> {
    let mut suggestions: IndexSet<&str> = IndexSet::new();

    if let Some(text) = selected.text.as_deref() {
        let lower = text.to_lowercase();
        let currency = Regex::new(r"[$£€¥]").expect("currency regex is valid");
        let iso_date = Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date regex is valid");

        if lower.contains("title") || lower.contains("제목") {
            suggestions.extend(["title", "headline", "제목"]);
        }
        if lower.contains("price") || lower.contains("가격") || currency.is_match(text) {
            suggestions.extend(["price", "cost", "가격"]);
        }
        if lower.contains("date") || lower.contains("날짜") || iso_date.is_match(text) {
            suggestions.extend(["date", "published_date", "날짜"]);
        }
    }

    for token in selected.class_tokens() {
        if token.contains("title") {
            suggestions.insert("title");
        }
        if token.contains("price") {
            suggestions.insert("price");
        }
        if token.contains("date") {
            suggestions.insert("date");
        }
        if token.contains("link") {
            suggestions.insert("link");
        }
        if token.contains("image") {
            suggestions.insert("image");
        }
    }

    match structure.page_type {
        PageType::News => {
            suggestions.extend(["news_title", "article_link", "publish_date", "뉴스_제목"])
        }
        PageType::Ecommerce => {
            suggestions.extend(["product_name", "product_price", "product_image", "상품명"])
        }
        PageType::List => suggestions.extend(["list_item", "item_title", "item_link", "목록_항목"]),
        _ => {}
    }

    match selected.tag.as_str() {
        "a" => suggestions.extend(["link", "url", "href", "링크"]),
        "img" => suggestions.extend(["image", "image_url", "alt_text", "이미지"]),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            suggestions.extend(["heading", "title", "headline", "제목"])
        }
        _ => {}
    }

    suggestions
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(String::from)
        .collect()
}

/// Infer the extractable data type, most specific signal first.
pub fn infer_data_type(selected: &ElementRecord) -> DataType {
    if selected.attr("href").is_some() || selected.attr("src").is_some() {
        return DataType::Url;
    }

    let image_extension = Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp)$").expect("image regex is valid");
    if selected.tag == "img"
        || selected
            .attr("src")
            .is_some_and(|src| image_extension.is_match(src))
    {
        return DataType::ImageUrl;
    }

    if let Some(text) = selected.text.as_deref() {
        let trimmed = text.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return DataType::Number;
        }
        let priced = Regex::new(r"[$£€¥]\d+").expect("price regex is valid");
        if priced.is_match(text) {
            return DataType::Number;
        }
        let dated =
            Regex::new(r"\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}").expect("date regex is valid");
        if dated.is_match(text) {
            return DataType::Date;
        }
    }

    if selected.attr("type").is_some_and(|t| t == "checkbox") {
        return DataType::Boolean;
    }
    if selected.text.as_deref().is_some_and(|text| {
        let literal = Regex::new(r"(?i)^(true|false|yes|no|on|off)$").expect("boolean regex is valid");
        literal.is_match(text.trim())
    }) {
        return DataType::Boolean;
    }

    DataType::Text
}
