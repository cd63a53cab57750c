//! End-to-end scenarios over synthetic documents: a full snapshot pass,
//! contextual analysis of a selected record, and telemetry rollup.

use agentic_dom::{
    analyze_context, extract, synthesize_selector, score_confidence, DataType, PageType,
    Recommendation, SizeMetrics, SnapshotOptions, StaticDocument, StaticNode,
    TelemetryAggregator, Viewport, INCLUDE_ALL,
};

// ─────────────────────── helpers ───────────────────────

fn include_all() -> SnapshotOptions {
    SnapshotOptions {
        viewport_expansion: INCLUDE_ALL,
        ..SnapshotOptions::default()
    }
}

/// A tall listing page: header with navigation, twelve product cards in
/// rows, and a footer.
fn listing_page() -> StaticDocument {
    let mut doc = StaticDocument::new(
        Viewport::new(1280.0, 720.0),
        SizeMetrics::uniform(1280.0, 2000.0),
    );
    let body = doc.set_root(StaticNode::new("body").rect(0.0, 0.0, 1280.0, 2000.0));

    let header = doc.append(
        body,
        StaticNode::new("header").rect(0.0, 0.0, 1280.0, 80.0),
    );
    doc.append(
        header,
        StaticNode::new("nav")
            .attr("role", "navigation")
            .rect(0.0, 0.0, 600.0, 80.0),
    );

    let list = doc.append(
        body,
        StaticNode::new("ul")
            .attr("class", "results")
            .rect(40.0, 120.0, 1200.0, 1600.0),
    );
    for i in 0..12 {
        let y = 130.0 + 130.0 * f64::from(i);
        let item = doc.append(
            list,
            StaticNode::new("li")
                .attr("class", "card product")
                .rect(40.0, y, 1200.0, 120.0),
        );
        doc.append(
            item,
            StaticNode::new("a")
                .attr("class", "card-link")
                .attr("href", &format!("/item/{i}"))
                .text(&format!("Product {i}"))
                .rect(50.0, y + 10.0, 300.0, 30.0),
        );
        doc.append(
            item,
            StaticNode::new("span")
                .attr("class", "price")
                .text(&format!("${}", 10 + i))
                .rect(50.0, y + 50.0, 120.0, 24.0),
        );
    }

    doc.append(
        body,
        StaticNode::new("footer").rect(0.0, 1900.0, 1280.0, 100.0),
    );
    doc
}

// ─────────────────────── scenarios ───────────────────────

#[test]
fn three_hundred_node_scenario() {
    let mut doc = StaticDocument::new(
        Viewport::new(1280.0, 720.0),
        SizeMetrics::uniform(1280.0, 10000.0),
    );
    let body = doc.set_root(StaticNode::new("body").rect(0.0, 0.0, 1280.0, 10000.0));

    // 40 skip-tag nodes interleaved with the visual tree.
    for i in 0..40 {
        let tag = if i % 2 == 0 { "script" } else { "meta" };
        doc.append(body, StaticNode::new(tag));
    }
    // 199 plain nodes with geometry: retained.
    for i in 0..199 {
        doc.append(
            body,
            StaticNode::new("div").rect(0.0, 30.0 * f64::from(i), 400.0, 24.0),
        );
    }
    // 40 nodes with no geometry and no interactivity: dropped.
    for _ in 0..40 {
        doc.append(body, StaticNode::new("span").text("orphan"));
    }
    // 20 interactive nodes with no geometry: retained without a box.
    for _ in 0..20 {
        doc.append(body, StaticNode::new("button").text("Go"));
    }

    let result = extract(&doc, &include_all()).unwrap();
    assert_eq!(result.total_nodes, 300);
    // body + 199 divs + 20 buttons survive the geometry-or-interactive test.
    assert_eq!(result.processed_nodes, 220);
    assert_eq!(result.skipped_nodes, 40);
    assert_eq!(result.elements.len(), 220);

    // Skip tags consumed no ids: 260 ids were handed out in total.
    let max_id = result.elements.iter().map(|el| el.id).max().unwrap();
    assert_eq!(max_id, 260);
}

#[test]
fn repeated_extraction_is_deterministic() {
    let doc = listing_page();
    let options = SnapshotOptions {
        cache_enabled: false,
        ..SnapshotOptions::default()
    };

    let first = extract(&doc, &options).unwrap();
    let second = extract(&doc, &options).unwrap();
    assert_eq!(first.elements, second.elements);
    assert_eq!(first.cache.hits, 0);
    assert_eq!(second.cache.hits, 0);

    let cached = extract(&doc, &SnapshotOptions::default()).unwrap();
    assert_eq!(cached.elements, first.elements);
    assert!(cached.cache.hits > 0);
}

#[test]
fn anchor_with_id_gets_exact_selector_and_confidence() {
    let mut doc = StaticDocument::new(
        Viewport::new(1280.0, 720.0),
        SizeMetrics::uniform(1280.0, 720.0),
    );
    let body = doc.set_root(StaticNode::new("body").rect(0.0, 0.0, 1280.0, 720.0));
    doc.append(
        body,
        StaticNode::new("a")
            .attr("id", "go")
            .attr("class", "btn primary")
            .attr("href", "/x")
            .text("Next")
            .rect(10.0, 10.0, 80.0, 30.0),
    );

    let result = extract(&doc, &SnapshotOptions::default()).unwrap();
    let anchor = result
        .elements
        .iter()
        .find(|el| el.tag == "a")
        .expect("anchor extracted");
    assert!(anchor.is_clickable);
    assert_eq!(synthesize_selector(anchor), "#go");
    assert_eq!(score_confidence(anchor), 0.95);
}

#[test]
fn listing_page_analysis_end_to_end() {
    let doc = listing_page();
    let result = extract(&doc, &include_all()).unwrap();

    let card = result
        .elements
        .iter()
        .find(|el| el.attr("class") == Some("card product"))
        .expect("card extracted");

    let context = analyze_context(card, &result.elements).unwrap();

    assert_eq!(context.page_structure.page_type, PageType::List);
    assert!(context.page_structure.content_distribution.navigation >= 1);
    assert!(context.similar_elements.len() > 5);
    assert!(context
        .similar_elements
        .iter()
        .all(|s| s.score > 0.3 && s.score <= 1.0));

    // Eleven sibling cards: the ambiguity warning must fire exactly once.
    let warnings = context
        .recommendations
        .iter()
        .filter(|rec| matches!(rec, Recommendation::Warning { .. }))
        .count();
    assert_eq!(warnings, 1);

    assert_eq!(context.selected.selector.as_deref(), Some("li.card.product"));
}

#[test]
fn price_element_infers_number_and_field_names() {
    let doc = listing_page();
    let result = extract(&doc, &include_all()).unwrap();

    let price = result
        .elements
        .iter()
        .find(|el| el.attr("class") == Some("price"))
        .expect("price extracted");
    let context = analyze_context(price, &result.elements).unwrap();

    let data_type = context.recommendations.iter().find_map(|rec| match rec {
        Recommendation::DataType { data_type, .. } => Some(*data_type),
        _ => None,
    });
    assert_eq!(data_type, Some(DataType::Number));

    let suggestions = context
        .recommendations
        .iter()
        .find_map(|rec| match rec {
            Recommendation::FieldName { suggestions, .. } => Some(suggestions.clone()),
            _ => None,
        })
        .expect("field-name recommendation present");
    assert!(suggestions.iter().any(|s| s == "price"));
}

#[test]
fn telemetry_rolls_up_passes() {
    let doc = listing_page();
    let telemetry = TelemetryAggregator::new();

    for _ in 0..3 {
        let result = extract(&doc, &include_all()).unwrap();
        telemetry.record_pass("shop.example", &result);
    }

    let summary = telemetry.analytics();
    assert_eq!(summary.total_analyses, 3);
    let host = &summary.hosts["shop.example"];
    assert_eq!(host.analyses, 3);
    // body, header, nav, ul, footer, and 12 cards of three elements each.
    assert_eq!(host.average_element_count, 41);
}
