//! AgenticDOM — core DOM analysis library: snapshot extraction, element
//! classification, selector synthesis, and contextual analysis.

pub mod cache;
pub mod classify;
pub mod config;
pub mod context;
pub mod document;
pub mod selector;
pub mod snapshot;
pub mod telemetry;
pub mod types;

pub use cache::{CacheStats, QueryCache};
pub use classify::{is_interactive, is_visible, MIN_ELEMENT_SIZE, SKIP_TAGS};
pub use config::{SnapshotOptions, INCLUDE_ALL};
pub use context::{
    analyze_context, find_similar, similarity, ContentDistribution, ContextResult, DataType,
    ElementInsights, InsightLevel, PageStructure, PageType, Priority, Recommendation, Similarity,
};
pub use document::{
    ClientRect, ComputedStyle, Document, NodeId, SizeMetrics, StaticDocument, StaticNode, Viewport,
};
pub use selector::{is_stable_class, score_confidence, synthesize_selector};
pub use snapshot::extract;
pub use telemetry::{AnalyticsSummary, HostStats, TelemetryAggregator, TelemetryRecord};
pub use types::*;
