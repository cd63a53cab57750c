//! Cross-pass performance telemetry with bounded per-host history.
//!
//! The aggregator is the only state shared across passes. It is injected
//! into callers (no ambient singleton) and safe to share behind `Arc`:
//! the append path is one narrow critical section per host key.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::types::SnapshotResult;

/// Retained records per host; the oldest is evicted beyond this.
const HISTORY_CAP: usize = 10;

/// One recorded analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetryRecord {
    pub processing_time_ms: u64,
    pub element_count: u32,
    pub total_nodes: u32,
    /// Epoch seconds, stamped at record time.
    pub timestamp: u64,
}

/// Per-host rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostStats {
    pub analyses: u32,
    pub average_processing_time_ms: u64,
    pub average_element_count: u32,
    pub last_analyzed: u64,
}

/// Rollup across every recorded host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub total_analyses: u32,
    pub average_processing_time_ms: u64,
    pub hosts: HashMap<String, HostStats>,
}

/// Accumulates per-host timing metrics across snapshot passes.
#[derive(Debug, Default)]
pub struct TelemetryAggregator {
    history: Mutex<HashMap<String, VecDeque<TelemetryRecord>>>,
}

impl TelemetryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append metrics for a host, stamping the record and evicting the
    /// oldest entry past the history cap.
    pub fn record(&self, host: &str, processing_time_ms: u64, element_count: u32, total_nodes: u32) {
        let record = TelemetryRecord {
            processing_time_ms,
            element_count,
            total_nodes,
            timestamp: epoch_secs(),
        };

        let mut history = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entries = history.entry(host.to_string()).or_default();
        entries.push_back(record);
        if entries.len() > HISTORY_CAP {
            entries.pop_front();
        }
        tracing::debug!(host, analyses = entries.len(), "telemetry recorded");
    }

    /// Record the metrics of a finished pass.
    pub fn record_pass(&self, host: &str, result: &SnapshotResult) {
        self.record(
            host,
            result.processing_time_ms,
            result.processed_nodes,
            result.total_nodes,
        );
    }

    /// Summarize everything recorded so far.
    pub fn analytics(&self) -> AnalyticsSummary {
        let history = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut hosts = HashMap::new();
        let mut total_analyses = 0u32;
        let mut time_sum = 0u64;
        let mut time_count = 0u64;

        for (host, entries) in history.iter() {
            if entries.is_empty() {
                continue;
            }
            let host_time: u64 = entries.iter().map(|r| r.processing_time_ms).sum();
            let host_elements: u64 = entries.iter().map(|r| u64::from(r.element_count)).sum();
            let count = entries.len() as u64;

            total_analyses += entries.len() as u32;
            time_sum += host_time;
            time_count += count;

            hosts.insert(
                host.clone(),
                HostStats {
                    analyses: entries.len() as u32,
                    average_processing_time_ms: rounded_average(host_time, count),
                    average_element_count: rounded_average(host_elements, count) as u32,
                    last_analyzed: entries.back().map(|r| r.timestamp).unwrap_or(0),
                },
            );
        }

        AnalyticsSummary {
            total_analyses,
            average_processing_time_ms: if time_count > 0 {
                rounded_average(time_sum, time_count)
            } else {
                0
            },
            hosts,
        }
    }
}

fn rounded_average(sum: u64, count: u64) -> u64 {
    (sum as f64 / count as f64).round() as u64
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_aggregator() {
        let telemetry = TelemetryAggregator::new();
        let summary = telemetry.analytics();
        assert_eq!(summary.total_analyses, 0);
        assert_eq!(summary.average_processing_time_ms, 0);
        assert!(summary.hosts.is_empty());
    }

    #[test]
    fn test_averages_are_rounded() {
        let telemetry = TelemetryAggregator::new();
        telemetry.record("shop.example", 100, 40, 300);
        telemetry.record("shop.example", 105, 45, 300);

        let summary = telemetry.analytics();
        let host = &summary.hosts["shop.example"];
        assert_eq!(host.analyses, 2);
        // 102.5 rounds up.
        assert_eq!(host.average_processing_time_ms, 103);
        assert_eq!(host.average_element_count, 43);
        assert!(host.last_analyzed > 0);
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let telemetry = TelemetryAggregator::new();
        for i in 0..15 {
            telemetry.record("news.example", i, 10, 100);
        }

        let summary = telemetry.analytics();
        let host = &summary.hosts["news.example"];
        assert_eq!(host.analyses, 10);
        // Records 0..5 were evicted, so the average covers 5..15.
        assert_eq!(host.average_processing_time_ms, 10);
    }

    #[test]
    fn test_global_average_spans_hosts() {
        let telemetry = TelemetryAggregator::new();
        telemetry.record("a.example", 100, 10, 50);
        telemetry.record("b.example", 300, 20, 80);

        let summary = telemetry.analytics();
        assert_eq!(summary.total_analyses, 2);
        assert_eq!(summary.average_processing_time_ms, 200);
        assert_eq!(summary.hosts.len(), 2);
    }
}
