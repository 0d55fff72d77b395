//! In-process metrics for the scoring service.

use crate::types::LoanDecision;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the scoring pipeline
pub struct ApplicationMetrics {
    /// Total applications scored
    pub applications_processed: AtomicU64,
    /// Total failed submissions
    pub failures: AtomicU64,
    /// Decisions by outcome
    decisions_by_outcome: RwLock<HashMap<String, u64>>,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Confidence score distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ApplicationMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            applications_processed: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            decisions_by_outcome: RwLock::new(HashMap::new()),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one scored application
    pub fn record_application(&self, processing_time: Duration, decision: &LoanDecision) {
        self.applications_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_outcome) = self.decisions_by_outcome.write() {
            *by_outcome
                .entry(decision.decision.as_str().to_string())
                .or_insert(0) += 1;
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the recent tail for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (decision.score * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a failed submission
    pub fn record_failure(&self, kind: &str) {
        self.failures.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Applications per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.applications_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Decision counts by outcome
    pub fn get_decision_mix(&self) -> HashMap<String, u64> {
        self.decisions_by_outcome
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Failure counts by error kind
    pub fn get_failure_mix(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Log a summary of all metrics
    pub fn print_summary(&self) {
        let processed = self.applications_processed.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let stats = self.get_processing_stats();

        info!(
            applications = processed,
            failures = failures,
            throughput = format!("{:.2}/s", self.get_throughput()),
            mean_latency_us = stats.mean_us,
            p95_latency_us = stats.p95_us,
            decision_mix = ?self.get_decision_mix(),
            failure_mix = ?self.get_failure_mix(),
            score_buckets = ?self.score_buckets.read().map(|b| *b).unwrap_or_default(),
            "Metrics summary"
        );
    }
}

impl Default for ApplicationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<ApplicationMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ApplicationMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Run the reporting loop until the process exits
    pub async fn start(&self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick fires immediately; skip it.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
