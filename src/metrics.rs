//! Request statistics tracking for the screening endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the screening service
pub struct RequestMetrics {
    /// Total successful screenings
    pub requests_served: AtomicU64,
    /// Total failed requests (extraction or inference errors)
    pub requests_failed: AtomicU64,
    /// Request latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// How often each condition came out on top
    top_conditions: RwLock<HashMap<&'static str, u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl RequestMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_served: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            top_conditions: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a completed screening
    pub fn record_success(&self, latency: Duration, top_condition: &'static str) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            // Keep only the most recent samples
            if latencies.len() > 10_000 {
                latencies.drain(0..5_000);
            }
        }

        if let Ok(mut counts) = self.top_conditions.write() {
            *counts.entry(top_condition).or_insert(0) += 1;
        }
    }

    /// Record a failed request
    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let latencies = match self.latencies.read() {
            Ok(latencies) => latencies,
            Err(_) => return LatencyStats::default(),
        };
        if latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = latencies.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get top-condition counts
    pub fn get_top_conditions(&self) -> HashMap<&'static str, u64> {
        self.top_conditions
            .read()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let served = self.requests_served.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let stats = self.get_latency_stats();

        info!(
            served = served,
            failed = failed,
            throughput = format!("{:.1} req/s", self.get_throughput()),
            "Screening service summary"
        );
        info!(
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            max_us = stats.max_us,
            "Request latency"
        );

        for (condition, count) in self.get_top_conditions() {
            let pct = if served > 0 {
                (count as f64 / served as f64) * 100.0
            } else {
                0.0
            };
            info!(condition = condition, count = count, pct = format!("{:.1}%", pct), "Top prediction");
        }
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Request latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic reporter that logs metric summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<RequestMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<RequestMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = RequestMetrics::new();

        metrics.record_success(Duration::from_micros(100), "Healthy");
        metrics.record_success(Duration::from_micros(200), "Anemia");
        metrics.record_success(Duration::from_micros(300), "Healthy");
        metrics.record_failure();

        assert_eq!(metrics.requests_served.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.requests_failed.load(Ordering::Relaxed), 1);

        let counts = metrics.get_top_conditions();
        assert_eq!(counts.get("Healthy"), Some(&2));
        assert_eq!(counts.get("Anemia"), Some(&1));
    }

    #[test]
    fn test_latency_stats() {
        let metrics = RequestMetrics::new();

        for us in [100_u64, 200, 300, 400] {
            metrics.record_success(Duration::from_micros(us), "Healthy");
        }

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }

    #[test]
    fn test_empty_latency_stats() {
        let metrics = RequestMetrics::new();
        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean_us, 0);
    }
}
