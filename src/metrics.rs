//! Runtime counters and statistics for the scoring service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

/// Metrics collector for scored submissions.
pub struct ScoringMetrics {
    /// Submissions scored end to end.
    pub requests_scored: AtomicU64,
    /// Scored submissions whose verdict was fraudulent.
    pub fraud_verdicts: AtomicU64,
    /// Submissions rejected at validation.
    pub rejected_submissions: AtomicU64,
    /// Submissions that reached the classifier and failed there.
    pub inference_failures: AtomicU64,
    /// End-to-end processing times (in microseconds).
    processing_times: RwLock<Vec<u64>>,
    /// Fraud probability distribution buckets.
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation.
    start_time: Instant,
}

impl ScoringMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_scored: AtomicU64::new(0),
            fraud_verdicts: AtomicU64::new(0),
            rejected_submissions: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one scored submission.
    pub fn record_scored(&self, processing_time: Duration, fraud_probability: f64, is_fraud: bool) {
        self.requests_scored.fetch_add(1, Ordering::Relaxed);
        if is_fraud {
            self.fraud_verdicts.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (fraud_probability * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a submission rejected at validation.
    pub fn record_rejection(&self) {
        self.rejected_submissions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a classifier failure.
    pub fn record_failure(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
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
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (scored submissions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get fraud probability distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read().unwrap()
    }

    /// Point-in-time snapshot of all counters, for the stats endpoint.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_scored: self.requests_scored.load(Ordering::Relaxed),
            fraud_verdicts: self.fraud_verdicts.load(Ordering::Relaxed),
            rejected_submissions: self.rejected_submissions.load(Ordering::Relaxed),
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
            throughput_per_sec: self.get_throughput(),
            latency: self.get_processing_stats(),
            score_distribution: self.get_score_distribution(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let scored = self.requests_scored.load(Ordering::Relaxed);
        let fraud = self.fraud_verdicts.load(Ordering::Relaxed);
        let rejected = self.rejected_submissions.load(Ordering::Relaxed);
        let failures = self.inference_failures.load(Ordering::Relaxed);
        let fraud_rate = if scored > 0 {
            (fraud as f64 / scored as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let score_dist = self.get_score_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             FRAUD SCORING SERVICE - SESSION SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Submissions Scored: {:>8}  │  Fraud Verdicts: {:>6} ({:>4.1}%) ║",
            scored, fraud, fraud_rate
        );
        info!(
            "║ Rejected:           {:>8}  │  Inference Failures: {:>6}    ║",
            rejected, failures
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fraud Probability Distribution:                              ║");
        let total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of the collector, returned by the stats endpoint.
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub requests_scored: u64,
    pub fraud_verdicts: u64,
    pub rejected_submissions: u64,
    pub inference_failures: u64,
    pub throughput_per_sec: f64,
    pub latency: ProcessingStats,
    pub score_distribution: [u64; 10],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ScoringMetrics::new();

        metrics.record_scored(Duration::from_micros(100), 0.12, false);
        metrics.record_scored(Duration::from_micros(200), 0.83, true);
        metrics.record_rejection();
        metrics.record_failure();

        assert_eq!(metrics.requests_scored.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.fraud_verdicts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rejected_submissions.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.inference_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_score_distribution_buckets() {
        let metrics = ScoringMetrics::new();

        metrics.record_scored(Duration::from_micros(100), 0.05, false);
        metrics.record_scored(Duration::from_micros(100), 0.83, true);
        metrics.record_scored(Duration::from_micros(100), 0.89, true);
        // 1.0 lands in the top bucket, not out of bounds.
        metrics.record_scored(Duration::from_micros(100), 1.0, true);

        let dist = metrics.get_score_distribution();
        assert_eq!(dist[0], 1);
        assert_eq!(dist[8], 2);
        assert_eq!(dist[9], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ScoringMetrics::new();
        for us in [100_u64, 200, 300, 400, 500] {
            metrics.record_scored(Duration::from_micros(us), 0.5, false);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean_us, 300);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 500);
    }

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = ScoringMetrics::new();
        metrics.record_scored(Duration::from_micros(150), 0.95, true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_scored, 1);
        assert_eq!(snapshot.fraud_verdicts, 1);
        assert_eq!(snapshot.score_distribution[9], 1);
        assert_eq!(snapshot.latency.count, 1);
    }
}
