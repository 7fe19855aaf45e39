use chronon_time::Time;
use hdrhistogram::Histogram;

/// Tracks latency percentiles for operations.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    histogram: Histogram<u64>,
}

impl LatencyTracker {
    /// Creates a new latency tracker.
    ///
    /// Auto-resizing, with 3 significant digits.
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new(3).expect("valid histogram config"),
        }
    }

    /// Records a latency measurement in nanoseconds.
    pub fn record(&mut self, latency_ns: u64) {
        self.histogram.record(latency_ns).ok();
    }

    /// Records a span of time, clamped at zero and rounded down to
    /// nanoseconds.
    pub fn record_time(&mut self, latency: Time) {
        let ns = u64::try_from(latency.get_nanoseconds()).unwrap_or(0);
        self.record(ns);
    }

    /// Returns the total number of recorded samples.
    pub fn count(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Returns the p50 (median) latency in nanoseconds.
    pub fn p50(&self) -> u64 {
        self.histogram.value_at_quantile(0.50)
    }

    /// Returns the p99 latency in nanoseconds.
    pub fn p99(&self) -> u64 {
        self.histogram.value_at_quantile(0.99)
    }

    /// Returns the p99.9 latency in nanoseconds.
    pub fn p999(&self) -> u64 {
        self.histogram.value_at_quantile(0.999)
    }

    /// Returns the maximum latency in nanoseconds.
    pub fn max(&self) -> u64 {
        self.histogram.max()
    }

    /// Returns the mean latency in nanoseconds.
    pub fn mean(&self) -> f64 {
        self.histogram.mean()
    }

    /// Exports latency statistics as JSON for CI integration.
    pub fn to_json(&self, operation: &str) -> String {
        serde_json::json!({
            "operation": operation,
            "count": self.count(),
            "p50_ns": self.p50(),
            "p99_ns": self.p99(),
            "p999_ns": self.p999(),
            "max_ns": self.max(),
            "mean_ns": self.mean(),
        })
        .to_string()
    }

    /// Prints a summary of latency statistics.
    pub fn print_summary(&self, operation: &str) {
        println!("{operation} latency:");
        for (label, value) in [
            ("p50", self.p50()),
            ("p99", self.p99()),
            ("p99.9", self.p999()),
            ("max", self.max()),
        ] {
            println!(
                "  {label:<6} {value:>10} ns ({:>8.2} μs)",
                value as f64 / 1000.0
            );
        }
        println!(
            "  {:<6} {:>10.0} ns ({:>8.2} μs)",
            "mean",
            self.mean(),
            self.mean() / 1000.0
        );
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}
