//! # chronon-bench: Workloads and benchmarks for chronon
//!
//! Provides the hold-model workload used by the `chronon` CLI and the
//! criterion benches, plus latency tracking for realtime runs.

// Benchmark code intentionally uses patterns that trigger some clippy lints
#![allow(clippy::cast_precision_loss)] // Latency stats use f64 for percentile calculations
//!
//! ## Benchmarks
//!
//! - **schedulers**: insert/remove cost of each scheduler at several queue sizes
//! - **simulator**: hold-model throughput through `DefaultSimulator`
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p chronon-bench
//!
//! # Run specific benchmark
//! cargo bench -p chronon-bench --bench schedulers
//!
//! # Save baseline for comparison
//! cargo bench -p chronon-bench --bench schedulers -- --save-baseline main
//! ```

mod hold;
mod latency;

pub use hold::{HoldModel, HoldReport, compare_schedulers, digests_agree};
pub use latency::LatencyTracker;
