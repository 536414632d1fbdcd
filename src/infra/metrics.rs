//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics so spawned fetch tasks and the UI loop can record without
//! locking. Reporting swaps the per-interval counters to zero.
//!
//! All atomics use Relaxed ordering. Nothing in the viewer reads them to
//! make decisions; tests and the reporter only observe them.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries for request latency (milliseconds)
/// Buckets: ≤5, ≤10, ≤20, ≤40, ≤80, ≤160, ≤320, ≤640, ≤1280, ≤2560, >2560
const BUCKET_BOUNDS: [u64; 10] = [5, 10, 20, 40, 80, 160, 320, 640, 1280, 2560];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_ms: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_ms)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;

    // Last bucket uses 2x the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [5, 10, 20, 40, 80, 160, 320, 640, 1280, 2560, 5120];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Frames drawn (monotonic)
    frames_total: AtomicU64,
    /// Frames drawn since last report
    frames_since_report: AtomicU64,
    /// Snapshot requests issued (monotonic)
    snapshots_requested: AtomicU64,
    /// Snapshots applied to the scene (monotonic)
    snapshots_applied: AtomicU64,
    /// Snapshot requests that failed (monotonic)
    snapshots_failed: AtomicU64,
    /// Responses dropped because a newer tick or a reset superseded them (monotonic)
    snapshots_stale: AtomicU64,
    /// Payloads missing required fields (monotonic)
    snapshots_malformed: AtomicU64,
    /// Interactive queries issued: population, coverage, economics, TLE (monotonic)
    queries_issued: AtomicU64,
    /// Interactive queries that failed (monotonic)
    queries_failed: AtomicU64,
    /// Session resets after satellite replacement (monotonic)
    session_resets: AtomicU64,
    /// Snapshot round-trip histogram (reset on report)
    fetch_latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Sum of snapshot round-trips (reset on report)
    fetch_latency_sum_ms: AtomicU64,
    /// Max snapshot round-trip (reset on report)
    fetch_latency_max_ms: AtomicU64,
    /// Snapshot round-trips since last report
    fetches_since_report: AtomicU64,
    /// Last report time (only accessed from reporter)
    last_report_time: Mutex<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            frames_total: AtomicU64::new(0),
            frames_since_report: AtomicU64::new(0),
            snapshots_requested: AtomicU64::new(0),
            snapshots_applied: AtomicU64::new(0),
            snapshots_failed: AtomicU64::new(0),
            snapshots_stale: AtomicU64::new(0),
            snapshots_malformed: AtomicU64::new(0),
            queries_issued: AtomicU64::new(0),
            queries_failed: AtomicU64::new(0),
            session_resets: AtomicU64::new(0),
            fetch_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            fetch_latency_sum_ms: AtomicU64::new(0),
            fetch_latency_max_ms: AtomicU64::new(0),
            fetches_since_report: AtomicU64::new(0),
            last_report_time: Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_frame(&self) {
        self.frames_total.fetch_add(1, Ordering::Relaxed);
        self.frames_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot_requested(&self) {
        self.snapshots_requested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed snapshot round-trip (success or failure)
    #[inline]
    pub fn record_fetch_latency(&self, latency_ms: u64) {
        self.fetches_since_report.fetch_add(1, Ordering::Relaxed);
        self.fetch_latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.fetch_latency_buckets[bucket_index(latency_ms)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.fetch_latency_max_ms, latency_ms);
    }

    #[inline]
    pub fn record_snapshot_applied(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot_failed(&self) {
        self.snapshots_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot_stale(&self) {
        self.snapshots_stale.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot_malformed(&self) {
        self.snapshots_malformed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_query(&self) {
        self.queries_issued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_query_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_session_reset(&self) {
        self.session_resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_total.load(Ordering::Relaxed)
    }

    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots_applied.load(Ordering::Relaxed)
    }

    pub fn snapshots_failed(&self) -> u64 {
        self.snapshots_failed.load(Ordering::Relaxed)
    }

    pub fn snapshots_stale(&self) -> u64 {
        self.snapshots_stale.load(Ordering::Relaxed)
    }

    pub fn snapshots_malformed(&self) -> u64 {
        self.snapshots_malformed.load(Ordering::Relaxed)
    }

    pub fn queries_issued(&self) -> u64 {
        self.queries_issued.load(Ordering::Relaxed)
    }

    /// Snapshot the counters, resetting the per-interval ones
    pub fn report(&self) -> MetricsSummary {
        let now = Instant::now();
        let elapsed_secs = {
            let mut last = self.last_report_time.lock();
            let elapsed = now.duration_since(*last).as_secs_f64();
            *last = now;
            elapsed
        };

        let frames = self.frames_since_report.swap(0, Ordering::Relaxed);
        let fetches = self.fetches_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.fetch_latency_sum_ms.swap(0, Ordering::Relaxed);
        let latency_max = self.fetch_latency_max_ms.swap(0, Ordering::Relaxed);
        let buckets = swap_buckets(&self.fetch_latency_buckets);

        MetricsSummary {
            frames_total: self.frames_total.load(Ordering::Relaxed),
            frames_per_sec: if elapsed_secs > 0.0 { frames as f64 / elapsed_secs } else { 0.0 },
            snapshots_requested: self.snapshots_requested.load(Ordering::Relaxed),
            snapshots_applied: self.snapshots_applied.load(Ordering::Relaxed),
            snapshots_failed: self.snapshots_failed.load(Ordering::Relaxed),
            snapshots_stale: self.snapshots_stale.load(Ordering::Relaxed),
            snapshots_malformed: self.snapshots_malformed.load(Ordering::Relaxed),
            queries_issued: self.queries_issued.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            session_resets: self.session_resets.load(Ordering::Relaxed),
            fetch_latency_avg_ms: if fetches > 0 { latency_sum / fetches } else { 0 },
            fetch_latency_max_ms: latency_max,
            fetch_latency_p50_ms: percentile_from_buckets(&buckets, 0.50),
            fetch_latency_p99_ms: percentile_from_buckets(&buckets, 0.99),
            fetch_latency_buckets: buckets,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub frames_total: u64,
    pub frames_per_sec: f64,
    pub snapshots_requested: u64,
    pub snapshots_applied: u64,
    pub snapshots_failed: u64,
    pub snapshots_stale: u64,
    pub snapshots_malformed: u64,
    pub queries_issued: u64,
    pub queries_failed: u64,
    pub session_resets: u64,
    pub fetch_latency_avg_ms: u64,
    pub fetch_latency_max_ms: u64,
    pub fetch_latency_p50_ms: u64,
    pub fetch_latency_p99_ms: u64,
    /// Bounds: ≤5, ≤10, ≤20, ≤40, ≤80, ≤160, ≤320, ≤640, ≤1280, ≤2560, >2560 ms
    pub fetch_latency_buckets: [u64; NUM_BUCKETS],
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            frames_total = %self.frames_total,
            fps = format!("{:.1}", self.frames_per_sec),
            snapshots_requested = %self.snapshots_requested,
            snapshots_applied = %self.snapshots_applied,
            snapshots_failed = %self.snapshots_failed,
            snapshots_stale = %self.snapshots_stale,
            snapshots_malformed = %self.snapshots_malformed,
            queries = %self.queries_issued,
            queries_failed = %self.queries_failed,
            resets = %self.session_resets,
            fetch_avg_ms = %self.fetch_latency_avg_ms,
            fetch_p99_ms = %self.fetch_latency_p99_ms,
            "metrics"
        );
    }
}
