//! Operation metrics for the save-store
//!
//! Counters only, never gating behavior. Each operation kind tracks
//! count, errors, and latency extremes with atomics; Relaxed ordering is
//! fine since metrics only need eventual consistency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// The operation kinds the collector distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Write,
    Update,
    Delete,
    Import,
    Export,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Read,
        OperationKind::Write,
        OperationKind::Update,
        OperationKind::Delete,
        OperationKind::Import,
        OperationKind::Export,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Import => "import",
            OperationKind::Export => "export",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug)]
struct OpCounters {
    count: AtomicU64,
    errors: AtomicU64,
    total_micros: AtomicU64,
    max_micros: AtomicU64,
    /// u64::MAX until the first sample lands.
    min_micros: AtomicU64,
}

impl Default for OpCounters {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            total_micros: AtomicU64::new(0),
            max_micros: AtomicU64::new(0),
            min_micros: AtomicU64::new(u64::MAX),
        }
    }
}

impl OpCounters {
    fn record(&self, elapsed_micros: u64, success: bool) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_micros.fetch_add(elapsed_micros, Ordering::Relaxed);
        if !success {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.max_micros.fetch_max(elapsed_micros, Ordering::Relaxed);
        self.min_micros.fetch_min(elapsed_micros, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of one operation kind's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpSnapshot {
    pub count: u64,
    pub errors: u64,
    pub total_micros: u64,
    pub max_micros: u64,
    /// 0 when no samples were recorded.
    pub min_micros: u64,
}

impl OpSnapshot {
    /// Mean latency in microseconds, 0 with no samples.
    pub fn mean_micros(&self) -> u64 {
        if self.count == 0 {
            return 0;
        }
        self.total_micros / self.count
    }

    /// Errors over total operations as a percentage, 0.0 with no samples.
    pub fn error_rate(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.errors as f64 / self.count as f64 * 100.0
    }
}

/// Records per-operation-kind latency, error, and throughput counters.
#[derive(Debug)]
pub struct MetricsCollector {
    counters: [OpCounters; 6],
    started: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            counters: Default::default(),
            started: Instant::now(),
        }
    }

    /// Starting point for timing one operation.
    pub fn start_timer(&self) -> Instant {
        Instant::now()
    }

    /// Records one completed operation timed from `started`.
    pub fn end_timer(&self, kind: OperationKind, started: Instant, success: bool) {
        let elapsed = started.elapsed().as_micros().min(u64::MAX as u128) as u64;
        self.record(kind, elapsed, success);
    }

    /// Records one completed operation with an explicit duration.
    pub fn record(&self, kind: OperationKind, elapsed_micros: u64, success: bool) {
        self.counters[kind.index()].record(elapsed_micros, success);
    }

    /// Snapshot of one operation kind.
    pub fn snapshot(&self, kind: OperationKind) -> OpSnapshot {
        let counters = &self.counters[kind.index()];
        let count = counters.count.load(Ordering::Relaxed);
        let min = counters.min_micros.load(Ordering::Relaxed);
        OpSnapshot {
            count,
            errors: counters.errors.load(Ordering::Relaxed),
            total_micros: counters.total_micros.load(Ordering::Relaxed),
            max_micros: counters.max_micros.load(Ordering::Relaxed),
            min_micros: if count == 0 { 0 } else { min },
        }
    }

    /// Operations per second for one kind since the collector was built.
    pub fn throughput(&self, kind: OperationKind) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        self.snapshot(kind).count as f64 / elapsed
    }

    /// Operations per second across every kind.
    pub fn total_throughput(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        let total: u64 = OperationKind::ALL
            .iter()
            .map(|kind| self.snapshot(*kind).count)
            .sum();
        total as f64 / elapsed
    }

    /// All counters rendered as one JSON object keyed by operation kind.
    pub fn to_json(&self) -> String {
        let mut out = String::from("{");
        for (i, kind) in OperationKind::ALL.iter().enumerate() {
            let snap = self.snapshot(*kind);
            if i > 0 {
                out.push(',');
            }
            out.push_str(&format!(
                r#""{}":{{"count":{},"errors":{},"mean_micros":{},"max_micros":{},"min_micros":{}}}"#,
                kind.as_str(),
                snap.count,
                snap.errors,
                snap.mean_micros(),
                snap.max_micros,
                snap.min_micros,
            ));
        }
        out.push('}');
        out
    }

    /// Human-readable multi-line report of the kinds that saw traffic.
    pub fn report(&self) -> String {
        let mut out = String::from("operation metrics:\n");
        for kind in OperationKind::ALL {
            let snap = self.snapshot(kind);
            if snap.count == 0 {
                continue;
            }
            out.push_str(&format!(
                "  {}: count={} errors={} mean={}us max={}us min={}us error_rate={:.2}%\n",
                kind.as_str(),
                snap.count,
                snap.errors,
                snap.mean_micros(),
                snap.max_micros,
                snap.min_micros,
                snap.error_rate(),
            ));
        }
        out
    }

    /// Zeroes every counter. Throughput keeps its original epoch.
    pub fn reset(&self) {
        for counters in &self.counters {
            counters.count.store(0, Ordering::Relaxed);
            counters.errors.store(0, Ordering::Relaxed);
            counters.total_micros.store(0, Ordering::Relaxed);
            counters.max_micros.store(0, Ordering::Relaxed);
            counters.min_micros.store(u64::MAX, Ordering::Relaxed);
        }
    }
}
