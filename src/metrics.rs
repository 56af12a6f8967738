use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing registry activity.
#[derive(Default)]
pub struct RosterMetrics {
    students_created: AtomicU64,
    students_updated: AtomicU64,
    students_deleted: AtomicU64,
    summaries_generated: AtomicU64,
    summary_fallbacks: AtomicU64,
}

impl RosterMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful create.
    pub fn record_created(&self) {
        self.students_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful update.
    pub fn record_updated(&self) {
        self.students_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful delete.
    pub fn record_deleted(&self) {
        self.students_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a summary request; `fallback` marks responses carrying the embedded error text.
    pub fn record_summary(&self, fallback: bool) {
        self.summaries_generated.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.summary_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            students_created: self.students_created.load(Ordering::Relaxed),
            students_updated: self.students_updated.load(Ordering::Relaxed),
            students_deleted: self.students_deleted.load(Ordering::Relaxed),
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            summary_fallbacks: self.summary_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of registry counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Students created since startup.
    pub students_created: u64,
    /// Successful updates since startup.
    pub students_updated: u64,
    /// Students deleted since startup.
    pub students_deleted: u64,
    /// Summary requests answered (including fallbacks).
    pub summaries_generated: u64,
    /// Summary requests answered with the fallback text.
    pub summary_fallbacks: u64,
}
