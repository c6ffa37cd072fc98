use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    vectors_stored: AtomicU64,
    batch_records_processed: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single vector accepted and written to the index.
    pub fn record_vector(&self) {
        self.vectors_stored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how many records a batch run wrote successfully.
    pub fn record_batch(&self, processed: u64) {
        self.batch_records_processed
            .fetch_add(processed, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            vectors_stored: self.vectors_stored.load(Ordering::Relaxed),
            batch_records_processed: self.batch_records_processed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of vectors written to the index since startup.
    pub vectors_stored: u64,
    /// Total content records written by batch runs since startup.
    pub batch_records_processed: u64,
}
