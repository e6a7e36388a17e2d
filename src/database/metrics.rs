//! Connection usage metrics.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by a live connection.
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    connects: AtomicU64,
    disconnects: AtomicU64,
    queries_executed: AtomicU64,
    query_errors: AtomicU64,
}

impl ConnectionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connect(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query_error(&self) {
        self.query_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConnectionMetricsSnapshot {
        ConnectionMetricsSnapshot {
            connects: self.connects.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            query_errors: self.query_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of connection metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionMetricsSnapshot {
    pub connects: u64,
    pub disconnects: u64,
    pub queries_executed: u64,
    pub query_errors: u64,
}
