//! Atomic loader counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::TelemetrySnapshot;
use crate::feature::AccumulateReport;

/// Counters updated by load cycles.
#[derive(Debug)]
pub struct LoaderMetrics {
    started_at: Instant,
    cycles_started: AtomicU64,
    cycles_below_min_zoom: AtomicU64,
    cycles_nothing_new: AtomicU64,
    cycles_failed: AtomicU64,
    queries_issued: AtomicU64,
    tiles_requested: AtomicU64,
    features_received: AtomicU64,
    features_added: AtomicU64,
    duplicates_dropped: AtomicU64,
    missing_identity: AtomicU64,
    publishes: AtomicU64,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            cycles_started: AtomicU64::new(0),
            cycles_below_min_zoom: AtomicU64::new(0),
            cycles_nothing_new: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
            queries_issued: AtomicU64::new(0),
            tiles_requested: AtomicU64::new(0),
            features_received: AtomicU64::new(0),
            features_added: AtomicU64::new(0),
            duplicates_dropped: AtomicU64::new(0),
            missing_identity: AtomicU64::new(0),
            publishes: AtomicU64::new(0),
        }
    }

    pub fn cycle_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycle_below_min_zoom(&self) {
        self.cycles_below_min_zoom.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycle_nothing_new(&self) {
        self.cycles_nothing_new.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycle_failed(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// One source query covering `tiles` new tiles.
    pub fn query_issued(&self, tiles: usize) {
        self.queries_issued.fetch_add(1, Ordering::Relaxed);
        self.tiles_requested
            .fetch_add(tiles as u64, Ordering::Relaxed);
    }

    /// Record an accumulation pass.
    pub fn accumulated(&self, report: &AccumulateReport) {
        self.features_received
            .fetch_add(report.received as u64, Ordering::Relaxed);
        self.features_added
            .fetch_add(report.added as u64, Ordering::Relaxed);
        self.duplicates_dropped
            .fetch_add(report.duplicates as u64, Ordering::Relaxed);
        self.missing_identity
            .fetch_add(report.missing_identity as u64, Ordering::Relaxed);
    }

    pub fn published(&self) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime: self.started_at.elapsed(),
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_below_min_zoom: self.cycles_below_min_zoom.load(Ordering::Relaxed),
            cycles_nothing_new: self.cycles_nothing_new.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            queries_issued: self.queries_issued.load(Ordering::Relaxed),
            tiles_requested: self.tiles_requested.load(Ordering::Relaxed),
            features_received: self.features_received.load(Ordering::Relaxed),
            features_added: self.features_added.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
            missing_identity: self.missing_identity.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
        }
    }
}

impl Default for LoaderMetrics {
    fn default() -> Self {
        Self::new()
    }
}
