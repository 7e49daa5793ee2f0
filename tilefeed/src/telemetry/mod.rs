//! Loader telemetry for observability and user feedback.
//!
//! This module provides metrics collection and reporting for the feature
//! loader. It uses lock-free atomic counters so concurrent load cycles can
//! record without contention.
//!
//! # Architecture
//!
//! ```text
//! Load cycles ─────► LoaderMetrics ─────► TelemetrySnapshot ─────► Views
//!                    (atomic counters)    (point-in-time copy)     (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use tilefeed::telemetry::LoaderMetrics;
//!
//! let metrics = LoaderMetrics::new();
//! metrics.cycle_started();
//! metrics.query_issued(4);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.queries_issued, 1);
//! assert_eq!(snapshot.tiles_requested, 4);
//! ```

mod metrics;
mod snapshot;

pub use metrics::LoaderMetrics;
pub use snapshot::TelemetrySnapshot;
