//! Point-in-time telemetry.

use std::fmt;
use std::time::Duration;

/// Copy of the loader counters at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub uptime: Duration,
    pub cycles_started: u64,
    pub cycles_below_min_zoom: u64,
    pub cycles_nothing_new: u64,
    pub cycles_failed: u64,
    pub queries_issued: u64,
    pub tiles_requested: u64,
    pub features_received: u64,
    pub features_added: u64,
    pub duplicates_dropped: u64,
    pub missing_identity: u64,
    pub publishes: u64,
}

impl TelemetrySnapshot {
    /// Share of received features that were already held (0.0 - 1.0).
    pub fn duplicate_rate(&self) -> f64 {
        if self.features_received == 0 {
            return 0.0;
        }
        self.duplicates_dropped as f64 / self.features_received as f64
    }

    /// Uptime formatted as `1h 2m 3s`.
    pub fn uptime_human(&self) -> String {
        let secs = self.uptime.as_secs();
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if h > 0 {
            format!("{}h {}m {}s", h, m, s)
        } else if m > 0 {
            format!("{}m {}s", m, s)
        } else {
            format!("{}s", s)
        }
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  Cycles:   {} started ({} below min zoom, {} nothing new, {} failed)",
            self.cycles_started, self.cycles_below_min_zoom, self.cycles_nothing_new, self.cycles_failed
        )?;
        writeln!(
            f,
            "  Queries:  {} covering {} tiles",
            self.queries_issued, self.tiles_requested
        )?;
        writeln!(
            f,
            "  Features: {} received, {} added, {} duplicates ({:.0}%)",
            self.features_received,
            self.features_added,
            self.duplicates_dropped,
            self.duplicate_rate() * 100.0
        )?;
        if self.missing_identity > 0 {
            writeln!(f, "  Missing identity values: {}", self.missing_identity)?;
        }
        write!(f, "  Publishes: {}  Uptime: {}", self.publishes, self.uptime_human())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_rate() {
        let s = TelemetrySnapshot {
            features_received: 8,
            duplicates_dropped: 2,
            ..Default::default()
        };
        assert!((s.duplicate_rate() - 0.25).abs() < f64::EPSILON);
        assert_eq!(TelemetrySnapshot::default().duplicate_rate(), 0.0);
    }

    #[test]
    fn test_uptime_human() {
        let mut s = TelemetrySnapshot::default();
        s.uptime = Duration::from_secs(42);
        assert_eq!(s.uptime_human(), "42s");
        s.uptime = Duration::from_secs(125);
        assert_eq!(s.uptime_human(), "2m 5s");
        s.uptime = Duration::from_secs(3723);
        assert_eq!(s.uptime_human(), "1h 2m 3s");
    }

    #[test]
    fn test_display_mentions_missing_identity_only_when_present() {
        let mut s = TelemetrySnapshot::default();
        assert!(!s.to_string().contains("Missing identity"));
        s.missing_identity = 3;
        assert!(s.to_string().contains("Missing identity values: 3"));
    }
}
