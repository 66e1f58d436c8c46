//! # Bus configuration.
//!
//! Provides [`BusConfig`], the construction-time settings of an
//! [`EventBus`](crate::EventBus).
//!
//! ## Sentinel values
//! - `stats_interval = 0` → treated as 1 (a report on every post)
//! - `recycle_threshold = 0` → a drained one-shot list is only recycled when
//!   entries were requeued or added while it ran

/// Default number of posts between two statistics reports.
pub const DEFAULT_STATS_INTERVAL: u64 = 25_000;

/// Default batch length under which a drained one-shot list is kept for reuse.
pub const DEFAULT_RECYCLE_THRESHOLD: usize = 32;

/// Construction-time configuration of the event bus.
///
/// ## Field semantics
/// - `statistics`: count posts per event type and log a periodic summary
/// - `stats_interval`: posts between two summaries (min 1)
/// - `recycle_threshold`: one-shot list recycling threshold
///
/// ## Notes
/// All fields are public. Statistics are a diagnostic: the summary is a log line
/// with no stable format.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Enables the statistics collector.
    ///
    /// When enabled, every post takes a short extra lock to bump its counter.
    pub statistics: bool,

    /// Number of posts between two statistics summaries.
    pub stats_interval: u64,

    /// A drained one-shot list shorter than this is kept for the next batch.
    pub recycle_threshold: usize,
}

impl BusConfig {
    /// Configuration with statistics enabled and default intervals.
    pub fn with_statistics() -> Self {
        Self {
            statistics: true,
            ..Self::default()
        }
    }

    /// Returns the statistics interval clamped to a minimum of 1.
    #[inline]
    pub fn stats_interval_clamped(&self) -> u64 {
        self.stats_interval.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `statistics = false`
    /// - `stats_interval = 25_000`
    /// - `recycle_threshold = 32`
    fn default() -> Self {
        Self {
            statistics: false,
            stats_interval: DEFAULT_STATS_INTERVAL,
            recycle_threshold: DEFAULT_RECYCLE_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BusConfig::default();
        assert!(!cfg.statistics);
        assert_eq!(cfg.stats_interval, 25_000);
        assert_eq!(cfg.recycle_threshold, 32);
        assert!(BusConfig::with_statistics().statistics);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let cfg = BusConfig {
            stats_interval: 0,
            ..BusConfig::default()
        };
        assert_eq!(cfg.stats_interval_clamped(), 1);
    }
}
