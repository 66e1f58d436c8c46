//! # Post statistics.
//!
//! [`StatisticsCollector`] counts posts per concrete event type. Every
//! `stats_interval` posts the bus logs one [`StatsReport`] line at `debug` level.
//! It is a diagnostic only: nothing in the dispatch contract depends on it.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::events::EventType;

use super::registry::RegistryCounts;

/// Summary emitted every `stats_interval` posts.
#[derive(Debug, Clone)]
pub struct StatsReport {
    /// Total posts so far.
    pub posts: u64,
    /// Owners with at least one subscription.
    pub owners: usize,
    /// Live subscriptions.
    pub subscriptions: usize,
    /// Event types with at least one route.
    pub event_types: usize,
    /// Post counts per event type, most posted first.
    pub per_type: Vec<(EventType, u64)>,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event bus statistics: {} posts, {} subscribed owners, {} subscriptions, \
             {} event types",
            self.posts, self.owners, self.subscriptions, self.event_types
        )?;
        for (i, (ty, count)) in self.per_type.iter().enumerate() {
            let sep = if i == 0 { "; " } else { ", " };
            write!(f, "{sep}{count} {ty}")?;
        }
        Ok(())
    }
}

/// Counters as returned by `EventBus::statistics`.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    /// Total posts so far.
    pub posts: u64,
    /// Number of summaries emitted so far.
    pub reports: u64,
    /// Post counts per event type.
    pub per_type: HashMap<EventType, u64>,
}

impl StatsSnapshot {
    /// Posts recorded for `ty`.
    pub fn count(&self, ty: EventType) -> u64 {
        self.per_type.get(&ty).copied().unwrap_or(0)
    }
}

#[derive(Default)]
struct Counters {
    posts: u64,
    reports: u64,
    per_type: HashMap<EventType, u64>,
}

pub(crate) struct StatisticsCollector {
    interval: u64,
    counters: Mutex<Counters>,
}

impl StatisticsCollector {
    pub(crate) fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Counts one post of `ty`.
    ///
    /// When the interval is reached, returns the per-type counts (sorted, most
    /// posted first) and the total, and marks a report as emitted.
    pub(crate) fn record(&self, ty: EventType) -> Option<(u64, Vec<(EventType, u64)>)> {
        let mut c = self.counters.lock();
        *c.per_type.entry(ty).or_insert(0) += 1;
        c.posts += 1;
        if c.posts % self.interval != 0 {
            return None;
        }

        c.reports += 1;
        let mut per_type: Vec<(EventType, u64)> =
            c.per_type.iter().map(|(ty, n)| (*ty, *n)).collect();
        per_type.sort_unstable_by(|a, b| b.1.cmp(&a.1));
        Some((c.posts, per_type))
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        let c = self.counters.lock();
        StatsSnapshot {
            posts: c.posts,
            reports: c.reports,
            per_type: c.per_type.clone(),
        }
    }
}

impl StatsReport {
    pub(crate) fn new(
        posts: u64,
        per_type: Vec<(EventType, u64)>,
        registry: RegistryCounts,
    ) -> Self {
        Self {
            posts,
            owners: registry.owners,
            subscriptions: registry.subscriptions,
            event_types: registry.event_types,
            per_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn test_report_every_interval() {
        let stats = StatisticsCollector::new(3);
        assert!(stats.record(EventType::of::<A>()).is_none());
        assert!(stats.record(EventType::of::<B>()).is_none());

        let (posts, per_type) = stats.record(EventType::of::<A>()).unwrap();
        assert_eq!(posts, 3);
        assert_eq!(per_type[0], (EventType::of::<A>(), 2));
        assert_eq!(per_type[1], (EventType::of::<B>(), 1));

        let snap = stats.snapshot();
        assert_eq!(snap.posts, 3);
        assert_eq!(snap.reports, 1);
        assert_eq!(snap.count(EventType::of::<B>()), 1);
    }

    #[test]
    fn test_report_formats_on_one_line() {
        let report = StatsReport::new(
            10,
            vec![(EventType::of::<A>(), 7), (EventType::of::<B>(), 3)],
            RegistryCounts {
                owners: 1,
                subscriptions: 2,
                event_types: 2,
            },
        );
        let line = report.to_string();
        assert!(!line.contains('\n'));
        assert!(line.starts_with("event bus statistics: 10 posts"));
        assert!(line.ends_with("; 7 A, 3 B"));
    }
}
