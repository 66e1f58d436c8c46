//! # One-shot scheduler.
//!
//! Keeps one [`OneShotSet`] per concrete event type and publishes an immutable
//! `type → set` map so that `post` can find the set without locking.
//!
//! ## Rules
//! - Sets are created on first use and never removed; an empty set costs one
//!   map entry.
//! - The map lock is only taken to create a set or rebuild the snapshot; adding
//!   to an existing set only takes that set's lock.
//! - One-shots match the concrete posted type only; child-event fan-out does not
//!   apply to them.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::events::EventType;

use super::set::{OneShotFn, OneShotSet};

/// Immutable view: concrete event type → pending set.
pub(crate) type OneShotSnapshot = HashMap<EventType, Arc<OneShotSet>>;

pub(crate) struct OneShotScheduler {
    sets: Mutex<OneShotSnapshot>,
    snapshot: ArcSwapOption<OneShotSnapshot>,
    recycle_threshold: usize,
}

impl OneShotScheduler {
    pub(crate) fn new(recycle_threshold: usize) -> Self {
        Self {
            sets: Mutex::new(HashMap::new()),
            snapshot: ArcSwapOption::empty(),
            recycle_threshold,
        }
    }

    /// Queues `entry` for the next post of `ty`.
    pub(crate) fn add(&self, ty: EventType, entry: OneShotFn) {
        let set = {
            let mut sets = self.sets.lock();
            match sets.get(&ty) {
                Some(set) => Arc::clone(set),
                None => {
                    let set = Arc::new(OneShotSet::new(ty, self.recycle_threshold));
                    sets.insert(ty, Arc::clone(&set));
                    self.snapshot.store(None);
                    set
                }
            }
        };
        set.add(entry);
    }

    /// Current snapshot, rebuilt under the map lock if a set was created since.
    pub(crate) fn snapshot(&self) -> Arc<OneShotSnapshot> {
        if let Some(snapshot) = self.snapshot.load_full() {
            return snapshot;
        }

        let sets = self.sets.lock();
        if let Some(snapshot) = self.snapshot.load_full() {
            return snapshot;
        }
        let snapshot = Arc::new(sets.clone());
        self.snapshot.store(Some(Arc::clone(&snapshot)));
        tracing::trace!(event_types = sets.len(), "rebuilt one-shot snapshot");
        snapshot
    }

    /// Entries waiting for `ty`.
    pub(crate) fn pending(&self, ty: EventType) -> usize {
        self.sets.lock().get(&ty).map_or(0, |set| set.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    struct Pong;

    fn done() -> OneShotFn {
        Box::new(|_: &dyn std::any::Any| Ok(true))
    }

    #[test]
    fn test_snapshot_refreshes_on_new_type_only() {
        let sched = OneShotScheduler::new(32);
        sched.add(EventType::of::<Ping>(), done());

        let a = sched.snapshot();
        assert!(a.contains_key(&EventType::of::<Ping>()));

        // Same type: existing set, snapshot stays valid.
        sched.add(EventType::of::<Ping>(), done());
        assert!(Arc::ptr_eq(&a, &sched.snapshot()));
        assert_eq!(sched.pending(EventType::of::<Ping>()), 2);

        // New type: snapshot is rebuilt.
        sched.add(EventType::of::<Pong>(), done());
        let b = sched.snapshot();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_invoke_through_snapshot() {
        let sched = OneShotScheduler::new(32);
        sched.add(EventType::of::<Ping>(), done());

        let snap = sched.snapshot();
        snap[&EventType::of::<Ping>()].invoke(&Ping).unwrap();
        assert_eq!(sched.pending(EventType::of::<Ping>()), 0);
        assert_eq!(sched.pending(EventType::of::<Pong>()), 0);
    }
}
