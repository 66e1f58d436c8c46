//! # Pending one-shot list for a single event type.
//!
//! ## Invoke cycle
//! ```text
//! invoke(event)
//!   ├─ lock: detach `pending` (live slot becomes empty)
//!   ├─ for entry in detached batch (no lock held):
//!   │     ├─ Ok(true)            ─► done, dropped
//!   │     ├─ Ok(false)           ─► add() back to the live list
//!   │     ├─ Err(Failed) / panic ─► logged, dropped
//!   │     └─ Err(Fatal)          ─► dropped, rest of batch re-added, propagate
//!   └─ lock: keep the drained Vec for reuse if small enough, or if entries
//!            are pending again and it is not much longer than them
//! ```
//!
//! Entries added while a batch runs land in the live list and are only seen by
//! the next `invoke`.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use parking_lot::Mutex;

use crate::error::{panic_message, FatalError, HandlerError};
use crate::events::EventType;

/// A one-shot callback: `Ok(true)` when done, `Ok(false)` to stay pending.
pub(crate) type OneShotFn = Box<dyn FnMut(&dyn Any) -> Result<bool, HandlerError> + Send>;

/// Handler name reported for one-shot failures.
const ONE_SHOT: &str = "one-shot";

#[derive(Default)]
struct Lists {
    pending: Option<Vec<OneShotFn>>,
    recycled: Option<Vec<OneShotFn>>,
}

pub(crate) struct OneShotSet {
    event: EventType,
    recycle_threshold: usize,
    lists: Mutex<Lists>,
}

impl OneShotSet {
    pub(crate) fn new(event: EventType, recycle_threshold: usize) -> Self {
        Self {
            event,
            recycle_threshold,
            lists: Mutex::new(Lists::default()),
        }
    }

    /// Appends `entry` to the live list, reusing a drained list if one is kept.
    pub(crate) fn add(&self, entry: OneShotFn) {
        let mut lists = self.lists.lock();
        let Lists { pending, recycled } = &mut *lists;
        pending
            .get_or_insert_with(|| recycled.take().unwrap_or_default())
            .push(entry);
    }

    /// Number of entries waiting in the live list.
    pub(crate) fn len(&self) -> usize {
        self.lists.lock().pending.as_ref().map_or(0, Vec::len)
    }

    /// Runs the currently pending batch against `event`.
    pub(crate) fn invoke(&self, event: &dyn Any) -> Result<(), FatalError> {
        let Some(mut batch) = self.lists.lock().pending.take() else {
            return Ok(());
        };
        let batch_len = batch.len();
        let mut result = Ok(());

        let mut drain = batch.drain(..);
        while let Some(mut entry) = drain.next() {
            match catch_unwind(AssertUnwindSafe(|| entry(event))) {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => self.add(entry),
                Ok(Err(HandlerError::Fatal { error })) => {
                    tracing::error!(
                        event = %self.event,
                        error = %error,
                        "fatal error in one-shot handler"
                    );
                    for rest in drain.by_ref() {
                        self.add(rest);
                    }
                    result = Err(FatalError {
                        handler: ONE_SHOT.to_string(),
                        event: self.event,
                        error,
                    });
                    break;
                }
                Ok(Err(err)) => {
                    tracing::error!(event = %self.event, error = %err, "one-shot handler failed");
                }
                Err(payload) => {
                    tracing::error!(
                        event = %self.event,
                        panic = %panic_message(payload.as_ref()),
                        "one-shot handler panicked"
                    );
                }
            }
        }
        drop(drain);

        let mut lists = self.lists.lock();
        let grown = lists
            .pending
            .as_ref()
            .is_some_and(|live| batch_len < live.len() + 16);
        if batch_len < self.recycle_threshold || grown {
            lists.recycled = Some(batch);
        }
        result
    }

    #[cfg(test)]
    fn has_recycled(&self) -> bool {
        self.lists.lock().recycled.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Ping;

    fn set() -> OneShotSet {
        OneShotSet::new(EventType::of::<Ping>(), 32)
    }

    fn counting(hits: &Arc<AtomicUsize>, done_after: usize) -> OneShotFn {
        let hits = Arc::clone(hits);
        Box::new(move |_: &dyn Any| Ok(hits.fetch_add(1, Ordering::SeqCst) + 1 >= done_after))
    }

    #[test]
    fn test_done_entry_is_dropped() {
        let s = set();
        let hits = Arc::new(AtomicUsize::new(0));
        s.add(counting(&hits, 1));

        s.invoke(&Ping).unwrap();
        s.invoke(&Ping).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn test_not_done_entry_is_requeued() {
        let s = set();
        let hits = Arc::new(AtomicUsize::new(0));
        s.add(counting(&hits, 3));

        for _ in 0..5 {
            s.invoke(&Ping).unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn test_failed_and_panicking_entries_are_dropped() {
        let s = set();
        let hits = Arc::new(AtomicUsize::new(0));
        s.add(Box::new(|_: &dyn Any| Err(HandlerError::failed("nope"))));
        s.add(Box::new(|_: &dyn Any| -> Result<bool, HandlerError> { panic!("boom") }));
        s.add(counting(&hits, 2));

        s.invoke(&Ping).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_fatal_requeues_unvisited_entries() {
        let s = set();
        let hits = Arc::new(AtomicUsize::new(0));
        s.add(Box::new(|_: &dyn Any| Err(HandlerError::fatal("abort"))));
        s.add(counting(&hits, 1));

        let err = s.invoke(&Ping).unwrap_err();
        assert_eq!(err.handler, "one-shot");
        assert_eq!(err.error, "abort");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(s.len(), 1);

        s.invoke(&Ping).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drained_list_is_recycled() {
        let s = set();
        let hits = Arc::new(AtomicUsize::new(0));
        s.add(counting(&hits, 1));
        assert!(!s.has_recycled());

        s.invoke(&Ping).unwrap();
        assert!(s.has_recycled());

        s.add(counting(&hits, 1));
        assert!(!s.has_recycled());
    }

    #[test]
    fn test_zero_threshold_recycles_only_with_live_list() {
        let s = OneShotSet::new(EventType::of::<Ping>(), 0);
        let hits = Arc::new(AtomicUsize::new(0));

        s.add(counting(&hits, 1));
        s.invoke(&Ping).unwrap();
        assert!(!s.has_recycled());

        let again = Arc::new(AtomicUsize::new(0));
        s.add(counting(&again, 2));
        s.invoke(&Ping).unwrap();
        assert_eq!(s.len(), 1);
        assert!(s.has_recycled());
    }
}
