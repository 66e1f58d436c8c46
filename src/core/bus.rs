//! # The event bus.
//!
//! [`EventBus`] ties the pieces together: the subscription registry, the one-shot
//! scheduler and the optional statistics collector.
//!
//! ## Post path
//! ```text
//! post(&event)
//!   ├─► ty = event.event_type()
//!   ├─► subscribers = registry.snapshot()      (lock-free unless dirty)
//!   ├─► one_shots   = scheduler.snapshot()     (lock-free unless dirty)
//!   ├─► one_shots[ty].invoke(event)            (detach, run, requeue)
//!   ├─► for route in subscribers[ty]:          (unordered)
//!   │       handler(upcast(event))
//!   │         ├─ Ok            ─► next
//!   │         ├─ Err(Failed)   ─► log, next
//!   │         ├─ panic         ─► log, next
//!   │         └─ Err(Fatal)    ─► log, abort post, return Err(FatalError)
//!   └─► statistics.record(ty)                  (if enabled)
//! ```
//!
//! ## Rules
//! - Everything runs on the caller's thread; `post` returns once every matching
//!   handler has run.
//! - No bus lock is held while a handler runs, so handlers may call back into
//!   `register`, `unregister`, `post` or `once`.
//! - A post that already fetched its snapshot finishes against it, even if a
//!   concurrent `unregister` completes in the meantime.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::{panic_message, FatalError, HandlerError, HierarchyError, RegisterError};
use crate::events::{ChildEvents, Event, EventType};
use crate::oneshot::{OneShotFn, OneShotScheduler, OneShotSnapshot};
use crate::subscribers::{Interests, Owner, Subscriber};

use super::config::BusConfig;
use super::registry::{RegistrySnapshot, SubscriptionRegistry};
use super::stats::{StatisticsCollector, StatsReport, StatsSnapshot};

struct Inner {
    config: BusConfig,
    registry: SubscriptionRegistry,
    one_shots: OneShotScheduler,
    stats: Option<StatisticsCollector>,
}

/// In-process typed event bus.
///
/// Cheap to clone: clones share the same registry and one-shot state.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use typebus::{EventBus, Interests, Owner};
///
/// struct GameTick;
///
/// let bus = EventBus::new();
/// let owner = Owner::new("ticker");
/// let ticks = Arc::new(AtomicUsize::new(0));
///
/// let t = Arc::clone(&ticks);
/// bus.register(&owner, Interests::new().on::<GameTick, _>("on_game_tick", move |_| {
///     t.fetch_add(1, Ordering::Relaxed);
///     Ok(())
/// }))?;
///
/// bus.post(&GameTick)?;
/// bus.unregister(&owner);
/// bus.post(&GameTick)?;
/// assert_eq!(ticks.load(Ordering::Relaxed), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Creates a bus without statistics.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Creates a bus with the given configuration.
    pub fn with_config(config: BusConfig) -> Self {
        let stats = config
            .statistics
            .then(|| StatisticsCollector::new(config.stats_interval_clamped()));
        Self {
            inner: Arc::new(Inner {
                registry: SubscriptionRegistry::new(),
                one_shots: OneShotScheduler::new(config.recycle_threshold),
                stats,
                config,
            }),
        }
    }

    /// Configuration this bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Declares the child events of `P`.
    ///
    /// Handlers registered for `P` **after** this call also receive every listed
    /// child, projected to `&P`. Declarations are write-once per parent.
    pub fn declare_children<P: Event>(
        &self,
        children: ChildEvents<P>,
    ) -> Result<(), HierarchyError> {
        let parent = children.parent();
        self.inner
            .registry
            .declare_children(parent, children.into_children())
    }

    /// Registers `interests` under `owner`.
    ///
    /// The whole batch is validated first; on error nothing is registered.
    /// Handlers already registered under the same `(owner, event type, name)`
    /// are kept as they are.
    pub fn register(&self, owner: &Owner, interests: Interests) -> Result<(), RegisterError> {
        match self.inner.registry.register(owner, interests) {
            Ok(inserted) => {
                tracing::debug!(owner = %owner, inserted, "registered handlers");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    owner = %owner,
                    error = %err,
                    label = err.as_label(),
                    "rejected handler declaration"
                );
                Err(err)
            }
        }
    }

    /// Registers a [`Subscriber`] under its own owner token.
    pub fn register_subscriber<S: Subscriber>(
        &self,
        subscriber: &Arc<S>,
    ) -> Result<(), RegisterError> {
        let mut interests = Interests::new();
        Arc::clone(subscriber).subscribe(&mut interests);
        self.register(subscriber.owner(), interests)
    }

    /// Removes every handler registered under `owner`. No-op for unknown owners.
    pub fn unregister(&self, owner: &Owner) {
        let removed = self.inner.registry.unregister(owner.id());
        if removed > 0 {
            tracing::debug!(owner = %owner, removed, "unregistered handlers");
        }
    }

    /// Removes every handler of `subscriber`.
    pub fn unregister_subscriber<S: Subscriber + ?Sized>(&self, subscriber: &S) {
        self.unregister(subscriber.owner());
    }

    /// Returns `true` if `owner` has at least one live handler.
    pub fn is_registered(&self, owner: &Owner) -> bool {
        self.inner.registry.is_registered(owner.id())
    }

    /// Returns `true` if a post of `E` would reach at least one steady-state handler.
    pub fn has_subscribers<E: Event>(&self) -> bool {
        !self
            .inner
            .registry
            .snapshot()
            .routes(&EventType::of::<E>())
            .is_empty()
    }

    /// Number of live subscriptions across all owners.
    pub fn subscription_count(&self) -> usize {
        self.inner.registry.counts().subscriptions
    }

    /// Number of owners with at least one live subscription.
    pub fn owner_count(&self) -> usize {
        self.inner.registry.counts().owners
    }

    /// Posts `event` to every matching handler, on this thread, sequentially.
    ///
    /// Pending one-shots for the event's concrete type run first, then the
    /// steady-state handlers in unspecified order. One-shots queued while this
    /// post runs are not run by it.
    ///
    /// Handler failures and panics are logged and never returned. The only error
    /// is a [`HandlerError::Fatal`], which stops the dispatch immediately.
    pub fn post(&self, event: &dyn Event) -> Result<(), FatalError> {
        let ty = event.event_type();
        let subscribers = self.inner.registry.snapshot();
        let one_shots = self.inner.one_shots.snapshot();

        let result = dispatch(ty, event.as_any(), &subscribers, &one_shots);

        if let Some(stats) = &self.inner.stats {
            if let Some((posts, per_type)) = stats.record(ty) {
                let report = StatsReport::new(posts, per_type, self.inner.registry.counts());
                tracing::debug!("{report}");
            }
        }
        result
    }

    /// Runs `f` on the next post of `E`, exactly once.
    pub fn once<E, F>(&self, f: F)
    where
        E: Event,
        F: FnOnce(&E) + Send + 'static,
    {
        let mut slot = Some(f);
        self.once_or_more::<E, _>(move |ev| {
            if let Some(f) = slot.take() {
                f(ev);
            }
            Ok(true)
        });
    }

    /// Runs `f` on each post of `E` until it returns `Ok(true)`.
    ///
    /// `Ok(false)` keeps it queued for the next post; an error or a panic drops
    /// it (a fatal error also aborts the post).
    pub fn once_or_more<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) -> Result<bool, HandlerError> + Send + 'static,
    {
        let entry: OneShotFn = Box::new(move |ev: &dyn Any| match ev.downcast_ref::<E>() {
            Some(ev) => f(ev),
            None => Ok(false),
        });
        self.inner.one_shots.add(EventType::of::<E>(), entry);
    }

    /// Resolves with a clone of the next posted `E`.
    ///
    /// The receiver errors only if the bus drops the pending one-shot, which
    /// does not happen while the bus is alive.
    pub fn next<E>(&self) -> oneshot::Receiver<E>
    where
        E: Event + Clone + Send,
    {
        let (tx, rx) = oneshot::channel();
        self.once::<E, _>(move |ev| {
            // The receiver may have been dropped; nothing to report then.
            let _ = tx.send(ev.clone());
        });
        rx
    }

    /// One-shots waiting for the next post of `E`.
    pub fn pending_one_shots<E: Event>(&self) -> usize {
        self.inner.one_shots.pending(EventType::of::<E>())
    }

    /// Statistics counters, or `None` when statistics are disabled.
    pub fn statistics(&self) -> Option<StatsSnapshot> {
        self.inner.stats.as_ref().map(StatisticsCollector::snapshot)
    }
}

/// Runs one-shots then steady-state routes for `ty`.
fn dispatch(
    ty: EventType,
    event: &dyn Any,
    subscribers: &RegistrySnapshot,
    one_shots: &OneShotSnapshot,
) -> Result<(), FatalError> {
    if let Some(set) = one_shots.get(&ty) {
        set.invoke(event)?;
    }

    for route in subscribers.routes(&ty) {
        let target = match route.upcast {
            Some(upcast) => match upcast(event) {
                Some(parent) => parent,
                None => continue,
            },
            None => event,
        };

        let sub = &route.subscription;
        match catch_unwind(AssertUnwindSafe(|| (sub.handler)(target))) {
            Ok(Ok(())) => {}
            Ok(Err(HandlerError::Fatal { error })) => {
                tracing::error!(
                    owner = %sub.owner,
                    handler = %sub.name,
                    event = %ty,
                    error = %error,
                    "fatal error in event subscriber; aborting dispatch"
                );
                return Err(FatalError {
                    handler: sub.name.to_string(),
                    event: ty,
                    error,
                });
            }
            Ok(Err(err)) => {
                tracing::error!(
                    owner = %sub.owner,
                    handler = %sub.name,
                    event = %ty,
                    error = %err,
                    "event subscriber failed"
                );
            }
            Err(payload) => {
                tracing::error!(
                    owner = %sub.owner,
                    handler = %sub.name,
                    event = %ty,
                    panic = %panic_message(payload.as_ref()),
                    "event subscriber panicked"
                );
            }
        }
    }
    Ok(())
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.inner.registry.counts();
        f.debug_struct("EventBus")
            .field("owners", &counts.owners)
            .field("subscriptions", &counts.subscriptions)
            .field("event_types", &counts.event_types)
            .field("statistics", &self.inner.stats.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq)]
    struct Tick(u32);

    fn counter() -> (
        Arc<AtomicUsize>,
        impl Fn(&Tick) -> Result<(), HandlerError> + Send + Sync + 'static,
    ) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (hits, move |_: &Tick| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_post_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.post(&Tick(1)).unwrap();
        assert!(!bus.has_subscribers::<Tick>());
        assert!(bus.statistics().is_none());
    }

    #[test]
    fn test_register_subscribe_unregister() {
        let bus = EventBus::new();
        let owner = Owner::new("t");
        let (hits, handler) = counter();
        bus.register(&owner, Interests::new().on::<Tick, _>("on_tick", handler))
            .unwrap();
        assert!(bus.is_registered(&owner));
        assert!(bus.has_subscribers::<Tick>());
        assert_eq!(bus.subscription_count(), 1);
        assert_eq!(bus.owner_count(), 1);

        bus.post(&Tick(1)).unwrap();
        bus.unregister(&owner);
        bus.post(&Tick(2)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!bus.is_registered(&owner));
    }

    #[test]
    fn test_handler_can_unregister_itself_mid_post() {
        let bus = EventBus::new();
        let owner = Owner::new("self-removing");
        let hits = Arc::new(AtomicUsize::new(0));

        let (b, o, h) = (bus.clone(), owner.clone(), Arc::clone(&hits));
        bus.register(
            &owner,
            Interests::new().on::<Tick, _>("on_tick", move |_| {
                h.fetch_add(1, Ordering::SeqCst);
                b.unregister(&o);
                Ok(())
            }),
        )
        .unwrap();

        bus.post(&Tick(1)).unwrap();
        bus.post(&Tick(2)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_once_added_during_post_waits_for_next_post() {
        let bus = EventBus::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let (b, f) = (bus.clone(), Arc::clone(&fired));
        bus.once::<Tick, _>(move |_| {
            let f = Arc::clone(&f);
            b.once::<Tick, _>(move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            });
        });

        bus.post(&Tick(1)).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(bus.pending_one_shots::<Tick>(), 1);

        bus.post(&Tick(2)).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(bus.pending_one_shots::<Tick>(), 0);
    }

    #[test]
    fn test_one_shots_run_before_subscribers() {
        let bus = EventBus::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        bus.register(
            &Owner::new("steady"),
            Interests::new().on::<Tick, _>("on_tick", move |_| {
                o.lock().push("subscriber");
                Ok(())
            }),
        )
        .unwrap();
        let o = Arc::clone(&order);
        bus.once::<Tick, _>(move |_| o.lock().push("one-shot"));

        bus.post(&Tick(1)).unwrap();
        assert_eq!(*order.lock(), vec!["one-shot", "subscriber"]);
    }

    #[tokio::test]
    async fn test_next_resolves_with_posted_event() {
        let bus = EventBus::new();
        let rx = bus.next::<Tick>();
        bus.post(&Tick(9)).unwrap();
        assert_eq!(rx.await.unwrap(), Tick(9));
        assert_eq!(bus.pending_one_shots::<Tick>(), 0);
    }

    #[test]
    fn test_next_with_dropped_receiver_is_harmless() {
        let bus = EventBus::new();
        drop(bus.next::<Tick>());
        bus.post(&Tick(1)).unwrap();
        assert_eq!(bus.pending_one_shots::<Tick>(), 0);
    }

    #[test]
    fn test_debug_reports_counts() {
        let bus = EventBus::new();
        let (_, handler) = counter();
        bus.register(
            &Owner::new("d"),
            Interests::new().on::<Tick, _>("on_tick", handler),
        )
        .unwrap();
        let dbg = format!("{bus:?}");
        assert!(dbg.contains("subscriptions: 1"));
    }
}
