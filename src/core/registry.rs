//! # Subscription registry with a lazily rebuilt snapshot.
//!
//! The registry owns every live [`Subscription`] in two indices and publishes an
//! immutable [`RegistrySnapshot`] that `post` reads without locking.
//!
//! ## Architecture
//! ```text
//! register / unregister / declare_children
//!        │  (mutation lock)
//!        ▼
//!   State ─┬─ by_owner:  OwnerId   → { SubscriptionKey → Subscription }
//!          ├─ by_event:  EventType → { SubscriptionKey → Route }
//!          └─ hierarchy: parent    → [children]
//!        │
//!        └─► snapshot.store(None)            (dirty)
//!
//! post ──► snapshot.load_full() ── Some ──► lock-free lookup
//!                               └─ None ──► lock, rebuild once, store, lookup
//! ```
//!
//! ## Rules
//! - A snapshot always reflects a completed mutation: it is rebuilt under the
//!   same lock that guards mutation.
//! - The dirty marker (`None`) is only cleared while holding that lock.
//! - Readers keep their snapshot alive through the `Arc` even if a mutation
//!   swaps it out mid-dispatch.
//! - Children are expanded at registration time; a later `declare_children`
//!   does not reach handlers that are already registered.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::error::{HierarchyError, RegisterError};
use crate::events::{ChildType, EventType, Hierarchy, Upcast};
use crate::subscribers::{ErasedHandler, Interests, Owner, OwnerId};

/// Dedup key: `(owner, declared event type, handler name)`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct SubscriptionKey {
    owner: OwnerId,
    event: EventType,
    name: Cow<'static, str>,
}

/// A registered handler.
pub(crate) struct Subscription {
    pub(crate) owner: Owner,
    pub(crate) event: EventType,
    pub(crate) name: Cow<'static, str>,
    pub(crate) handler: Arc<ErasedHandler>,
    /// Every event type this subscription is indexed under (declared + children).
    indexed_under: Vec<EventType>,
}

impl Subscription {
    fn key(&self) -> SubscriptionKey {
        SubscriptionKey {
            owner: self.owner.id(),
            event: self.event,
            name: self.name.clone(),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("owner", &self.owner)
            .field("event", &self.event)
            .field("name", &self.name)
            .finish()
    }
}

/// A subscription as seen from one concrete event type.
///
/// `upcast` is set when the route comes from a child-event expansion.
#[derive(Clone)]
pub(crate) struct Route {
    pub(crate) subscription: Arc<Subscription>,
    pub(crate) upcast: Option<Upcast>,
}

/// Immutable view: concrete event type → routes.
pub(crate) struct RegistrySnapshot {
    routes: HashMap<EventType, Box<[Route]>>,
}

impl RegistrySnapshot {
    fn build(by_event: &HashMap<EventType, HashMap<SubscriptionKey, Route>>) -> Self {
        let routes = by_event
            .iter()
            .map(|(ty, subs)| (*ty, subs.values().cloned().collect()))
            .collect();
        Self { routes }
    }

    /// Routes bound to `ty`; empty when nothing is subscribed.
    pub(crate) fn routes(&self, ty: &EventType) -> &[Route] {
        match self.routes.get(ty) {
            Some(routes) => &routes[..],
            None => &[],
        }
    }

    #[cfg(test)]
    pub(crate) fn event_types(&self) -> usize {
        self.routes.len()
    }
}

/// Point-in-time counters for statistics and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RegistryCounts {
    pub(crate) owners: usize,
    pub(crate) subscriptions: usize,
    pub(crate) event_types: usize,
}

#[derive(Default)]
struct State {
    by_owner: HashMap<OwnerId, HashMap<SubscriptionKey, Arc<Subscription>>>,
    by_event: HashMap<EventType, HashMap<SubscriptionKey, Route>>,
    hierarchy: Hierarchy,
}

/// Live subscription indices plus the cached snapshot.
pub(crate) struct SubscriptionRegistry {
    state: Mutex<State>,
    snapshot: ArcSwapOption<RegistrySnapshot>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            snapshot: ArcSwapOption::empty(),
        }
    }

    /// Declares the children of `parent` (write-once).
    pub(crate) fn declare_children(
        &self,
        parent: EventType,
        children: Vec<ChildType>,
    ) -> Result<(), HierarchyError> {
        let mut state = self.state.lock();
        if state.by_event.contains_key(&parent) {
            tracing::warn!(
                parent = %parent,
                "child events declared after handlers were registered; \
                 existing handlers are not expanded"
            );
        }
        state.hierarchy.declare(parent, children)
    }

    /// Validates and inserts `interests` under `owner`.
    ///
    /// Returns the number of subscriptions actually inserted; already-present
    /// `(owner, event, name)` triples are skipped.
    pub(crate) fn register(
        &self,
        owner: &Owner,
        interests: Interests,
    ) -> Result<usize, RegisterError> {
        let entries = interests.into_entries();
        for interest in &entries {
            if interest.name.is_empty() {
                return Err(RegisterError::EmptyHandlerName {
                    event: interest.event,
                });
            }
            if interest.event.is_primitive() {
                return Err(RegisterError::PrimitiveEvent {
                    handler: interest.name.to_string(),
                    event: interest.event,
                });
            }
        }

        let mut state = self.state.lock();
        let mut inserted = 0;

        for interest in entries {
            let key = SubscriptionKey {
                owner: owner.id(),
                event: interest.event,
                name: interest.name.clone(),
            };
            if state
                .by_owner
                .get(&owner.id())
                .is_some_and(|subs| subs.contains_key(&key))
            {
                tracing::trace!(
                    owner = %owner,
                    handler = %interest.name,
                    "handler already registered"
                );
                continue;
            }

            let children = state.hierarchy.children_of(&interest.event);
            let mut indexed_under = vec![interest.event];
            if let Some(children) = &children {
                indexed_under.extend(children.iter().map(|c| c.ty));
            }

            let subscription = Arc::new(Subscription {
                owner: owner.clone(),
                event: interest.event,
                name: interest.name,
                handler: interest.handler,
                indexed_under,
            });

            state.by_event.entry(subscription.event).or_default().insert(
                key.clone(),
                Route {
                    subscription: Arc::clone(&subscription),
                    upcast: None,
                },
            );
            for child in children.iter().flat_map(|c| c.iter()) {
                state.by_event.entry(child.ty).or_default().insert(
                    key.clone(),
                    Route {
                        subscription: Arc::clone(&subscription),
                        upcast: Some(child.upcast),
                    },
                );
            }
            state
                .by_owner
                .entry(owner.id())
                .or_default()
                .insert(key, subscription);
            inserted += 1;
        }

        if inserted > 0 {
            self.snapshot.store(None);
        }
        Ok(inserted)
    }

    /// Removes every subscription of `owner`. Returns how many were removed.
    pub(crate) fn unregister(&self, owner: OwnerId) -> usize {
        let mut state = self.state.lock();
        let Some(subs) = state.by_owner.remove(&owner) else {
            return 0;
        };

        for subscription in subs.values() {
            let key = subscription.key();
            for ty in &subscription.indexed_under {
                if let Some(routes) = state.by_event.get_mut(ty) {
                    routes.remove(&key);
                    if routes.is_empty() {
                        state.by_event.remove(ty);
                    }
                }
            }
        }

        self.snapshot.store(None);
        subs.len()
    }

    /// Current snapshot, rebuilt under the mutation lock if dirty.
    pub(crate) fn snapshot(&self) -> Arc<RegistrySnapshot> {
        if let Some(snapshot) = self.snapshot.load_full() {
            return snapshot;
        }

        let state = self.state.lock();
        if let Some(snapshot) = self.snapshot.load_full() {
            return snapshot;
        }
        let snapshot = Arc::new(RegistrySnapshot::build(&state.by_event));
        self.snapshot.store(Some(Arc::clone(&snapshot)));
        tracing::trace!(event_types = state.by_event.len(), "rebuilt subscriber snapshot");
        snapshot
    }

    pub(crate) fn is_registered(&self, owner: OwnerId) -> bool {
        self.state.lock().by_owner.contains_key(&owner)
    }

    pub(crate) fn counts(&self) -> RegistryCounts {
        let state = self.state.lock();
        RegistryCounts {
            owners: state.by_owner.len(),
            subscriptions: state.by_owner.values().map(HashMap::len).sum(),
            event_types: state.by_event.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::events::ChildEvents;

    struct Tick;
    struct Parent;
    struct Child(Parent);

    impl AsRef<Parent> for Child {
        fn as_ref(&self) -> &Parent {
            &self.0
        }
    }

    fn noop(_: &Tick) -> Result<(), HandlerError> {
        Ok(())
    }

    #[test]
    fn test_register_is_idempotent() {
        let reg = SubscriptionRegistry::new();
        let owner = Owner::new("o");

        let on_tick = || Interests::new().on::<Tick, _>("on_tick", noop);
        assert_eq!(reg.register(&owner, on_tick()).unwrap(), 1);
        assert_eq!(reg.register(&owner, on_tick()).unwrap(), 0);

        let snap = reg.snapshot();
        assert_eq!(snap.routes(&EventType::of::<Tick>()).len(), 1);
        assert_eq!(reg.counts().subscriptions, 1);
    }

    #[test]
    fn test_same_name_different_owner_is_distinct() {
        let reg = SubscriptionRegistry::new();
        reg.register(&Owner::new("a"), Interests::new().on::<Tick, _>("on_tick", noop)).unwrap();
        reg.register(&Owner::new("b"), Interests::new().on::<Tick, _>("on_tick", noop)).unwrap();
        assert_eq!(reg.snapshot().routes(&EventType::of::<Tick>()).len(), 2);
    }

    #[test]
    fn test_snapshot_cached_until_mutation() {
        let reg = SubscriptionRegistry::new();
        let owner = Owner::new("o");
        reg.register(&owner, Interests::new().on::<Tick, _>("on_tick", noop)).unwrap();

        let a = reg.snapshot();
        let b = reg.snapshot();
        assert!(Arc::ptr_eq(&a, &b));

        reg.unregister(owner.id());
        let c = reg.snapshot();
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(c.routes(&EventType::of::<Tick>()).is_empty());
        // The old snapshot is still usable by an in-flight reader.
        assert_eq!(a.routes(&EventType::of::<Tick>()).len(), 1);
    }

    #[test]
    fn test_duplicate_register_keeps_snapshot() {
        let reg = SubscriptionRegistry::new();
        let owner = Owner::new("o");
        reg.register(&owner, Interests::new().on::<Tick, _>("on_tick", noop)).unwrap();
        let a = reg.snapshot();
        reg.register(&owner, Interests::new().on::<Tick, _>("on_tick", noop)).unwrap();
        assert!(Arc::ptr_eq(&a, &reg.snapshot()));
    }

    #[test]
    fn test_unregister_clears_both_indices() {
        let reg = SubscriptionRegistry::new();
        let owner = Owner::new("o");
        reg.register(&owner, Interests::new().on::<Tick, _>("on_tick", noop)).unwrap();
        assert!(reg.is_registered(owner.id()));

        assert_eq!(reg.unregister(owner.id()), 1);
        assert_eq!(reg.unregister(owner.id()), 0);
        assert!(!reg.is_registered(owner.id()));
        assert_eq!(reg.counts(), RegistryCounts::default());
    }

    #[test]
    fn test_children_expanded_at_registration() {
        let reg = SubscriptionRegistry::new();
        reg.declare_children(
            EventType::of::<Parent>(),
            ChildEvents::<Parent>::new().child::<Child>().into_children(),
        )
        .unwrap();

        let owner = Owner::new("o");
        reg.register(&owner, Interests::new().on::<Parent, _>("on_parent", |_| Ok(())))
            .unwrap();

        let snap = reg.snapshot();
        assert_eq!(snap.event_types(), 2);
        let child_routes = snap.routes(&EventType::of::<Child>());
        assert_eq!(child_routes.len(), 1);
        assert!(child_routes[0].upcast.is_some());
        assert!(snap.routes(&EventType::of::<Parent>())[0].upcast.is_none());

        reg.unregister(owner.id());
        assert_eq!(reg.snapshot().event_types(), 0);
    }

    #[test]
    fn test_invalid_batch_is_rejected_whole() {
        let reg = SubscriptionRegistry::new();
        let owner = Owner::new("o");
        let interests = Interests::new()
            .on::<Tick, _>("on_tick", noop)
            .on::<u32, _>("on_u32", |_| Ok(()));

        let err = reg.register(&owner, interests).unwrap_err();
        assert_eq!(err.as_label(), "register_primitive_event");
        assert!(!reg.is_registered(owner.id()));

        let err = reg
            .register(&owner, Interests::new().on::<Tick, _>("", noop))
            .unwrap_err();
        assert!(matches!(err, RegisterError::EmptyHandlerName { .. }));
    }
}
