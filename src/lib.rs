//! # typebus
//!
//! **typebus** is an in-process, typed publish/subscribe event bus.
//!
//! Producers post plain Rust values; consumers register handlers for the
//! concrete types they care about. Dispatch is synchronous, runs on the posting
//! thread, and reads an immutable snapshot of the subscriptions, so the hot path
//! takes no lock.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Owner     │   │    Owner     │   │  Subscriber  │
//!     │ + Interests  │   │ + Interests  │   │ (trait impl) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  SubscriptionRegistry (mutation lock)                             │
//! │  - by_owner  (bulk unregister)                                    │
//! │  - by_event  (declared type + declared children)                  │
//! │  - ChildEvents table (write-once, read at registration)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   │ rebuilt lazily after mutation
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │    RegistrySnapshot    │  Arc, lock-free read
//!                       └───────────┬────────────┘
//!                                   ▼
//!  post(&event) ──► one-shots[type] ──► routes[type] ──► handler(&event)
//!                   (detach, run,       (unordered,       ├─ Err/panic → log
//!                    requeue)            isolated)        └─ Fatal → abort
//! ```
//!
//! ### One-shot lifecycle
//! ```text
//! once / once_or_more ──► pending
//!                           │ next post of the concrete type
//!                           ▼
//!                        invoked ──► Ok(true) / Err / panic ──► removed
//!                           │
//!                           └──────► Ok(false) ──► pending (next post)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                  |
//! |-------------------|--------------------------------------------------------------|-------------------------------------|
//! | **Dispatch**      | Synchronous, lock-free fan-out by concrete type              | [`EventBus`], [`Event`]             |
//! | **Declarations**  | Named typed handlers grouped under an owner token            | [`Interests`], [`Owner`], [`Subscriber`] |
//! | **Fan-out**       | Parent handlers receive declared child events                | [`ChildEvents`]                     |
//! | **One-shots**     | Fire on the next post, optionally requeue, or await          | [`EventBus::once`], [`EventBus::next`] |
//! | **Errors**        | Typed errors; only fatal handler errors escape `post`        | [`HandlerError`], [`FatalError`]    |
//! | **Configuration** | Statistics and recycling settings                            | [`BusConfig`]                       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use typebus::{ChildEvents, EventBus, HandlerError, Interests, Owner};
//!
//! struct ItemEvent { id: u32 }
//! struct ItemSpawned { base: ItemEvent }
//! impl AsRef<ItemEvent> for ItemSpawned {
//!     fn as_ref(&self) -> &ItemEvent { &self.base }
//! }
//!
//! let bus = EventBus::new();
//! bus.declare_children(ChildEvents::<ItemEvent>::new().child::<ItemSpawned>())?;
//!
//! let last = Arc::new(AtomicU32::new(0));
//! let owner = Owner::new("loot-tracker");
//! let l = Arc::clone(&last);
//! bus.register(&owner, Interests::new().on::<ItemEvent, _>("on_item_event", move |ev| {
//!     if ev.id == 0 {
//!         return Err(HandlerError::failed("item without id"));
//!     }
//!     l.store(ev.id, Ordering::Relaxed);
//!     Ok(())
//! }))?;
//!
//! bus.post(&ItemSpawned { base: ItemEvent { id: 42 } })?;
//! assert_eq!(last.load(Ordering::Relaxed), 42);
//!
//! bus.unregister(&owner);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod core;
mod error;
mod events;
mod oneshot;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    BusConfig, EventBus, StatsReport, StatsSnapshot, DEFAULT_RECYCLE_THRESHOLD,
    DEFAULT_STATS_INTERVAL,
};
pub use error::{FatalError, HandlerError, HierarchyError, RegisterError};
pub use events::{ChildEvents, Event, EventType};
pub use subscribers::{Interests, Owner, OwnerId, Subscriber};
