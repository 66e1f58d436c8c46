//! # Subscriber trait.
//!
//! [`Subscriber`] is the interface form of interest declaration: a component
//! carries its own [`Owner`] token and lists its handlers once, when it is
//! registered with `EventBus::register_subscriber`.
//!
//! ## Rules
//! - `subscribe` is called once per registration; handlers capture the `Arc`.
//! - The bus keeps the handlers (and therefore the `Arc`) alive until
//!   `unregister_subscriber` is called. There is no automatic expiry.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use typebus::{EventBus, Interests, Owner, Subscriber};
//!
//! struct GameTick;
//!
//! struct TickCounter {
//!     owner: Owner,
//!     ticks: AtomicU64,
//! }
//!
//! impl Subscriber for TickCounter {
//!     fn owner(&self) -> &Owner {
//!         &self.owner
//!     }
//!
//!     fn subscribe(self: Arc<Self>, interests: &mut Interests) {
//!         interests.add::<GameTick, _>("on_game_tick", move |_| {
//!             self.ticks.fetch_add(1, Ordering::Relaxed);
//!             Ok(())
//!         });
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let counter = Arc::new(TickCounter { owner: Owner::new("ticks"), ticks: AtomicU64::new(0) });
//! bus.register_subscriber(&counter).unwrap();
//! bus.post(&GameTick).unwrap();
//! assert_eq!(counter.ticks.load(Ordering::Relaxed), 1);
//! bus.unregister_subscriber(&*counter);
//! ```

use std::sync::Arc;

use super::{Interests, Owner};

/// Component that declares its own event handlers.
pub trait Subscriber: Send + Sync + 'static {
    /// Token the handlers are registered under.
    fn owner(&self) -> &Owner;

    /// Declares this subscriber's handlers.
    fn subscribe(self: Arc<Self>, interests: &mut Interests);
}
