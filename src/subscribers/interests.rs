//! # Interest declarations.
//!
//! [`Interests`] is the explicit declaration surface an owner hands to
//! `EventBus::register`: a list of named handlers, each bound to one event type.
//!
//! ## Handler identity
//! A handler is identified by `(owner, event type, name)`. Registering the same
//! triple again is a no-op, which makes `register` idempotent. The name plays the
//! role of a method name: keep it stable (e.g. `"on_game_tick"`).
//!
//! ## Example
//! ```rust
//! use typebus::{HandlerError, Interests};
//!
//! struct GameTick;
//! struct ChatMessage(String);
//!
//! let interests = Interests::new()
//!     .on::<GameTick, _>("on_game_tick", |_| Ok(()))
//!     .on::<ChatMessage, _>("on_chat_message", |msg| {
//!         if msg.0.is_empty() {
//!             return Err(HandlerError::failed("empty chat message"));
//!         }
//!         Ok(())
//!     });
//! assert_eq!(interests.len(), 2);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::events::{Event, EventType};

/// Type-erased handler; receives the (possibly projected) event as `&dyn Any`.
pub(crate) type ErasedHandler = dyn Fn(&dyn Any) -> Result<(), HandlerError> + Send + Sync;

/// One declared handler.
#[derive(Clone)]
pub(crate) struct Interest {
    pub(crate) event: EventType,
    pub(crate) name: Cow<'static, str>,
    pub(crate) handler: Arc<ErasedHandler>,
}

/// Ordered list of handlers declared by one owner.
#[derive(Clone, Default)]
pub struct Interests {
    entries: Vec<Interest>,
}

impl Interests {
    /// Creates an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for `E` (builder style).
    pub fn on<E, F>(mut self, name: impl Into<Cow<'static, str>>, handler: F) -> Self
    where
        E: Event,
        F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.add::<E, F>(name, handler);
        self
    }

    /// Adds a handler for `E` in place.
    pub fn add<E, F>(&mut self, name: impl Into<Cow<'static, str>>, handler: F) -> &mut Self
    where
        E: Event,
        F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let erased = move |event: &dyn Any| match event.downcast_ref::<E>() {
            Some(ev) => handler(ev),
            None => Ok(()),
        };
        self.entries.push(Interest {
            event: EventType::of::<E>(),
            name: name.into(),
            handler: Arc::new(erased),
        });
        self
    }

    /// Number of declared handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<Interest> {
        self.entries
    }
}

impl fmt::Debug for Interests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|i| (i.name.as_ref(), i.event)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ping(u32);
    struct Pong;

    #[test]
    fn test_erased_handler_downcasts_matching_type() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        let interests = Interests::new().on::<Ping, _>("on_ping", move |p| {
            s.fetch_add(p.0 as usize, Ordering::SeqCst);
            Ok(())
        });

        let entries = interests.into_entries();
        assert_eq!(entries[0].event, EventType::of::<Ping>());
        assert_eq!(entries[0].name, "on_ping");

        (entries[0].handler)(&Ping(5)).unwrap();
        (entries[0].handler)(&Pong).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_add_in_place() {
        let mut interests = Interests::new();
        interests
            .add::<Ping, _>("on_ping", |_| Ok(()))
            .add::<Pong, _>("on_pong", |_| Ok(()));
        assert_eq!(interests.len(), 2);
        assert!(!interests.is_empty());
    }
}
