//! # Event values and their runtime type tags.
//!
//! Any `'static` value can be posted: [`Event`] is blanket-implemented, and the
//! bus only ever inspects the value's concrete type through [`EventType`].
//!
//! ## Type resolution
//! ```text
//! post(&ItemSpawned { .. })
//!        │
//!        ▼
//!  &dyn Event ──► as_any().type_id() ──► EventType(ItemSpawned) ──► lookup
//! ```
//!
//! ## Pitfall
//! A `Box<dyn Event>` is itself an `Event`. Post the pointee (`bus.post(&*boxed)`),
//! otherwise the event is dispatched as `Box<dyn Event>` and matches nothing.
//!
//! ## Example
//! ```rust
//! use typebus::{Event, EventType};
//!
//! struct GameTick;
//!
//! let ev: &dyn Event = &GameTick;
//! assert_eq!(ev.event_type(), EventType::of::<GameTick>());
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A value that can be posted on the bus.
///
/// Implemented for every `'static` type; there is nothing to implement by hand.
pub trait Event: Any {
    /// Upcasts to `&dyn Any` for downcasting by handlers.
    fn as_any(&self) -> &dyn Any;

    /// Returns the concrete runtime type of this value.
    fn event_type(&self) -> EventType;
}

impl<T: Any> Event for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn event_type(&self) -> EventType {
        EventType::of::<T>()
    }
}

/// Runtime type tag of an event.
///
/// Equality and hashing only look at the [`TypeId`]; the name is kept for logs.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Returns the tag for `T`.
    #[inline]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Underlying [`TypeId`].
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name, as reported by [`std::any::type_name`].
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path (`game::ItemSpawned` → `ItemSpawned`).
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        let start = base.rfind("::").map_or(0, |i| i + 2);
        &self.name[start..]
    }

    /// Returns `true` for primitive types, which cannot be subscribed to.
    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.iter().any(|p| p() == self.id)
    }
}

const PRIMITIVES: &[fn() -> TypeId] = &[
    TypeId::of::<()>,
    TypeId::of::<bool>,
    TypeId::of::<char>,
    TypeId::of::<u8>,
    TypeId::of::<u16>,
    TypeId::of::<u32>,
    TypeId::of::<u64>,
    TypeId::of::<u128>,
    TypeId::of::<usize>,
    TypeId::of::<i8>,
    TypeId::of::<i16>,
    TypeId::of::<i32>,
    TypeId::of::<i64>,
    TypeId::of::<i128>,
    TypeId::of::<isize>,
    TypeId::of::<f32>,
    TypeId::of::<f64>,
    TypeId::of::<&'static str>,
];

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod game {
        pub struct ItemSpawned;
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn test_event_type_resolves_concrete_type() {
        let ev: &dyn Event = &game::ItemSpawned;
        assert_eq!(ev.event_type(), EventType::of::<game::ItemSpawned>());
        assert_eq!(ev.as_any().type_id(), TypeId::of::<game::ItemSpawned>());
    }

    #[test]
    fn test_short_name_strips_module_path() {
        assert_eq!(EventType::of::<game::ItemSpawned>().short_name(), "ItemSpawned");
        assert_eq!(EventType::of::<u32>().short_name(), "u32");
        assert!(EventType::of::<game::Wrapper<u8>>()
            .short_name()
            .starts_with("Wrapper<"));
    }

    #[test]
    fn test_primitives_are_detected() {
        assert!(EventType::of::<u32>().is_primitive());
        assert!(EventType::of::<&'static str>().is_primitive());
        assert!(EventType::of::<()>().is_primitive());
        assert!(!EventType::of::<String>().is_primitive());
        assert!(!EventType::of::<game::ItemSpawned>().is_primitive());
    }
}
