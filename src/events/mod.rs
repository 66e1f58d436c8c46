//! Event data model: runtime type tags and child-event declarations.
//!
//! ## Contents
//! - [`Event`], [`EventType`] the postable value and its concrete type tag
//! - [`ChildEvents`] write-once `parent → children` fan-out declarations
//!
//! The bus never looks inside an event; only [`EventType`] drives routing.

mod event;
mod hierarchy;

pub use event::{Event, EventType};
pub use hierarchy::ChildEvents;

pub(crate) use hierarchy::{ChildType, Hierarchy, Upcast};
