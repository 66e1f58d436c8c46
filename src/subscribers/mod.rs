//! # Handler declarations for the event bus.
//!
//! This module provides the surfaces through which collaborators declare what
//! they want to receive:
//!
//! - [`Owner`] token grouping handlers for bulk unregistration
//! - [`Interests`] explicit list of named, typed handlers
//! - [`Subscriber`] trait for components that declare their own interests
//!
//! ## Architecture
//! ```text
//! Owner ──┐
//!         ├──► EventBus::register(&owner, interests) ──► SubscriptionRegistry
//! Interests ┘        (validate, expand children)            ├─ by_owner
//!                                                            └─ by_event
//! Subscriber ──► register_subscriber(&Arc<S>)
//!                  └─► S::subscribe(&mut Interests) ──► register(S::owner(), ..)
//! ```

mod interests;
mod owner;
mod subscriber;

pub use interests::Interests;
pub use owner::{Owner, OwnerId};
pub use subscriber::Subscriber;

pub(crate) use interests::ErasedHandler;
