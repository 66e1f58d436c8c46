//! One-shot handlers: deferred callbacks that fire on the next matching post.
//!
//! ## Contents
//! - `OneShotSet` pending list of one event type, with detach-before-iterate
//!   semantics and list recycling
//! - `OneShotScheduler` per-type sets behind a lazily rebuilt snapshot
//!
//! Public entry points live on [`EventBus`](crate::EventBus): `once`,
//! `once_or_more` and `next`.

mod scheduler;
mod set;

pub(crate) use scheduler::{OneShotScheduler, OneShotSnapshot};
pub(crate) use set::OneShotFn;
