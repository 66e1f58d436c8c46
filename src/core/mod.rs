//! Bus core: registry, dispatch and diagnostics.
//!
//! The only public API from this module is [`EventBus`] together with its
//! configuration and statistics types.
//!
//! Internal modules:
//! - [`registry`]: subscription indices and the lazily rebuilt snapshot;
//! - [`bus`]: `post`, registration and one-shot entry points;
//! - [`stats`]: optional per-type post counters and periodic summaries;
//! - [`config`]: construction-time settings.

mod bus;
mod config;
mod registry;
mod stats;

pub use bus::EventBus;
pub use config::{BusConfig, DEFAULT_RECYCLE_THRESHOLD, DEFAULT_STATS_INTERVAL};
pub use stats::{StatsReport, StatsSnapshot};
