//! # Owner tokens.
//!
//! An [`Owner`] groups handlers so they can be unregistered together. Identity is
//! a process-unique [`OwnerId`]; the name is only used in logs and reports.
//!
//! Cloning an `Owner` keeps the same identity, so a clone can be handed to
//! whoever is responsible for calling `unregister` later.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global owner id counter.
static OWNER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique owner identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    fn next() -> Self {
        OwnerId(OWNER_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner-{}", self.0)
    }
}

/// Token under which handlers are registered and later removed as a unit.
///
/// ```rust
/// use typebus::Owner;
///
/// let a = Owner::new("bank-tags");
/// let b = Owner::new("bank-tags");
/// assert_ne!(a, b);            // same name, different identity
/// assert_eq!(a, a.clone());    // clones share identity
/// ```
#[derive(Clone)]
pub struct Owner {
    id: OwnerId,
    name: Arc<str>,
}

impl Owner {
    /// Creates a fresh owner with a new identity.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: OwnerId::next(),
            name: name.into(),
        }
    }

    /// Identity of this owner.
    #[inline]
    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// Human-readable name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Owner {}

impl Hash for Owner {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.id.0)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id.0)
    }
}
