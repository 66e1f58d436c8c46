//! # Child-event declarations.
//!
//! Rust has no subtyping between structs, so a "parent" event is reached through
//! a projection: a child type `C` is declared under parent `P` when `C: AsRef<P>`.
//! A handler registered for `P` is then also indexed under `C`, and each post of a
//! `C` hands the handler the projected `&P`.
//!
//! ## Rules
//! - Declarations are **write-once** per parent ([`HierarchyError::AlreadyDeclared`]).
//! - Expansion happens at registration time only; a post always does a single
//!   lookup by concrete type.
//! - Expansion is **not transitive**: list every descendant under the parent.
//!
//! ## Example
//! ```rust
//! use typebus::{ChildEvents, EventBus};
//!
//! struct ItemEvent { id: u32 }
//! struct ItemSpawned { base: ItemEvent, x: i32, y: i32 }
//!
//! impl AsRef<ItemEvent> for ItemSpawned {
//!     fn as_ref(&self) -> &ItemEvent { &self.base }
//! }
//!
//! let bus = EventBus::new();
//! bus.declare_children(ChildEvents::<ItemEvent>::new().child::<ItemSpawned>())
//!     .expect("first declaration");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::HierarchyError;
use crate::events::{Event, EventType};

/// Projection from a posted child value to its declared parent value.
pub(crate) type Upcast = fn(&dyn Any) -> Option<&dyn Any>;

fn upcast<P, C>(event: &dyn Any) -> Option<&dyn Any>
where
    P: Event,
    C: Event + AsRef<P>,
{
    event
        .downcast_ref::<C>()
        .map(|child| AsRef::<P>::as_ref(child) as &dyn Any)
}

/// One declared child type and how to project it onto the parent.
#[derive(Clone, Copy)]
pub(crate) struct ChildType {
    pub(crate) ty: EventType,
    pub(crate) upcast: Upcast,
}

/// Builder listing the child events of parent `P`.
pub struct ChildEvents<P> {
    children: Vec<ChildType>,
    _parent: PhantomData<fn() -> P>,
}

impl<P: Event> ChildEvents<P> {
    /// Starts an empty declaration for `P`.
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            _parent: PhantomData,
        }
    }

    /// Adds `C` as a child of `P`.
    pub fn child<C>(mut self) -> Self
    where
        C: Event + AsRef<P>,
    {
        self.children.push(ChildType {
            ty: EventType::of::<C>(),
            upcast: upcast::<P, C>,
        });
        self
    }

    /// Parent type of this declaration.
    pub fn parent(&self) -> EventType {
        EventType::of::<P>()
    }

    pub(crate) fn into_children(self) -> Vec<ChildType> {
        self.children
    }
}

impl<P: Event> Default for ChildEvents<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write-once table `parent → children`.
#[derive(Default)]
pub(crate) struct Hierarchy {
    parents: HashMap<EventType, Arc<[ChildType]>>,
}

impl Hierarchy {
    /// Records the children of `parent`. Fails without side effects on an invalid
    /// or repeated declaration.
    pub(crate) fn declare(
        &mut self,
        parent: EventType,
        children: Vec<ChildType>,
    ) -> Result<(), HierarchyError> {
        if self.parents.contains_key(&parent) {
            return Err(HierarchyError::AlreadyDeclared { parent });
        }
        for (i, child) in children.iter().enumerate() {
            if child.ty == parent {
                return Err(HierarchyError::SelfChild { parent });
            }
            if children[..i].iter().any(|c| c.ty == child.ty) {
                return Err(HierarchyError::DuplicateChild {
                    parent,
                    child: child.ty,
                });
            }
        }
        self.parents.insert(parent, children.into());
        Ok(())
    }

    /// Declared children of `parent`, if any were declared.
    pub(crate) fn children_of(&self, parent: &EventType) -> Option<Arc<[ChildType]>> {
        self.parents.get(parent).cloned()
    }
}
