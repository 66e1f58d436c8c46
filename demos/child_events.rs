//! # Example: child_events
//!
//! Parent handlers receiving declared child events.
//!
//! Demonstrates how to:
//! - Declare children of a parent event with [`ChildEvents`].
//! - Register a handler for the parent and receive every child, projected to `&Parent`.
//! - Implement [`Subscriber`] for a component that owns its handlers.
//!
//! ## Flow
//! ```text
//! declare_children(ItemEvent: ItemSpawned, ItemDespawned)
//!     └─► register_subscriber(LootTracker)
//!          ├─► post(ItemSpawned)   ──► on_item_event(&ItemEvent) + on_item_spawned
//!          ├─► post(ItemDespawned) ──► on_item_event(&ItemEvent)
//!          └─► post(ItemEvent)     ──► on_item_event
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example child_events
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use typebus::{ChildEvents, EventBus, Interests, Owner, Subscriber};

struct ItemEvent {
    id: u32,
}

struct ItemSpawned {
    base: ItemEvent,
    x: i32,
    y: i32,
}

struct ItemDespawned {
    base: ItemEvent,
}

impl AsRef<ItemEvent> for ItemSpawned {
    fn as_ref(&self) -> &ItemEvent {
        &self.base
    }
}

impl AsRef<ItemEvent> for ItemDespawned {
    fn as_ref(&self) -> &ItemEvent {
        &self.base
    }
}

struct LootTracker {
    owner: Owner,
    items: AtomicU64,
    spawns: AtomicU64,
}

impl Subscriber for LootTracker {
    fn owner(&self) -> &Owner {
        &self.owner
    }

    fn subscribe(self: Arc<Self>, interests: &mut Interests) {
        let this = Arc::clone(&self);
        interests
            .add::<ItemEvent, _>("on_item_event", move |ev| {
                println!("[loot] item {}", ev.id);
                this.items.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .add::<ItemSpawned, _>("on_item_spawned", move |ev| {
                println!("[loot] spawned at ({}, {})", ev.x, ev.y);
                self.spawns.fetch_add(1, Ordering::Relaxed);
                Ok(())
            });
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = EventBus::new();

    // 1. Children must be declared before parent handlers are registered
    bus.declare_children(
        ChildEvents::<ItemEvent>::new()
            .child::<ItemSpawned>()
            .child::<ItemDespawned>(),
    )?;

    // 2. Register a component that declares its own handlers
    let tracker = Arc::new(LootTracker {
        owner: Owner::new("loot-tracker"),
        items: AtomicU64::new(0),
        spawns: AtomicU64::new(0),
    });
    bus.register_subscriber(&tracker)?;

    // 3. Post children and the parent itself
    bus.post(&ItemSpawned {
        base: ItemEvent { id: 1 },
        x: 3200,
        y: 3200,
    })?;
    bus.post(&ItemDespawned {
        base: ItemEvent { id: 1 },
    })?;
    bus.post(&ItemEvent { id: 2 })?;

    bus.unregister_subscriber(&*tracker);

    println!();
    println!("Loot:");
    println!(" ├─► Item events: {}", tracker.items.load(Ordering::Relaxed));
    println!(" └─► Spawns:      {}", tracker.spawns.load(Ordering::Relaxed));
    Ok(())
}
