//! # Example: basic
//!
//! Minimal register → post → unregister cycle.
//!
//! Demonstrates how to:
//! - Group handlers under an [`Owner`] with [`Interests`].
//! - Post events and let a failing handler be isolated from its siblings.
//! - Remove every handler of an owner at once.
//!
//! ## Flow
//! ```text
//! Owner + Interests ──► EventBus::register()
//!     ├─► post(GameTick)      ──► on_game_tick
//!     ├─► post(ChatMessage)   ──► on_chat_message (fails, logged)
//!     │                       └─► on_chat_echo
//!     └─► unregister(owner)   ──► later posts reach nobody
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use typebus::{EventBus, HandlerError, Interests, Owner};

struct GameTick;

struct ChatMessage {
    text: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Print the bus's own logs (handler failures are reported there)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let bus = EventBus::new();
    let owner = Owner::new("chat-panel");
    let ticks = Arc::new(AtomicU64::new(0));

    // 2. Declare the handlers of one owner
    let t = Arc::clone(&ticks);
    let interests = Interests::new()
        .on::<GameTick, _>("on_game_tick", move |_| {
            t.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .on::<ChatMessage, _>("on_chat_message", |msg| {
            if msg.text.is_empty() {
                return Err(HandlerError::failed("empty chat message"));
            }
            Ok(())
        })
        .on::<ChatMessage, _>("on_chat_echo", |msg| {
            println!("[chat] {:?}", msg.text);
            Ok(())
        });
    bus.register(&owner, interests)?;
    println!("registered: {} subscriptions", bus.subscription_count());

    // 3. Post a few events
    for _ in 0..3 {
        bus.post(&GameTick)?;
    }
    bus.post(&ChatMessage { text: "hello".into() })?;
    bus.post(&ChatMessage { text: String::new() })?;

    // 4. Drop everything the owner registered
    bus.unregister(&owner);
    bus.post(&GameTick)?;

    println!("ticks seen: {}", ticks.load(Ordering::Relaxed));
    Ok(())
}
