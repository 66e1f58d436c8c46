//! # Example: one_shots
//!
//! Deferred handlers that fire on the next matching post.
//!
//! Demonstrates how to:
//! - Run a closure on the next post with `once`.
//! - Keep a handler pending until it reports done with `once_or_more`.
//! - Await the next event of a type from async code with `next`.
//!
//! ## Flow
//! ```text
//! once(LoginScreen)                  ──► fires on the first post, then removed
//! once_or_more(GameTick) until 3     ──► Ok(false), Ok(false), Ok(true)
//! next::<GameTick>().await           ──► resolves with a clone of the next tick
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example one_shots
//! ```

use std::time::Duration;

use typebus::EventBus;

struct LoginScreen;

#[derive(Clone, Debug)]
struct GameTick(u64);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = EventBus::new();

    // 1. Plain one-shot
    bus.once::<LoginScreen, _>(|_| println!("[once] login screen shown"));
    bus.post(&LoginScreen)?;
    bus.post(&LoginScreen)?;

    // 2. Requeued until it reports done
    bus.once_or_more::<GameTick, _>(|tick| {
        println!("[once_or_more] tick {}", tick.0);
        Ok(tick.0 >= 3)
    });
    for i in 1..=4 {
        bus.post(&GameTick(i))?;
        println!("  pending after tick {i}: {}", bus.pending_one_shots::<GameTick>());
    }

    // 3. Await the next tick posted from another task
    let rx = bus.next::<GameTick>();
    let poster = bus.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Err(err) = poster.post(&GameTick(42)) {
            eprintln!("post failed: {err}");
        }
    });

    let tick = rx.await?;
    println!("[next] received {tick:?}");
    Ok(())
}
