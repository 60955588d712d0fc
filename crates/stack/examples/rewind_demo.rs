//! Walks through allocate, rewind, reuse, a guarded scope and clear with
//! arena events printed by the `tracing` subscriber.
//!
//! Run with `RUST_LOG=trace cargo run --example rewind_demo` to see rewinds.

use anyhow::Result;
use nebula_stack::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut arena = StackArena::new(1024)?;

    let header = arena.allocate(10, 16)?;
    println!("header block at {:p}, top {}", header, arena.marker());

    let marker = arena.marker();
    let scratch = arena.allocate_default(200)?;
    println!("scratch block at {:p}, top {}", scratch, arena.marker());

    arena.free_to_marker(marker)?;
    println!("rewound to {}", arena.marker());

    let reused = arena.allocate_default(50)?;
    println!(
        "reused block at {:p} (same address: {})",
        reused,
        reused == scratch
    );

    {
        let mut frame = arena.guard();
        let numbers = frame.allocate_typed_with(4, {
            let mut next = 0u32;
            move || {
                next += 1;
                next * next
            }
        })?;
        // SAFETY: all four elements were constructed and the guard is live.
        let numbers = unsafe { numbers.as_ref() };
        println!(
            "guarded squares {numbers:?}, {} bytes in scope",
            frame.allocated_since()
        );
    }
    println!("after guard, top {}", arena.marker());

    println!("{}", arena.stats());

    arena.clear();
    println!("cleared, top {}", arena.marker());

    Ok(())
}
