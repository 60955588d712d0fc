//! # nebula-stack
//!
//! Fixed-capacity LIFO scratch memory.
//!
//! A [`StackArena`] owns one contiguous buffer and a single offset, the
//! *top*. Allocations are carved from the top in order and released in
//! reverse order by rewinding to a [`StackMarker`] taken earlier, or all at
//! once with [`StackArena::clear`]. There is no per-allocation free, no free
//! list and no growth: allocation is a bounds check and an add.
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_stack::prelude::*;
//!
//! # fn main() -> nebula_stack::StackResult<()> {
//! let mut arena = StackArena::new(1024)?;
//!
//! let header = arena.allocate(100, 16)?;
//! assert_eq!(header.as_ptr() as usize % 16, 0);
//!
//! let marker = arena.marker();
//! let _scratch = arena.allocate_default(200)?;
//! arena.free_to_marker(marker)?;
//! assert_eq!(arena.marker(), marker);
//!
//! {
//!     // Everything allocated through the guard is released when it drops.
//!     let mut frame = arena.guard();
//!     let _tmp = frame.allocate_default(300)?;
//! }
//! assert_eq!(arena.marker(), marker);
//!
//! arena.clear();
//! assert!(arena.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! - [`stack`] - the raw allocator: [`StackArena`], [`StackMarker`],
//!   [`RewindGuard`] and the per-allocation padding header
//! - [`typed`] - element construction and destruction over raw storage
//!   ([`TypedAllocator`], [`destroy_typed`])
//! - [`config`], [`stats`], [`error`] - configuration, counters and the
//!   error taxonomy
//!
//! The typed layer only sees the [`LifoAllocator`] interface; the arena knows
//! nothing about element types and never runs destructors.
//!
//! ## Features
//!
//! - `logging` (default): structured `tracing` events for arena lifecycle,
//!   exhaustion and marker misuse
//!
//! ## Threading
//!
//! An arena has a single owner. Every mutating operation takes `&mut self`;
//! the arena is `Send` so it can be handed to a worker, but it is not `Sync`.
//! Use one arena per worker.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Raw buffer management is the point of this crate.
#![allow(unsafe_code)]

pub mod config;
pub mod error;
pub mod stack;
pub mod stats;
pub mod traits;
pub mod typed;

pub use crate::config::StackConfig;
pub use crate::error::{ErrorKind, StackError, StackResult};
pub use crate::stack::{
    AllocationHeader, DEFAULT_ALIGNMENT, HEADER_SIZE, MAX_ALIGNMENT, RewindGuard, StackArena,
    StackMarker,
};
pub use crate::stats::StackStats;
pub use crate::traits::LifoAllocator;
pub use crate::typed::{TypedAllocator, destroy_slice, destroy_typed};

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::StackConfig;
    pub use crate::error::{ErrorKind, StackError, StackResult};
    pub use crate::stack::{RewindGuard, StackArena, StackMarker};
    pub use crate::traits::LifoAllocator;
    pub use crate::typed::{TypedAllocator, destroy_slice, destroy_typed};
}
