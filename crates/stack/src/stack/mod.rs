//! Fixed-capacity LIFO allocator
//!
//! ## Modules
//! - `arena` - [`StackArena`], the buffer and its top offset
//! - `guard` - [`RewindGuard`] for automatic rewind at scope exit
//! - `header` - per-allocation padding header and alignment math
//! - `marker` - [`StackMarker`] positions for scoped deallocation

mod arena;
mod guard;
mod header;
mod marker;

pub use arena::StackArena;
pub use guard::RewindGuard;
pub use header::{AllocationHeader, DEFAULT_ALIGNMENT, HEADER_SIZE, MAX_ALIGNMENT};
pub use marker::StackMarker;
