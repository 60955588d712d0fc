//! Main stack allocator implementation
//!
//! # Safety
//!
//! The arena owns one heap buffer and hands out raw pointers into it:
//! - The buffer is allocated with [`MAX_ALIGNMENT`] alignment, so an offset
//!   aligned to any supported alignment is also an aligned address
//! - `top` is the only moving part; every block and its header lie below it
//! - A block and its header never overlap another live block
//! - Rewinds only move `top` down; they never touch memory above it
//!
//! ## Invariants
//!
//! - `0 <= top <= capacity`
//! - `capacity == 0` exactly when the arena is inert; `base` is then dangling
//!   and never dereferenced
//! - The byte at `block - 1` of every live block holds its [`AllocationHeader`]

use core::alloc::Layout;
use core::fmt;
use core::ptr::{self, NonNull};
use std::alloc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::StackMarker;
use super::header::{
    AllocationHeader, HEADER_SIZE, MAX_ALIGNMENT, effective_alignment, padding_for,
};
use crate::config::StackConfig;
use crate::error::{StackError, StackResult};
use crate::stats::{Counters, StackStats};
use crate::traits::LifoAllocator;

/// Fixed-capacity LIFO allocator
///
/// Blocks are carved from the top of a single buffer and released in reverse
/// order, either by rewinding to a [`StackMarker`] or by [`clear`](Self::clear).
///
/// # Memory Layout
/// ```text
/// [base]--[h|alloc1]--[h|alloc2]--[h|alloc3]--[top]----[free]----[end]
///          <------------ allocated ------------>     <- available ->
/// ```
///
/// `h` is the one-byte padding header in front of each block.
///
/// The arena never runs destructors. Objects with drop glue that live in a
/// block must be destroyed by the caller (see [`crate::typed`]) before the
/// block is rewound past.
pub struct StackArena {
    /// Start of the buffer, aligned to `MAX_ALIGNMENT`
    base: NonNull<u8>,

    /// Buffer size in bytes
    capacity: usize,

    /// Offset of the first free byte
    top: usize,

    /// Configuration
    config: StackConfig,

    /// Activity counters
    counters: Counters,
}

impl StackArena {
    /// Largest supported capacity in bytes
    pub const MAX_CAPACITY: usize = isize::MAX as usize - (MAX_ALIGNMENT - 1);

    /// Creates a new stack allocator with custom configuration
    pub fn with_config(capacity: usize, config: StackConfig) -> StackResult<Self> {
        if capacity == 0 || capacity > Self::MAX_CAPACITY {
            return Err(StackError::invalid_capacity(capacity, Self::MAX_CAPACITY));
        }
        config.validate()?;

        let layout = Layout::from_size_align(capacity, MAX_ALIGNMENT)
            .map_err(|_| StackError::invalid_capacity(capacity, Self::MAX_CAPACITY))?;

        // SAFETY: `layout` has a non-zero size (capacity > 0 checked above).
        let raw = unsafe {
            match config.dealloc_pattern {
                Some(_) => alloc::alloc(layout),
                None => alloc::alloc_zeroed(layout),
            }
        };
        let base = NonNull::new(raw).ok_or_else(|| StackError::buffer_allocation_failed(capacity))?;

        if let Some(pattern) = config.dealloc_pattern {
            // SAFETY: `base` was just allocated for `capacity` bytes.
            unsafe { ptr::write_bytes(base.as_ptr(), pattern, capacity) };
        }

        #[cfg(feature = "logging")]
        debug!(capacity, track_stats = config.track_stats, "stack arena created");

        Ok(Self {
            base,
            capacity,
            top: 0,
            config,
            counters: Counters::default(),
        })
    }

    /// Creates a new stack allocator with default configuration
    pub fn new(capacity: usize) -> StackResult<Self> {
        Self::with_config(capacity, StackConfig::default())
    }

    /// Creates a production-configured stack allocator
    pub fn production(capacity: usize) -> StackResult<Self> {
        Self::with_config(capacity, StackConfig::production())
    }

    /// Creates a debug-configured stack allocator
    pub fn debug(capacity: usize) -> StackResult<Self> {
        Self::with_config(capacity, StackConfig::debug())
    }

    /// Returns the total capacity of the allocator
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of bytes below the top, padding included
    pub fn used(&self) -> usize {
        self.top
    }

    /// Returns the number of bytes left above the top
    pub fn available(&self) -> usize {
        self.capacity - self.top
    }

    /// Returns `true` if nothing is allocated
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Returns the active configuration
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Pointer to the start of the buffer
    pub fn as_ptr(&self) -> *const u8 {
        self.base.as_ptr()
    }

    /// Allocates `size` bytes aligned to `align`
    ///
    /// `align` must be a power of two; values above [`MAX_ALIGNMENT`] are
    /// clamped. A one-byte header recording the padding is written right
    /// before the returned block. On failure the arena is left unchanged.
    pub fn allocate(&mut self, size: usize, align: usize) -> StackResult<NonNull<u8>> {
        let result = self.try_allocate(size, align);

        if self.config.track_stats {
            match result {
                Ok(_) => self.counters.allocations += 1,
                Err(_) => self.counters.failed_allocations += 1,
            }
        }

        result
    }

    /// Allocates `size` bytes at the configured default alignment
    pub fn allocate_default(&mut self, size: usize) -> StackResult<NonNull<u8>> {
        self.allocate(size, self.config.default_alignment)
    }

    /// Allocates a block described by `layout`
    pub fn allocate_layout(&mut self, layout: Layout) -> StackResult<NonNull<u8>> {
        self.allocate(layout.size(), layout.align())
    }

    fn try_allocate(&mut self, size: usize, align: usize) -> StackResult<NonNull<u8>> {
        if size == 0 {
            return Err(StackError::ZeroSize);
        }
        let align = effective_alignment(align).ok_or(StackError::InvalidAlignment {
            alignment: align,
        })?;

        let available = self.available();
        let padding = padding_for(self.top, align)
            .ok_or_else(|| StackError::out_of_memory(size, 0, available))?;
        let fits = padding
            .checked_add(size)
            .is_some_and(|needed| needed <= available);
        if !fits {
            return Err(StackError::out_of_memory(size, padding, available));
        }

        let offset = self.top + padding;

        // SAFETY: `top + padding + size <= capacity` (checked above), so the
        // header at `offset - 1` and the block `[offset, offset + size)` are
        // inside the buffer and above every live block. `padding >= 1`, so the
        // header never reaches below the old top. The header is a single byte
        // and needs no alignment.
        let block = unsafe {
            let block = self.base.add(offset);
            block
                .as_ptr()
                .sub(HEADER_SIZE)
                .cast::<AllocationHeader>()
                .write(AllocationHeader::new(padding));
            if let Some(pattern) = self.config.alloc_pattern {
                ptr::write_bytes(block.as_ptr(), pattern, size);
            }
            block
        };

        self.top = offset + size;
        self.counters.peak_used = self.counters.peak_used.max(self.top);
        Ok(block)
    }

    /// Creates a marker at the current stack position
    ///
    /// Rewinding to this marker later releases every allocation made after
    /// this point.
    pub fn marker(&self) -> StackMarker {
        StackMarker::new(self.top)
    }

    /// Restores the stack to a previous marker position
    ///
    /// All pointers handed out after the marker was taken become invalid. No
    /// destructors run for objects that lived in the released range.
    ///
    /// A marker above the current top is a programming error: it panics when
    /// [`StackConfig::panic_on_marker_misuse`] is set and otherwise returns
    /// [`StackError::InvalidMarker`] without touching the arena.
    pub fn free_to_marker(&mut self, marker: StackMarker) -> StackResult<()> {
        if marker.offset > self.top {
            let err = StackError::invalid_marker(marker.offset, self.top);
            if self.config.panic_on_marker_misuse {
                panic!("{err}");
            }
            return Err(err);
        }

        #[cfg(feature = "logging")]
        trace!(from = self.top, to = marker.offset, "stack arena rewind");

        self.rewind_to(marker.offset);
        if self.config.track_stats {
            self.counters.rewinds += 1;
        }
        Ok(())
    }

    /// Releases every allocation
    pub fn clear(&mut self) {
        #[cfg(feature = "logging")]
        trace!(from = self.top, "stack arena cleared");

        self.rewind_to(0);
        if self.config.track_stats {
            self.counters.clears += 1;
        }
    }

    /// Moves `top` down to `offset`, filling the released range if configured
    ///
    /// `offset` must not exceed `top`.
    fn rewind_to(&mut self, offset: usize) {
        debug_assert!(offset <= self.top);
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: `[offset, top)` lies inside the buffer.
            unsafe {
                ptr::write_bytes(self.base.as_ptr().add(offset), pattern, self.top - offset);
            }
        }
        self.top = offset;
    }

    /// Returns `true` if `ptr` points below the top of this arena
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let start = self.base.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= start && addr < start + self.top
    }

    /// Reads the padding recorded in front of a block
    ///
    /// Returns `None` if `ptr` does not point into the live region.
    ///
    /// # Safety
    /// `ptr` must be a block returned by this arena that has not been rewound
    /// past. For any other in-range pointer the result is meaningless.
    pub unsafe fn padding_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        if !self.contains(ptr) {
            return None;
        }
        let offset = ptr.as_ptr() as usize - self.base.as_ptr() as usize;
        if offset < HEADER_SIZE {
            return None;
        }
        // SAFETY: `offset - 1` is inside the live region; the caller
        // guarantees it holds a header written by `try_allocate`.
        let header = unsafe {
            self.base
                .as_ptr()
                .add(offset - HEADER_SIZE)
                .cast::<AllocationHeader>()
                .read()
        };
        Some(header.padding())
    }

    /// Returns a snapshot of the arena counters
    pub fn stats(&self) -> StackStats {
        self.counters.snapshot(self.top, self.capacity)
    }

    /// Resets the counters; the peak restarts from the current top
    pub fn reset_stats(&mut self) {
        self.counters = Counters {
            peak_used: self.top,
            ..Counters::default()
        };
    }

    /// Moves the buffer out, leaving an inert zero-capacity arena behind
    ///
    /// Every allocation against the arena left behind fails with
    /// [`StackError::OutOfMemory`].
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

impl Default for StackArena {
    /// Inert arena with zero capacity
    fn default() -> Self {
        Self {
            base: NonNull::dangling(),
            capacity: 0,
            top: 0,
            config: StackConfig::default(),
            counters: Counters::default(),
        }
    }
}

impl Drop for StackArena {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }

        #[cfg(feature = "logging")]
        debug!(capacity = self.capacity, used = self.top, "stack arena dropped");

        // SAFETY: a non-zero capacity means `base` came from `alloc::alloc`
        // with exactly this layout, and it is released only here.
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.capacity, MAX_ALIGNMENT);
            alloc::dealloc(self.base.as_ptr(), layout);
        }
    }
}

impl fmt::Debug for StackArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackArena")
            .field("capacity", &self.capacity)
            .field("used", &self.top)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LifoAllocator for StackArena {
    #[inline]
    fn allocate(&mut self, size: usize, align: usize) -> StackResult<NonNull<u8>> {
        Self::allocate(self, size, align)
    }

    #[inline]
    fn marker(&self) -> StackMarker {
        Self::marker(self)
    }

    #[inline]
    fn free_to_marker(&mut self, marker: StackMarker) -> StackResult<()> {
        Self::free_to_marker(self, marker)
    }

    #[inline]
    fn clear(&mut self) {
        Self::clear(self);
    }
}

// SAFETY: StackArena exclusively owns its buffer; no other handle to it
// exists, so moving the arena to another thread moves all access with it.
unsafe impl Send for StackArena {}
