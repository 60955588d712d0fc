//! RAII rewind guard
//!
//! A [`RewindGuard`] records the arena top when it is created and rewinds to
//! it when dropped, on every exit path including `?` and unwinding. The guard
//! holds the arena by `&mut`, so guards nest strictly and the borrow checker
//! rejects any attempt to outlive or interleave them.
//!
//! The guard only gives shared access to the arena itself. Mutation goes
//! through the forwarding methods below, so the arena behind a live guard
//! cannot be swapped out or taken.

use core::fmt;
use core::mem::ManuallyDrop;
use core::alloc::Layout;
use core::ops::Deref;
use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::warn;

use super::{StackArena, StackMarker};
use crate::error::StackResult;
use crate::traits::LifoAllocator;

/// Scoped region of a [`StackArena`]
///
/// Allocations go through the guard with the same methods as the arena, and
/// read-only queries reach the arena through `Deref`. Everything allocated
/// after the guard was created is released when it drops. Destructors are
/// not run.
///
/// The arena cannot be replaced while the guard holds it:
///
/// ```compile_fail
/// # use nebula_stack::StackArena;
/// let mut arena = StackArena::new(256).unwrap();
/// let mut frame = arena.guard();
/// let escaped = frame.take();
/// ```
///
/// ```compile_fail
/// # use nebula_stack::StackArena;
/// let mut arena = StackArena::new(256).unwrap();
/// let mut other = StackArena::new(256).unwrap();
/// let mut frame = arena.guard();
/// core::mem::swap(&mut *frame, &mut other);
/// ```
pub struct RewindGuard<'a> {
    arena: &'a mut StackArena,
    marker: StackMarker,
}

impl<'a> RewindGuard<'a> {
    /// Creates a guard that rewinds `arena` to its current top on drop
    pub fn new(arena: &'a mut StackArena) -> Self {
        let marker = arena.marker();
        Self { arena, marker }
    }

    /// Position the guard rewinds to
    pub fn marker(&self) -> StackMarker {
        self.marker
    }

    /// Bytes allocated since the guard was created, padding included
    pub fn allocated_since(&self) -> usize {
        self.arena.used().saturating_sub(self.marker.offset)
    }

    /// Rewind now and consume the guard
    pub fn rewind(self) {
        drop(self);
    }

    /// Consume the guard without rewinding
    ///
    /// Allocations made through the guard stay live in the arena.
    pub fn leak(self) {
        let _ = ManuallyDrop::new(self);
    }

    /// See [`StackArena::allocate`]
    #[inline]
    pub fn allocate(&mut self, size: usize, align: usize) -> StackResult<NonNull<u8>> {
        self.arena.allocate(size, align)
    }

    /// See [`StackArena::allocate_default`]
    #[inline]
    pub fn allocate_default(&mut self, size: usize) -> StackResult<NonNull<u8>> {
        self.arena.allocate_default(size)
    }

    /// See [`StackArena::allocate_layout`]
    #[inline]
    pub fn allocate_layout(&mut self, layout: Layout) -> StackResult<NonNull<u8>> {
        self.arena.allocate_layout(layout)
    }

    /// See [`StackArena::free_to_marker`]
    ///
    /// Rewinding below [`marker`](Self::marker) is allowed; the guard then
    /// has nothing left to release on drop.
    #[inline]
    pub fn free_to_marker(&mut self, marker: StackMarker) -> StackResult<()> {
        self.arena.free_to_marker(marker)
    }

    /// See [`StackArena::clear`]
    #[inline]
    pub fn clear(&mut self) {
        self.arena.clear();
    }

    /// Opens a nested guard at the current top
    pub fn guard(&mut self) -> RewindGuard<'_> {
        RewindGuard::new(self.arena)
    }
}

impl Drop for RewindGuard<'_> {
    fn drop(&mut self) {
        if self.marker.offset > self.arena.used() {
            // Rewound or cleared below the marker while the guard was live;
            // nothing above the marker is left to release.
            #[cfg(feature = "logging")]
            warn!(
                marker = self.marker.offset,
                top = self.arena.used(),
                "rewind guard dropped above the stack top"
            );
            return;
        }

        // Cannot fail: the marker is at or below the top.
        let _ = self.arena.free_to_marker(self.marker);
    }
}

impl Deref for RewindGuard<'_> {
    type Target = StackArena;

    fn deref(&self) -> &StackArena {
        self.arena
    }
}

impl fmt::Debug for RewindGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewindGuard")
            .field("marker", &self.marker)
            .field("top", &self.arena.used())
            .finish()
    }
}

impl LifoAllocator for RewindGuard<'_> {
    #[inline]
    fn allocate(&mut self, size: usize, align: usize) -> StackResult<NonNull<u8>> {
        Self::allocate(self, size, align)
    }

    /// Current top of the arena, not the guard's own marker
    #[inline]
    fn marker(&self) -> StackMarker {
        self.arena.marker()
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

impl StackArena {
    /// Creates a [`RewindGuard`] at the current top
    pub fn guard(&mut self) -> RewindGuard<'_> {
        RewindGuard::new(self)
    }

    /// Runs `f` inside a guard and rewinds once it returns or unwinds
    ///
    /// ```rust
    /// # use nebula_stack::StackArena;
    /// # fn main() -> nebula_stack::StackResult<()> {
    /// let mut arena = StackArena::new(512)?;
    /// let used = arena.scoped(|scope| -> nebula_stack::StackResult<usize> {
    ///     scope.allocate(64, 8)?;
    ///     Ok(scope.allocated_since())
    /// })?;
    /// assert_eq!(used, 72);
    /// assert!(arena.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut RewindGuard<'_>) -> R) -> R {
        let mut guard = self.guard();
        f(&mut guard)
    }
}
