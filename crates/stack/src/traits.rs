//! Raw allocator interface
//!
//! [`LifoAllocator`] is the seam between the raw stack and anything built on
//! top of it. The typed layer is written against this trait only.

use core::ptr::NonNull;

use crate::error::StackResult;
use crate::stack::StackMarker;

/// Byte allocator with stack discipline
///
/// Blocks are handed out in order and reclaimed only by rewinding to a
/// marker or clearing. Implementations never run destructors.
pub trait LifoAllocator {
    /// Allocate `size` bytes aligned to `align`
    ///
    /// The returned pointer stays valid until a rewind or clear crosses it.
    fn allocate(&mut self, size: usize, align: usize) -> StackResult<NonNull<u8>>;

    /// Snapshot of the current top
    fn marker(&self) -> StackMarker;

    /// Release everything allocated after `marker`
    fn free_to_marker(&mut self, marker: StackMarker) -> StackResult<()>;

    /// Release everything
    fn clear(&mut self);
}

impl<A: LifoAllocator + ?Sized> LifoAllocator for &mut A {
    #[inline]
    fn allocate(&mut self, size: usize, align: usize) -> StackResult<NonNull<u8>> {
        (**self).allocate(size, align)
    }

    #[inline]
    fn marker(&self) -> StackMarker {
        (**self).marker()
    }

    #[inline]
    fn free_to_marker(&mut self, marker: StackMarker) -> StackResult<()> {
        (**self).free_to_marker(marker)
    }

    #[inline]
    fn clear(&mut self) {
        (**self).clear();
    }
}
