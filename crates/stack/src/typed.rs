//! Typed allocation over a [`LifoAllocator`]
//!
//! The raw allocator hands out bytes and never runs destructors. This layer
//! sizes requests from `T`, constructs elements in place and provides the
//! matching destruction helpers. Destruction is the caller's responsibility
//! and must happen before a rewind or clear reclaims the storage.
//!
//! ```rust
//! use nebula_stack::prelude::*;
//!
//! # fn main() -> nebula_stack::StackResult<()> {
//! let mut arena = StackArena::new(1024)?;
//! let names = arena.allocate_cloned(3, &String::from("n/a"))?;
//!
//! // SAFETY: every element was constructed and nothing rewound the block.
//! unsafe {
//!     assert_eq!(names.as_ref()[2], "n/a");
//!     destroy_slice(names);
//! }
//! arena.clear();
//! # Ok(())
//! # }
//! ```

use core::mem::{self, ManuallyDrop};
use core::ptr::{self, NonNull};

use crate::error::{StackError, StackResult};
use crate::traits::LifoAllocator;

/// Element-typed operations, available on every [`LifoAllocator`]
pub trait TypedAllocator: LifoAllocator {
    /// Reserves aligned storage for `count` values of `T` without
    /// constructing them
    ///
    /// # Errors
    /// - [`StackError::SizeOverflow`] if `size_of::<T>() * count` overflows
    /// - [`StackError::ZeroSize`] if that product is zero
    /// - any error of the underlying allocator
    fn allocate_uninit<T>(&mut self, count: usize) -> StackResult<NonNull<T>> {
        let element_size = mem::size_of::<T>();
        let bytes = element_size
            .checked_mul(count)
            .ok_or_else(|| StackError::size_overflow(count, element_size))?;
        if bytes == 0 {
            return Err(StackError::ZeroSize);
        }

        let ptr = self.allocate(bytes, mem::align_of::<T>())?;
        Ok(ptr.cast())
    }

    /// Reserves storage for `count` values and constructs each one with `init`
    ///
    /// Elements are built in forward order, each by a separate call. If `init`
    /// panics, the elements already built are dropped before the panic
    /// propagates; the storage itself stays allocated until rewound.
    fn allocate_typed_with<T, F>(&mut self, count: usize, mut init: F) -> StackResult<NonNull<[T]>>
    where
        F: FnMut() -> T,
    {
        let first = self.allocate_uninit::<T>(count)?;

        let mut built = PartialInit {
            first,
            initialized: 0,
        };
        while built.initialized < count {
            let value = init();
            // SAFETY: `initialized < count` and the block holds `count`
            // properly aligned slots that nothing else references yet.
            unsafe { first.add(built.initialized).write(value) };
            built.initialized += 1;
        }
        let _ = ManuallyDrop::new(built);

        Ok(NonNull::slice_from_raw_parts(first, count))
    }

    /// [`allocate_typed_with`](Self::allocate_typed_with) using `T::default`
    fn allocate_typed<T: Default>(&mut self, count: usize) -> StackResult<NonNull<[T]>> {
        self.allocate_typed_with(count, T::default)
    }

    /// [`allocate_typed_with`](Self::allocate_typed_with) cloning `value`
    fn allocate_cloned<T: Clone>(&mut self, count: usize, value: &T) -> StackResult<NonNull<[T]>> {
        self.allocate_typed_with(count, || value.clone())
    }
}

impl<A: LifoAllocator + ?Sized> TypedAllocator for A {}

/// Drops the constructed prefix if initialization unwinds
struct PartialInit<T> {
    first: NonNull<T>,
    initialized: usize,
}

impl<T> Drop for PartialInit<T> {
    fn drop(&mut self) {
        // SAFETY: exactly the first `initialized` slots were written.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.first.as_ptr(),
                self.initialized,
            ));
        }
    }
}

/// Runs the destructor of `count` consecutive values starting at `ptr`
///
/// Elements are dropped in forward order. Does nothing for a null pointer or
/// when `T` has no drop glue. The storage is not released.
///
/// # Safety
/// - `ptr` must be null or point to `count` initialized, properly aligned
///   values of `T`
/// - the values must not be used or destroyed again afterwards
pub unsafe fn destroy_typed<T>(ptr: *mut T, count: usize) {
    if ptr.is_null() || !mem::needs_drop::<T>() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr, count)) };
}

/// [`destroy_typed`] for a slice returned by the typed allocation methods
///
/// # Safety
/// Same contract as [`destroy_typed`] for every element of `slice`.
pub unsafe fn destroy_slice<T>(slice: NonNull<[T]>) {
    // SAFETY: forwarded to the caller.
    unsafe { destroy_typed(slice.as_ptr().cast::<T>(), slice.len()) };
}
