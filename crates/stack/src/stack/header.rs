//! Per-allocation padding header
//!
//! Every block returned by the arena is immediately preceded by one header
//! byte. The byte records how far the block start was pushed past the old top
//! (header included), so the exact insertion point of any live block can be
//! reconstructed from its pointer alone.
//!
//! ```text
//!  old top                      block
//!     |<------- padding ------->|
//!     [ unused ... ][ header ][ data ...
//! ```

use core::mem;

/// Largest supported alignment
///
/// Padding is stored in a single byte, so alignments above this are clamped.
pub const MAX_ALIGNMENT: usize = 256;

/// Alignment used when the caller does not ask for one
///
/// Matches `max_align_t` on mainstream 64-bit targets.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Header size in bytes
pub const HEADER_SIZE: usize = mem::size_of::<AllocationHeader>();

/// Padding record written before each block
///
/// Padding is always in `1..=MAX_ALIGNMENT`: at least one byte for the header
/// itself, at most a full alignment step. The single value that does not fit a
/// byte, 256, is stored as `0`, which can never occur otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct AllocationHeader {
    raw: u8,
}

impl AllocationHeader {
    /// Encode a padding amount
    #[inline]
    pub const fn new(padding: usize) -> Self {
        debug_assert!(padding >= HEADER_SIZE && padding <= MAX_ALIGNMENT);
        Self { raw: padding as u8 }
    }

    /// Decode from the stored byte
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self { raw }
    }

    /// Stored byte
    #[inline]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Padding in bytes, header included
    #[inline]
    pub const fn padding(self) -> usize {
        if self.raw == 0 {
            MAX_ALIGNMENT
        } else {
            self.raw as usize
        }
    }
}

/// Normalises a requested alignment
///
/// Returns `None` for values that are not a power of two (including 0) and
/// clamps anything above [`MAX_ALIGNMENT`].
#[inline]
pub(crate) const fn effective_alignment(align: usize) -> Option<usize> {
    if !align.is_power_of_two() {
        return None;
    }
    if align > MAX_ALIGNMENT {
        Some(MAX_ALIGNMENT)
    } else {
        Some(align)
    }
}

/// Padding needed to place a header and an `align`-aligned block at `offset`
///
/// `align` must be a power of two. Returns `None` on overflow.
#[inline]
pub(crate) const fn padding_for(offset: usize, align: usize) -> Option<usize> {
    let Some(candidate) = offset.checked_add(HEADER_SIZE + align - 1) else {
        return None;
    };
    let aligned = candidate & !(align - 1);
    Some(aligned - offset)
}
