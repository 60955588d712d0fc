//! Stack marker for position tracking

use core::fmt;

/// Marker representing a position in a [`StackArena`](super::StackArena)
///
/// Rewinding to a marker releases every allocation made after it was taken.
/// A marker is only meaningful for the arena that issued it, and only until
/// that arena is rewound below it. Markers order by position, so an older
/// marker compares less than or equal to a newer one from the same arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackMarker {
    pub(super) offset: usize,
}

impl StackMarker {
    /// Marker of an empty arena
    pub const ZERO: Self = Self { offset: 0 };

    pub(super) const fn new(offset: usize) -> Self {
        Self { offset }
    }

    /// Byte offset from the start of the buffer
    pub const fn offset(self) -> usize {
        self.offset
    }
}

impl fmt::Display for StackMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.offset)
    }
}
