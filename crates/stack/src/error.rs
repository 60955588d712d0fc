//! Error types for stack allocation
//!
//! Uses thiserror for the error definition. Every failure is a deterministic
//! function of the arena state and the request: nothing here is transient and
//! nothing is retried internally.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Error Types
// ============================================================================

/// Errors produced by [`StackArena`](crate::StackArena) and the typed layer
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    // --- Invalid arguments ---
    /// Zero-byte allocation request
    #[error("Cannot allocate zero bytes")]
    ZeroSize,

    /// Alignment is not a power of two
    #[error("Invalid alignment: {alignment} is not a power of two")]
    InvalidAlignment {
        /// The rejected alignment
        alignment: usize,
    },

    /// `size_of::<T>() * count` does not fit in `usize`
    #[error("Size overflow: {count} elements of {element_size} bytes")]
    SizeOverflow {
        /// Requested element count
        count: usize,
        /// Size of one element in bytes
        element_size: usize,
    },

    /// Capacity is zero or larger than the arena can address
    #[error("Invalid capacity: {capacity} bytes (max: {max})")]
    InvalidCapacity {
        /// Requested capacity
        capacity: usize,
        /// Largest supported capacity
        max: usize,
    },

    /// Rejected [`StackConfig`](crate::StackConfig)
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong
        reason: String,
    },

    // --- Exhaustion ---
    /// Request plus alignment padding does not fit in the remaining space
    #[error(
        "Stack out of memory: requested {requested} bytes + {padding} padding, {available} available"
    )]
    OutOfMemory {
        /// Requested block size
        requested: usize,
        /// Padding (header included) the block would need
        padding: usize,
        /// Bytes left between top and capacity
        available: usize,
    },

    /// The system allocator could not provide the backing buffer
    #[error("Backing buffer allocation of {capacity} bytes failed")]
    BufferAllocationFailed {
        /// Requested capacity
        capacity: usize,
    },

    // --- Contract violations ---
    /// Rewind target lies above the current top
    #[error("Invalid marker: offset {marker} is beyond the current top {top}")]
    InvalidMarker {
        /// Offset carried by the marker
        marker: usize,
        /// Top at the time of the call
        top: usize,
    },
}

/// Coarse classification of [`StackError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller passed a value the allocator cannot serve
    InvalidArgument,
    /// Not enough space left
    OutOfMemory,
    /// Stale or foreign marker; a programming defect
    MisuseOfMarker,
}

impl StackError {
    /// Get the coarse error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroSize
            | Self::InvalidAlignment { .. }
            | Self::SizeOverflow { .. }
            | Self::InvalidCapacity { .. }
            | Self::InvalidConfig { .. } => ErrorKind::InvalidArgument,
            Self::OutOfMemory { .. } | Self::BufferAllocationFailed { .. } => {
                ErrorKind::OutOfMemory
            },
            Self::InvalidMarker { .. } => ErrorKind::MisuseOfMarker,
        }
    }

    /// Get error code for categorization
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroSize => "STACK:ALLOC:ZERO",
            Self::InvalidAlignment { .. } => "STACK:ALLOC:ALIGN",
            Self::SizeOverflow { .. } => "STACK:ALLOC:OVERFLOW",
            Self::InvalidCapacity { .. } => "STACK:INIT:CAPACITY",
            Self::InvalidConfig { .. } => "STACK:CONFIG:INVALID",
            Self::OutOfMemory { .. } => "STACK:ALLOC:OOM",
            Self::BufferAllocationFailed { .. } => "STACK:INIT:BUFFER",
            Self::InvalidMarker { .. } => "STACK:MARKER:INVALID",
        }
    }

    /// Check if this error is a caller argument error
    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }

    /// Check if this error reports exhaustion
    pub fn is_out_of_memory(&self) -> bool {
        self.kind() == ErrorKind::OutOfMemory
    }

    /// Check if this error reports marker misuse
    pub fn is_marker_misuse(&self) -> bool {
        self.kind() == ErrorKind::MisuseOfMarker
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create size overflow error
    pub fn size_overflow(count: usize, element_size: usize) -> Self {
        Self::SizeOverflow {
            count,
            element_size,
        }
    }

    /// Create invalid capacity error
    pub fn invalid_capacity(capacity: usize, max: usize) -> Self {
        Self::InvalidCapacity { capacity, max }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create out of memory error
    pub fn out_of_memory(requested: usize, padding: usize, available: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(requested, padding, available, "stack arena exhausted");

        Self::OutOfMemory {
            requested,
            padding,
            available,
        }
    }

    /// Create buffer allocation failure error
    pub fn buffer_allocation_failed(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(capacity, "failed to allocate stack arena buffer");

        Self::BufferAllocationFailed { capacity }
    }

    /// Create invalid marker error
    pub fn invalid_marker(marker: usize, top: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(marker, top, "rewind to a marker above the stack top");

        Self::InvalidMarker { marker, top }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for stack operations
pub type StackResult<T> = core::result::Result<T, StackError>;

// ============================================================================
// Tests
// ============================================================================
