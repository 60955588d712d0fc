//! Stack allocator configuration

use crate::error::{StackError, StackResult};
use crate::stack::{DEFAULT_ALIGNMENT, MAX_ALIGNMENT};

/// Byte written over the whole buffer at creation and over freed ranges in
/// debug configurations.
pub const DEBUG_FREE_PATTERN: u8 = 0xCD;

/// Byte written over freshly allocated blocks in debug configurations.
pub const DEBUG_ALLOC_PATTERN: u8 = 0x00;

/// Configuration for [`StackArena`](crate::StackArena)
///
/// The fill patterns are diagnostics only: they make reads of uninitialised
/// or rewound memory recognisable and never change the allocation contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// Fill pattern for newly allocated blocks
    pub alloc_pattern: Option<u8>,

    /// Fill pattern for the initial buffer and for rewound ranges
    pub dealloc_pattern: Option<u8>,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Alignment used by [`StackArena::allocate_default`](crate::StackArena::allocate_default)
    pub default_alignment: usize,

    /// Panic instead of returning [`StackError::InvalidMarker`] when a rewind
    /// targets a marker above the current top
    pub panic_on_marker_misuse: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::debug()
        } else {
            Self::production()
        }
    }
}

impl StackConfig {
    /// Production configuration - misuse is reported, never fatal
    pub fn production() -> Self {
        Self {
            alloc_pattern: None,
            dealloc_pattern: None,
            track_stats: false,
            default_alignment: DEFAULT_ALIGNMENT,
            panic_on_marker_misuse: false,
        }
    }

    /// Debug configuration - sentinel fills, stats, fatal marker misuse
    pub fn debug() -> Self {
        Self {
            alloc_pattern: Some(DEBUG_ALLOC_PATTERN),
            dealloc_pattern: Some(DEBUG_FREE_PATTERN),
            track_stats: true,
            default_alignment: DEFAULT_ALIGNMENT,
            panic_on_marker_misuse: true,
        }
    }

    /// Set the fill pattern for new blocks
    pub fn with_alloc_pattern(mut self, pattern: Option<u8>) -> Self {
        self.alloc_pattern = pattern;
        self
    }

    /// Set the fill pattern for freed ranges
    pub fn with_dealloc_pattern(mut self, pattern: Option<u8>) -> Self {
        self.dealloc_pattern = pattern;
        self
    }

    /// Enable or disable statistics
    pub fn with_stats(mut self, track_stats: bool) -> Self {
        self.track_stats = track_stats;
        self
    }

    /// Set the default alignment
    pub fn with_default_alignment(mut self, alignment: usize) -> Self {
        self.default_alignment = alignment;
        self
    }

    /// Choose between panicking and returning an error on marker misuse
    pub fn with_panic_on_marker_misuse(mut self, panic: bool) -> Self {
        self.panic_on_marker_misuse = panic;
        self
    }

    /// Check the configuration
    pub fn validate(&self) -> StackResult<()> {
        if !self.default_alignment.is_power_of_two() {
            return Err(StackError::invalid_config(
                "default_alignment must be a power of two",
            ));
        }
        if self.default_alignment > MAX_ALIGNMENT {
            return Err(StackError::invalid_config(
                "default_alignment exceeds the maximum supported alignment",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(StackConfig::default().validate().is_ok());
        assert!(StackConfig::production().validate().is_ok());
        assert!(StackConfig::debug().validate().is_ok());
    }

    #[test]
    fn default_follows_build_mode() {
        let config = StackConfig::default();
        assert_eq!(config.dealloc_pattern.is_some(), cfg!(debug_assertions));
        assert_eq!(config.panic_on_marker_misuse, cfg!(debug_assertions));
    }

    #[test]
    fn rejects_bad_default_alignment() {
        let err = StackConfig::production()
            .with_default_alignment(12)
            .validate()
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = StackConfig::production()
            .with_default_alignment(MAX_ALIGNMENT * 2)
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), "STACK:CONFIG:INVALID");
    }

    #[test]
    fn builders_override_fields() {
        let config = StackConfig::production()
            .with_alloc_pattern(Some(0xAA))
            .with_dealloc_pattern(Some(0xBB))
            .with_stats(true)
            .with_panic_on_marker_misuse(true);
        assert_eq!(config.alloc_pattern, Some(0xAA));
        assert_eq!(config.dealloc_pattern, Some(0xBB));
        assert!(config.track_stats);
        assert!(config.panic_on_marker_misuse);
    }
}
