//! Codec configuration.

use crate::error::ConfigError;

/// Configuration shared by the frame builders.
///
/// Controls the size of the fixed scratch region a builder encodes into.
/// Validated when a builder is finished; all values are
/// immutable after that point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecConfig {
    /// Capacity of the scratch buffer in bytes.
    ///
    /// Default: 8192. Must lie in
    /// [`MIN_SCRATCH_CAPACITY`](Self::MIN_SCRATCH_CAPACITY)..=[`MAX_SCRATCH_CAPACITY`](Self::MAX_SCRATCH_CAPACITY).
    pub scratch_capacity: usize,
}

impl CodecConfig {
    /// Default scratch capacity: 8 KiB.
    pub const DEFAULT_SCRATCH_CAPACITY: usize = 8192;

    /// Smallest accepted scratch capacity.
    pub const MIN_SCRATCH_CAPACITY: usize = 64;

    /// Largest accepted scratch capacity: 1 MiB.
    pub const MAX_SCRATCH_CAPACITY: usize = 1 << 20;

    /// Create a config with the given scratch capacity.
    pub fn with_scratch_capacity(scratch_capacity: usize) -> Self {
        Self { scratch_capacity }
    }

    /// Check the configured values against their bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scratch_capacity < Self::MIN_SCRATCH_CAPACITY {
            return Err(ConfigError::ScratchCapacityTooSmall {
                configured: self.scratch_capacity,
                minimum: Self::MIN_SCRATCH_CAPACITY,
            });
        }
        if self.scratch_capacity > Self::MAX_SCRATCH_CAPACITY {
            return Err(ConfigError::ScratchCapacityTooLarge {
                configured: self.scratch_capacity,
                maximum: Self::MAX_SCRATCH_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::with_scratch_capacity(Self::DEFAULT_SCRATCH_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = CodecConfig::default();
        assert_eq!(config.scratch_capacity, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(CodecConfig::with_scratch_capacity(CodecConfig::MIN_SCRATCH_CAPACITY)
            .validate()
            .is_ok());
        assert!(CodecConfig::with_scratch_capacity(CodecConfig::MAX_SCRATCH_CAPACITY)
            .validate()
            .is_ok());
    }

    #[test]
    fn too_small_rejected() {
        let err = CodecConfig::with_scratch_capacity(8).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ScratchCapacityTooSmall {
                configured: 8,
                minimum: 64
            }
        );
    }

    #[test]
    fn too_large_rejected() {
        let err = CodecConfig::with_scratch_capacity(usize::MAX)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ScratchCapacityTooLarge { .. }));
    }
}
