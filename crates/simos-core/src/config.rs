//! Kernel configuration
//!
//! Construction-time parameters of a kernel. Validated once by
//! [`KernelConfig::validate`]; the kernel never re-checks them.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which resident page gets evicted when the frame table is full.
///
/// The victim is always the entry at the front of the frame table. The
/// policies differ only in whether a hit moves the page to the back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementPolicy {
    /// Evict the earliest loaded page; hits do not reorder
    #[default]
    Fifo,
    /// Evict the least recently used page; hits move the page to the back
    Lru,
}

impl ReplacementPolicy {
    /// Whether a hit reorders the frame table
    pub fn reorders_on_hit(self) -> bool {
        matches!(self, ReplacementPolicy::Lru)
    }
}

/// Kernel construction parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Number of disk units
    pub number_of_disks: usize,
    /// Bytes of RAM
    pub amount_of_ram: u64,
    /// Bytes per page (and per frame)
    pub page_size: u64,
    /// Page replacement policy
    #[serde(default)]
    pub replacement: ReplacementPolicy,
    /// Dispatch the ready queue's front when a disk event leaves the CPU idle
    #[serde(default)]
    pub dispatch_on_idle: bool,
}

impl KernelConfig {
    /// Configuration with FIFO replacement and no implicit dispatch
    pub fn new(number_of_disks: usize, amount_of_ram: u64, page_size: u64) -> Self {
        Self {
            number_of_disks,
            amount_of_ram,
            page_size,
            replacement: ReplacementPolicy::Fifo,
            dispatch_on_idle: false,
        }
    }

    /// Builder-style replacement policy override
    pub fn with_replacement(mut self, replacement: ReplacementPolicy) -> Self {
        self.replacement = replacement;
        self
    }

    /// Builder-style `dispatch_on_idle` override
    pub fn with_dispatch_on_idle(mut self, dispatch_on_idle: bool) -> Self {
        self.dispatch_on_idle = dispatch_on_idle;
        self
    }

    /// Check the parameters describe a usable machine
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.amount_of_ram < self.page_size {
            return Err(ConfigError::InsufficientRam {
                amount_of_ram: self.amount_of_ram,
                page_size: self.page_size,
            });
        }
        self.frame_capacity().map(|_| ())
    }

    /// Frame count as a table capacity
    pub fn frame_capacity(&self) -> Result<usize, ConfigError> {
        let frames = self.max_frames();
        usize::try_from(frames).map_err(|_| ConfigError::TooManyFrames { frames })
    }

    /// Number of frames in RAM (0 if the page size is zero)
    pub fn max_frames(&self) -> u64 {
        self.amount_of_ram.checked_div(self.page_size).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_frames_integer_division() {
        assert_eq!(KernelConfig::new(2, 1024, 256).max_frames(), 4);
        assert_eq!(KernelConfig::new(2, 1000, 256).max_frames(), 3);
        assert_eq!(KernelConfig::new(0, 256, 256).max_frames(), 1);
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let config = KernelConfig::new(1, 1024, 0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPageSize));
        assert_eq!(config.max_frames(), 0);
    }

    #[test]
    fn test_validate_rejects_ram_smaller_than_a_page() {
        let config = KernelConfig::new(1, 100, 256);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InsufficientRam {
                amount_of_ram: 100,
                page_size: 256
            })
        );
    }

    #[test]
    fn test_frame_capacity() {
        assert_eq!(KernelConfig::new(1, 1024, 256).frame_capacity(), Ok(4));
        assert_eq!(
            KernelConfig::new(1, 1 << 40, 1).frame_capacity(),
            usize::try_from(1u64 << 40).map_err(|_| ConfigError::TooManyFrames { frames: 1 << 40 })
        );
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_validate_rejects_frames_beyond_usize() {
        assert_eq!(
            KernelConfig::new(1, 1 << 40, 1).validate(),
            Err(ConfigError::TooManyFrames { frames: 1 << 40 })
        );
    }

    #[test]
    fn test_defaults() {
        let config = KernelConfig::new(3, 4096, 512);
        assert!(config.validate().is_ok());
        assert_eq!(config.replacement, ReplacementPolicy::Fifo);
        assert!(!config.dispatch_on_idle);
    }

    #[test]
    fn test_builders() {
        let config = KernelConfig::new(1, 1024, 256)
            .with_replacement(ReplacementPolicy::Lru)
            .with_dispatch_on_idle(true);
        assert_eq!(config.replacement, ReplacementPolicy::Lru);
        assert!(config.dispatch_on_idle);
    }

    #[test]
    fn test_policy_reordering() {
        assert!(!ReplacementPolicy::Fifo.reorders_on_hit());
        assert!(ReplacementPolicy::Lru.reorders_on_hit());
    }
}
