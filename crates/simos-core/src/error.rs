//! Kernel errors
//!
//! Precondition failures are values, never panics. Every operation checks
//! its preconditions before touching any state, so an `Err` always means the
//! kernel is exactly as it was before the call.

use serde::{Deserialize, Serialize};

/// Errors returned by kernel operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum KernelError {
    /// The operation needs a running process but the CPU is idle.
    #[error("CPU is idle")]
    Idle,

    /// Disk number outside `0..disks`.
    #[error("invalid disk {disk}: kernel has {disks} disk(s)")]
    InvalidDisk {
        /// Requested disk
        disk: usize,
        /// Number of disks the kernel was built with
        disks: usize,
    },
}

/// Errors returned when building a kernel from a configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Page size must be positive.
    #[error("page size must be greater than zero")]
    ZeroPageSize,

    /// RAM must hold at least one page.
    #[error("{amount_of_ram} bytes of RAM cannot hold a single {page_size}-byte page")]
    InsufficientRam {
        /// Configured RAM in bytes
        amount_of_ram: u64,
        /// Configured page size in bytes
        page_size: u64,
    },

    /// The frame count does not fit the target's address space.
    #[error("{frames} frames exceed the addressable frame table")]
    TooManyFrames {
        /// `amount_of_ram / page_size`
        frames: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_kernel_error_messages() {
        assert_eq!(KernelError::Idle.to_string(), "CPU is idle");
        assert_eq!(
            KernelError::InvalidDisk { disk: 5, disks: 2 }.to_string(),
            "invalid disk 5: kernel has 2 disk(s)"
        );
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::ZeroPageSize.to_string(),
            "page size must be greater than zero"
        );
        assert_eq!(
            ConfigError::InsufficientRam {
                amount_of_ram: 100,
                page_size: 256
            }
            .to_string(),
            "100 bytes of RAM cannot hold a single 256-byte page"
        );
        assert_eq!(
            ConfigError::TooManyFrames { frames: 7 }.to_string(),
            "7 frames exceed the addressable frame table"
        );
    }
}
