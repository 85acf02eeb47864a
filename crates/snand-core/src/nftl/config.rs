//! NFTL configuration
//!
//! With the `std` feature the configuration can be read from TOML:
//!
//! ```toml
//! unit = "super"
//! poll_timeout_ms = 1000
//! sector_size = 512
//!
//! [reserved]
//! start = 0x000000
//! end = 0x800000
//! ```

use crate::error::{Error, Result};
use crate::nand::{PartitionLayout, UnitKind};

/// Attach-time configuration of an [`Nftl`](super::Nftl)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct NftlConfig {
    /// Addressing unit of the page and block operations
    pub unit: UnitKind,
    /// Partition layout used for flat address translation
    #[cfg_attr(feature = "std", serde(flatten))]
    pub partitions: PartitionLayout,
    /// Busy poll timeout in milliseconds
    pub poll_timeout_ms: u32,
    /// ECC sector size in bytes, the unit of the sector bitmaps
    pub sector_size: u32,
}

impl Default for NftlConfig {
    fn default() -> Self {
        Self {
            unit: UnitKind::Physical,
            partitions: PartitionLayout::default(),
            poll_timeout_ms: 1000,
            sector_size: 512,
        }
    }
}

impl NftlConfig {
    /// Poll timeout in microseconds
    pub fn poll_timeout_us(&self) -> u32 {
        self.poll_timeout_ms.saturating_mul(1000)
    }

    /// Check values that do not depend on the chip
    pub fn validate(&self) -> Result<()> {
        if self.poll_timeout_ms == 0 || !self.sector_size.is_power_of_two() {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
pub use toml_loader::ConfigError;

#[cfg(feature = "std")]
mod toml_loader {
    use std::path::Path;
    use std::string::String;

    use super::NftlConfig;

    /// Errors that can occur when loading a configuration file
    #[derive(Debug, thiserror::Error)]
    pub enum ConfigError {
        /// I/O error reading the file
        #[error("failed to read config file: {0}")]
        Io(#[from] std::io::Error),

        /// TOML parse error
        #[error("failed to parse config: {0}")]
        Parse(#[from] toml::de::Error),

        /// Values out of range
        #[error("invalid config: {0}")]
        Invalid(crate::Error),
    }

    impl NftlConfig {
        /// Parse a configuration from TOML text
        pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
            let config: NftlConfig = toml::from_str(content)?;
            config.validate().map_err(ConfigError::Invalid)?;
            Ok(config)
        }

        /// Load a configuration from a TOML file
        pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
            let content: String = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        }
    }

}
