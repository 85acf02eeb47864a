//! Emulated device backed by an image file

use std::path::Path;

use snand_core::chip::ChipDatabase;
use snand_core::nand::{MemoryBbt, SpiCacheBridge};
use snand_core::nftl::{ConfigError, Nftl, NftlConfig};
use snand_dummy::{DummyNand, ImageError};

/// The translation layer over the emulated chip
pub type Device = Nftl<DummyNand, SpiCacheBridge, MemoryBbt>;

/// Errors that can occur while opening or saving the device
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Chip name not in the database
    #[error("chip {0} not found in the database (see `snand list`)")]
    UnknownChip(String),

    /// Database has no chip to default to
    #[error("chip database is empty")]
    EmptyDatabase,

    /// Image could not be loaded or saved
    #[error("image: {0}")]
    Image(#[from] ImageError),

    /// Configuration file could not be loaded
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Attach failed
    #[error("attach: {0}")]
    Attach(#[from] snand_core::Error),
}

/// Load the configuration file, or the defaults without one
pub fn load_config(path: Option<&Path>) -> Result<NftlConfig, DeviceError> {
    match path {
        Some(path) => {
            let config = NftlConfig::from_file(path)?;
            log::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(NftlConfig::default()),
    }
}

/// Attach to the chip `chip_name` emulated from `image`
pub fn open(
    db: &ChipDatabase,
    chip_name: Option<&str>,
    image: &Path,
    config: NftlConfig,
) -> Result<Device, DeviceError> {
    let chip = match chip_name {
        Some(name) => db
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| DeviceError::UnknownChip(name.to_string()))?,
        None => db
            .chips()
            .first()
            .cloned()
            .ok_or(DeviceError::EmptyDatabase)?,
    };

    let nand = if image.exists() {
        DummyNand::from_image(chip.clone(), image)?
    } else {
        log::info!("{} not found, starting from an erased chip", image.display());
        DummyNand::new(chip.clone())
    };

    Ok(Nftl::attach(
        nand,
        chip,
        SpiCacheBridge::new(),
        MemoryBbt::new(),
        config,
    )?)
}

/// Write the device array back to `image`
pub fn save(nftl: &Device, image: &Path) -> Result<(), DeviceError> {
    nftl.with_device(|ops| ops.master().save_image(image))?;
    log::debug!("Saved {}", image.display());
    Ok(())
}
