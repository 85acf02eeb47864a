//! Chip database for lookup by ID or name
//!
//! The database starts with a built-in table of representative serial NAND
//! families. With the `std` feature, more definitions can be loaded from RON
//! files at runtime.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::features::Features;
use super::types::{BbmLayout, EccVariant, MarkerPages, NandChip};

#[allow(clippy::too_many_arguments)]
fn chip(
    vendor: &str,
    name: &str,
    manufacturer_id: u8,
    device_id: u16,
    blocks_per_die: u32,
    page_size: u32,
    oob_size: u32,
    ecc: EccVariant,
    marker_pages: MarkerPages,
    features: Features,
) -> NandChip {
    NandChip {
        vendor: vendor.to_string(),
        name: name.to_string(),
        manufacturer_id,
        device_id,
        dies: 1,
        blocks_per_die,
        pages_per_block: 64,
        page_size,
        oob_size,
        ecc,
        bbm: BbmLayout {
            pages: marker_pages,
            offset: 0,
        },
        features,
    }
}

/// Built-in chip definitions
pub fn builtin_chips() -> Vec<NandChip> {
    alloc::vec![
        chip(
            "Winbond",
            "W25N01GV",
            0xEF,
            0xAA21,
            1024,
            2048,
            64,
            EccVariant::Status2Bit { shift: 4 },
            MarkerPages::First,
            Features::BUF_MODE | Features::LOCKED_AT_POR,
        ),
        chip(
            "GigaDevice",
            "GD5F1GQ4UB",
            0xC8,
            0xD148,
            1024,
            2048,
            128,
            EccVariant::StatusExtended {
                shift: 4,
                ext_shift: 4,
            },
            MarkerPages::First,
            Features::QUAD_ENABLE | Features::LOCKED_AT_POR,
        ),
        chip(
            "Micron",
            "MT29F2G01ABAGD",
            0x2C,
            0x2400,
            2048,
            2048,
            128,
            EccVariant::Status3Bit { shift: 4 },
            MarkerPages::First,
            Features::PLANE_SELECT | Features::LOCKED_AT_POR,
        ),
        chip(
            "Macronix",
            "MX35LF1GE4AB",
            0xC2,
            0x1200,
            1024,
            2048,
            64,
            EccVariant::AuxRegister { shift: 4, limit: 3 },
            MarkerPages::FirstTwo,
            Features::QUAD_ENABLE | Features::LOCKED_AT_POR,
        ),
        chip(
            "XTX",
            "XT26G01A",
            0x0B,
            0xE100,
            1024,
            2048,
            64,
            EccVariant::Status2Bit { shift: 4 },
            MarkerPages::FirstAndLast,
            Features::LOCKED_AT_POR,
        ),
        chip(
            "Dosilicon",
            "DS35Q1GA",
            0xE5,
            0x7100,
            1024,
            2048,
            64,
            EccVariant::Status2Bit { shift: 4 },
            MarkerPages::LastTwo,
            Features::LOCKED_AT_POR,
        ),
    ]
}

/// Runtime chip database
///
/// Holds a collection of NAND chip definitions.
#[derive(Debug, Clone, Default)]
pub struct ChipDatabase {
    chips: Vec<NandChip>,
}

impl ChipDatabase {
    /// Create an empty chip database
    pub fn new() -> Self {
        Self { chips: Vec::new() }
    }

    /// Create a database pre-filled with the built-in chips
    pub fn with_builtin() -> Self {
        Self {
            chips: builtin_chips(),
        }
    }

    /// Add a single chip definition
    pub fn add(&mut self, chip: NandChip) {
        self.chips.push(chip);
    }

    /// Get all chips in the database
    pub fn chips(&self) -> &[NandChip] {
        &self.chips
    }

    /// Get the number of chips in the database
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Find a chip by its ID bytes
    pub fn find_by_id(&self, manufacturer: u8, device: u16) -> Option<&NandChip> {
        self.chips
            .iter()
            .find(|c| c.matches_id(manufacturer, device))
    }

    /// Find a chip by exact name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&NandChip> {
        self.chips
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Find chips by vendor (case-insensitive)
    pub fn find_by_vendor(&self, vendor: &str) -> Vec<&NandChip> {
        self.chips
            .iter()
            .filter(|c| c.vendor.eq_ignore_ascii_case(vendor))
            .collect()
    }

    /// Iterate over all chips
    pub fn iter(&self) -> impl Iterator<Item = &NandChip> {
        self.chips.iter()
    }

    /// Names of all chips, comma separated
    pub fn names(&self) -> String {
        let names: Vec<&str> = self.chips.iter().map(|c| c.name.as_str()).collect();
        names.join(", ")
    }
}

#[cfg(feature = "std")]
pub use self::ron_loader::ChipDbError;

#[cfg(feature = "std")]
mod ron_loader {
    use std::fs;
    use std::io;
    use std::path::Path;

    use alloc::string::String;
    use alloc::vec::Vec;

    use super::ChipDatabase;
    use crate::chip::{BbmLayout, EccVariant, Features, NandChip};

    /// Error type for chip database operations
    #[derive(Debug, thiserror::Error)]
    pub enum ChipDbError {
        /// I/O error reading files
        #[error("I/O error: {0}")]
        Io(#[from] io::Error),
        /// RON parsing error
        #[error("parse error: {0}")]
        Parse(#[from] ron::error::SpannedError),
        /// Validation error
        #[error("validation error: {0}")]
        Validation(String),
    }

    /// Size specification with human-readable units (for RON parsing)
    #[derive(Debug, Clone, Copy, serde::Deserialize)]
    pub enum Size {
        /// Size in bytes
        B(u32),
        /// Size in kibibytes (1024 bytes)
        KiB(u32),
    }

    impl Size {
        /// Convert to bytes
        pub fn to_bytes(self) -> u32 {
            match self {
                Size::B(n) => n,
                Size::KiB(n) => n * 1024,
            }
        }
    }

    /// Feature flags for NAND chips (RON format)
    #[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
    #[serde(default)]
    struct FeaturesDef {
        plane_select: bool,
        buf_mode: bool,
        quad_enable: bool,
        locked_at_por: bool,
    }

    impl From<FeaturesDef> for Features {
        fn from(def: FeaturesDef) -> Self {
            let mut f = Features::empty();
            f.set(Features::PLANE_SELECT, def.plane_select);
            f.set(Features::BUF_MODE, def.buf_mode);
            f.set(Features::QUAD_ENABLE, def.quad_enable);
            f.set(Features::LOCKED_AT_POR, def.locked_at_por);
            f
        }
    }

    /// Single chip definition in RON format
    #[derive(Debug, Clone, serde::Deserialize)]
    struct ChipDef {
        name: String,
        device_id: u16,
        #[serde(default = "default_dies")]
        dies: u32,
        blocks_per_die: u32,
        #[serde(default = "default_pages_per_block")]
        pages_per_block: u32,
        page_size: Size,
        oob_size: Size,
        #[serde(default)]
        ecc: EccVariant,
        #[serde(default)]
        bbm: BbmLayout,
        #[serde(default)]
        features: FeaturesDef,
    }

    fn default_dies() -> u32 {
        1
    }

    fn default_pages_per_block() -> u32 {
        64
    }

    /// Vendor definition containing multiple chips
    #[derive(Debug, Clone, serde::Deserialize)]
    struct VendorDef {
        vendor: String,
        manufacturer_id: u8,
        chips: Vec<ChipDef>,
    }

    impl ChipDatabase {
        /// Load chip definitions from a single RON file
        pub fn load_file(&mut self, path: &Path) -> Result<usize, ChipDbError> {
            let content = fs::read_to_string(path)?;
            self.load_ron(&content)
        }

        /// Load chip definitions from a RON string
        pub fn load_ron(&mut self, content: &str) -> Result<usize, ChipDbError> {
            let vendor_def: VendorDef = ron::from_str(content)?;
            let count = vendor_def.chips.len();

            for chip_def in vendor_def.chips {
                let chip = NandChip {
                    vendor: vendor_def.vendor.clone(),
                    name: chip_def.name,
                    manufacturer_id: vendor_def.manufacturer_id,
                    device_id: chip_def.device_id,
                    dies: chip_def.dies,
                    blocks_per_die: chip_def.blocks_per_die,
                    pages_per_block: chip_def.pages_per_block,
                    page_size: chip_def.page_size.to_bytes(),
                    oob_size: chip_def.oob_size.to_bytes(),
                    ecc: chip_def.ecc,
                    bbm: chip_def.bbm,
                    features: chip_def.features.into(),
                };
                if u32::from(chip.bbm.offset) >= chip.oob_size {
                    return Err(ChipDbError::Validation(alloc::format!(
                        "{}: marker offset {} outside {}-byte OOB",
                        chip.name, chip.bbm.offset, chip.oob_size
                    )));
                }
                if !chip.bbm.pages.fits(chip.pages_per_block) {
                    return Err(ChipDbError::Validation(alloc::format!(
                        "{}: {:?} markers need more than {} page(s) per block",
                        chip.name, chip.bbm.pages, chip.pages_per_block
                    )));
                }
                self.chips.push(chip);
            }

            Ok(count)
        }

        /// Load all RON files from a directory
        pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ChipDbError> {
            let mut total = 0;

            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let path = entry.path();

                if path.extension().is_some_and(|ext| ext == "ron") {
                    total += self.load_file(&path)?;
                }
            }

            Ok(total)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let db = ChipDatabase::with_builtin();
        let chip = db.find_by_id(0xEF, 0xAA21).unwrap();
        assert_eq!(chip.name, "W25N01GV");
        assert_eq!(chip.total_size(), 128 * 1024 * 1024);

        assert!(db.find_by_name("mt29f2g01abagd").is_some());
        assert!(db.find_by_id(0x00, 0x0000).is_none());
    }

    #[test]
    fn test_builtin_marker_offsets_fit_oob() {
        for chip in builtin_chips() {
            assert!(u32::from(chip.bbm.offset) < chip.oob_size, "{}", chip.name);
        }
    }

    #[test]
    fn test_find_by_vendor() {
        let db = ChipDatabase::with_builtin();
        let winbond = db.find_by_vendor("winbond");
        assert_eq!(winbond.len(), 1);
        assert_eq!(winbond[0].name, "W25N01GV");
        assert!(db.find_by_vendor("Nobody").is_empty());
    }
}
