//! NAND chip type definitions

use alloc::string::String;

use super::features::Features;

/// How a chip family reports on-die ECC results
///
/// The primary field always lives in the status register (0xC0) at `shift`.
/// Some families need a second register to refine the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum EccVariant {
    /// 2-bit field: 00 clean, 01 corrected, 10 uncorrectable, 11 corrected
    /// at the limit of the engine
    Status2Bit {
        /// Bit position of the field in the status register
        shift: u8,
    },
    /// 3-bit field (Micron): 000 clean, 001 1-3 bits, 011 4-6 bits,
    /// 101 7-8 bits corrected, 010 uncorrectable, anything else reserved
    Status3Bit {
        /// Bit position of the field in the status register
        shift: u8,
    },
    /// 2-bit ECCS field plus a 2-bit ECCSE sub-status in the extended status
    /// register (GigaDevice). ECCSE is only meaningful when ECCS is 01.
    StatusExtended {
        /// Bit position of ECCS in the status register
        shift: u8,
        /// Bit position of ECCSE in the extended status register
        ext_shift: u8,
    },
    /// 2-bit field in the status register plus a bitflip count returned by a
    /// dedicated command (Macronix "Get ECC Status")
    AuxRegister {
        /// Bit position of the field in the status register
        shift: u8,
        /// Bitflip count at or above which a corrected read is a LIMIT
        limit: u8,
    },
}

impl Default for EccVariant {
    fn default() -> Self {
        EccVariant::Status2Bit { shift: 4 }
    }
}

/// Pages of a block that carry the factory bad-block marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerPages {
    /// First page only
    #[default]
    First,
    /// First and second page
    FirstTwo,
    /// First and last page
    FirstAndLast,
    /// Last two pages
    LastTwo,
}

impl MarkerPages {
    /// Candidate pages to scan for a block of `pages_per_block` pages
    ///
    /// Returns the page indices and how many of them are valid (1 or 2).
    /// A block of a single page only has page 0 to scan.
    pub fn candidates(self, pages_per_block: u32) -> ([u32; 2], usize) {
        if pages_per_block < 2 {
            return ([0, 0], 1);
        }
        let last = pages_per_block - 1;
        match self {
            MarkerPages::First => ([0, 0], 1),
            MarkerPages::FirstTwo => ([0, 1], 2),
            MarkerPages::FirstAndLast => ([0, last], 2),
            MarkerPages::LastTwo => ([last - 1, last], 2),
        }
    }

    /// Whether a block of `pages_per_block` pages has every marker page
    pub fn fits(self, pages_per_block: u32) -> bool {
        match self {
            MarkerPages::First => pages_per_block >= 1,
            _ => pages_per_block >= 2,
        }
    }
}

/// Location of the bad-block marker byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BbmLayout {
    /// Which pages carry the marker
    pub pages: MarkerPages,
    /// Byte offset of the marker inside the OOB area
    pub offset: u16,
}

/// Serial NAND chip definition
///
/// This structure contains all the information needed to identify a chip
/// model and drive it: array geometry, ECC reporting and bad-block marker
/// convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NandChip {
    /// Vendor name (e.g., "Winbond")
    pub vendor: String,
    /// Chip name (e.g., "W25N01GV")
    pub name: String,
    /// Manufacturer ID (first ID byte)
    pub manufacturer_id: u8,
    /// Device ID (second and third ID bytes)
    pub device_id: u16,
    /// Number of dies in the package
    pub dies: u32,
    /// Erase blocks per die
    pub blocks_per_die: u32,
    /// Pages per erase block
    pub pages_per_block: u32,
    /// Main area bytes per page
    pub page_size: u32,
    /// Spare (OOB) bytes per page
    pub oob_size: u32,
    /// How ECC results are reported
    pub ecc: EccVariant,
    /// Bad-block marker layout
    pub bbm: BbmLayout,
    /// Feature flags
    pub features: Features,
}

impl NandChip {
    /// Get the total size of the main area in bytes
    pub fn total_size(&self) -> u64 {
        self.dies as u64
            * self.blocks_per_die as u64
            * self.pages_per_block as u64
            * self.page_size as u64
    }

    /// Get the erase block size in bytes
    pub fn block_size(&self) -> u32 {
        self.pages_per_block * self.page_size
    }

    /// Check whether the given ID bytes belong to this chip
    pub fn matches_id(&self, manufacturer_id: u8, device_id: u16) -> bool {
        self.manufacturer_id == manufacturer_id && self.device_id == device_id
    }

    /// Check if this chip has a specific feature
    pub fn has_feature(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_candidates() {
        assert_eq!(MarkerPages::First.candidates(64), ([0, 0], 1));
        assert_eq!(MarkerPages::FirstTwo.candidates(64), ([0, 1], 2));
        assert_eq!(MarkerPages::FirstAndLast.candidates(64), ([0, 63], 2));
        assert_eq!(MarkerPages::LastTwo.candidates(64), ([62, 63], 2));
        assert_eq!(MarkerPages::LastTwo.candidates(2), ([0, 1], 2));
    }

    #[test]
    fn test_marker_candidates_single_page_block() {
        for pages in [
            MarkerPages::First,
            MarkerPages::FirstTwo,
            MarkerPages::FirstAndLast,
            MarkerPages::LastTwo,
        ] {
            assert_eq!(pages.candidates(1), ([0, 0], 1));
        }
        assert!(MarkerPages::First.fits(1));
        assert!(!MarkerPages::LastTwo.fits(1));
        assert!(!MarkerPages::FirstAndLast.fits(1));
        assert!(MarkerPages::FirstTwo.fits(2));
    }
}
