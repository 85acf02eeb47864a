//! Chip geometry with cached shift values
//!
//! All sizes are powers of two, so every conversion between bytes, sectors,
//! pages and blocks is a shift. The shifts are computed once when the
//! geometry is built at attach time.

use crate::error::{Error, Result};

use super::types::NandChip;

/// Unit for geometry size queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    /// Bytes
    Byte,
    /// ECC sectors
    Sector,
    /// Pages
    Page,
    /// Erase blocks
    Block,
}

/// Geometry of one addressing unit (physical, or doubled for super pages)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipGeometry {
    dies: u32,
    blocks_per_die: u32,
    pages_per_block: u32,
    page_size: u32,
    oob_size: u32,
    sector_size: u32,

    dies_shift: u32,
    blocks_per_die_shift: u32,
    pages_per_block_shift: u32,
    page_shift: u32,
    sector_shift: u32,
}

fn log2_exact(value: u32) -> Result<u32> {
    if value.is_power_of_two() {
        Ok(value.trailing_zeros())
    } else {
        Err(Error::InvalidGeometry)
    }
}

impl ChipGeometry {
    /// Build a geometry, validating that every size is a power of two
    pub fn new(
        dies: u32,
        blocks_per_die: u32,
        pages_per_block: u32,
        page_size: u32,
        oob_size: u32,
        sector_size: u32,
    ) -> Result<Self> {
        let geometry = Self {
            dies,
            blocks_per_die,
            pages_per_block,
            page_size,
            oob_size,
            sector_size,
            dies_shift: log2_exact(dies)?,
            blocks_per_die_shift: log2_exact(blocks_per_die)?,
            pages_per_block_shift: log2_exact(pages_per_block)?,
            page_shift: log2_exact(page_size)?,
            sector_shift: log2_exact(sector_size)?,
        };
        log2_exact(oob_size)?;
        if sector_size > page_size {
            return Err(Error::InvalidGeometry);
        }
        // Rows must fit the 3-byte row address
        let rows = geometry.total_blocks() as u64 * pages_per_block as u64;
        if rows > 1 << 24 {
            return Err(Error::InvalidGeometry);
        }
        Ok(geometry)
    }

    /// Build the physical geometry of a chip
    ///
    /// Blocks too short for the chip's marker pages are rejected.
    pub fn from_chip(chip: &NandChip, sector_size: u32) -> Result<Self> {
        if !chip.bbm.pages.fits(chip.pages_per_block) {
            return Err(Error::InvalidGeometry);
        }
        Self::new(
            chip.dies,
            chip.blocks_per_die,
            chip.pages_per_block,
            chip.page_size,
            chip.oob_size,
            sector_size,
        )
    }

    /// Geometry of the super unit: pages and OOB twice as large, half as
    /// many blocks per die
    pub fn doubled(&self) -> Result<Self> {
        if self.blocks_per_die < 2 {
            return Err(Error::InvalidGeometry);
        }
        Self::new(
            self.dies,
            self.blocks_per_die / 2,
            self.pages_per_block,
            self.page_size * 2,
            self.oob_size * 2,
            self.sector_size,
        )
    }

    /// Number of dies
    pub fn dies(&self) -> u32 {
        self.dies
    }

    /// Erase blocks per die
    pub fn blocks_per_die(&self) -> u32 {
        self.blocks_per_die
    }

    /// Pages per erase block
    pub fn pages_per_block(&self) -> u32 {
        self.pages_per_block
    }

    /// Main area bytes per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Spare bytes per page
    pub fn oob_size(&self) -> u32 {
        self.oob_size
    }

    /// ECC sector size in bytes
    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// Sectors per page
    pub fn sectors_per_page(&self) -> u32 {
        1 << (self.page_shift - self.sector_shift)
    }

    /// Erase blocks across all dies
    pub fn total_blocks(&self) -> u32 {
        self.blocks_per_die << self.dies_shift
    }

    /// Erase block size in bytes
    pub fn block_size(&self) -> u64 {
        1u64 << self.block_log2()
    }

    /// Physical page index of (block, page) without bounds checking
    pub fn row(&self, block: u32, page: u32) -> u32 {
        (block << self.pages_per_block_shift) | page
    }

    /// Index of `block` of `die` across the whole chip
    pub fn chip_block(&self, die: u32, block: u32) -> u32 {
        (die << self.blocks_per_die_shift) | block
    }

    fn block_log2(&self) -> u32 {
        self.page_shift + self.pages_per_block_shift
    }

    fn die_log2(&self) -> u32 {
        self.block_log2() + self.blocks_per_die_shift
    }

    fn unit_log2(&self, unit: SizeUnit) -> u32 {
        match unit {
            SizeUnit::Byte => 0,
            SizeUnit::Sector => self.sector_shift,
            SizeUnit::Page => self.page_shift,
            SizeUnit::Block => self.block_log2(),
        }
    }

    fn size_in(&self, log2: u32, unit: SizeUnit) -> u64 {
        let unit_log2 = self.unit_log2(unit);
        if log2 >= unit_log2 {
            1u64 << (log2 - unit_log2)
        } else {
            0
        }
    }

    /// Page size expressed in `unit` (0 if a page is smaller than the unit)
    pub fn page_size_in(&self, unit: SizeUnit) -> u64 {
        self.size_in(self.page_shift, unit)
    }

    /// Block size expressed in `unit`
    pub fn block_size_in(&self, unit: SizeUnit) -> u64 {
        self.size_in(self.block_log2(), unit)
    }

    /// Die size expressed in `unit`
    pub fn die_size_in(&self, unit: SizeUnit) -> u64 {
        self.size_in(self.die_log2(), unit)
    }

    /// Chip size expressed in `unit`
    pub fn chip_size_in(&self, unit: SizeUnit) -> u64 {
        self.size_in(self.die_log2() + self.dies_shift, unit)
    }
}
