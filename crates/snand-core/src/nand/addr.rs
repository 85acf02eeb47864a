//! Flat address translation
//!
//! A flat byte address is split into (block, page, offset) of the unit that
//! covers it. Addresses inside the reserved partition use super units (two
//! physical blocks per block, two physical pages per page); everything else
//! uses physical units. Super block `k` is made of physical blocks `2k` and
//! `2k + 1`, so both unit sizes tile the chip with the same block boundaries
//! every two physical blocks.

use crate::chip::ChipGeometry;
use crate::error::{Error, Result};

/// Addressing unit of a device or partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum UnitKind {
    /// One physical page per page
    #[default]
    Physical,
    /// Two physical pages, in adjacent blocks, per page
    Super,
}

/// The one partition addressed in super units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ReservedPartition {
    /// First byte address (inclusive)
    pub start: u64,
    /// Last byte address (exclusive)
    pub end: u64,
}

/// Partition layout driving unit selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionLayout {
    /// Reserved super-unit partition, if any
    #[cfg_attr(feature = "std", serde(default))]
    pub reserved: Option<ReservedPartition>,
}

impl PartitionLayout {
    /// Layout with the reserved partition at `[start, end)`
    pub fn with_reserved(start: u64, end: u64) -> Self {
        Self {
            reserved: Some(ReservedPartition { start, end }),
        }
    }

    /// Check the layout against the physical geometry
    ///
    /// The reserved partition must be non-empty, lie inside the chip and be
    /// aligned to super blocks.
    pub fn validate(&self, geometry: &ChipGeometry) -> Result<()> {
        let Some(reserved) = self.reserved else {
            return Ok(());
        };
        let super_block = geometry.block_size() * 2;
        let chip_size = geometry.chip_size_in(crate::chip::SizeUnit::Byte);
        if reserved.start >= reserved.end
            || reserved.end > chip_size
            || reserved.start % super_block != 0
            || reserved.end % super_block != 0
        {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// Unit used for the byte at `addr`
    pub fn unit_at(&self, addr: u64) -> UnitKind {
        match self.reserved {
            Some(r) if addr >= r.start && addr < r.end => UnitKind::Super,
            _ => UnitKind::Physical,
        }
    }
}

/// Result of translating a flat address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrReq {
    /// Unit the block and page are expressed in
    pub unit: UnitKind,
    /// Block index (chip wide)
    pub block: u32,
    /// Page inside the block
    pub page: u32,
    /// Byte offset inside the page
    pub offset: u32,
}

/// Translate a flat byte address to (block, page, offset)
///
/// `geometry` is the physical geometry. Addresses past the end of the chip
/// are [`Error::OutOfRange`].
pub fn addr_to_req(geometry: &ChipGeometry, layout: &PartitionLayout, addr: u64) -> Result<AddrReq> {
    let chip_size = geometry.chip_size_in(crate::chip::SizeUnit::Byte);
    if addr >= chip_size {
        return Err(Error::OutOfRange);
    }

    let unit = layout.unit_at(addr);
    let (block_size, page_size) = match unit {
        UnitKind::Physical => (geometry.block_size(), geometry.page_size() as u64),
        UnitKind::Super => (geometry.block_size() * 2, geometry.page_size() as u64 * 2),
    };

    let within_block = addr % block_size;
    Ok(AddrReq {
        unit,
        block: (addr / block_size) as u32,
        page: (within_block / page_size) as u32,
        offset: (within_block % page_size) as u32,
    })
}

/// Physical page index (row) of (block, page)
///
/// Only meaningful for physical units; the position is bounds checked
/// before any hardware access.
pub fn req_to_paddr(geometry: &ChipGeometry, block: u32, page: u32) -> Result<u32> {
    if block >= geometry.total_blocks() || page >= geometry.pages_per_block() {
        return Err(Error::OutOfRange);
    }
    Ok(geometry.row(block, page))
}
