//! Device page cache transfers
//!
//! SPI NAND parts stage every page in an on-die cache: PAGE READ fills it
//! from the array, READ FROM CACHE drains it, PROGRAM LOAD fills it from the
//! host and PROGRAM EXECUTE commits it. [`CacheBridge`] owns the transfers
//! between caller buffers and that cache, and remembers which row is still
//! resident so repeated reads of one page skip the array access.

use crate::error::Result;
use crate::programmer::SpiMaster;
use crate::protocol::snand;
use crate::spi::opcodes;

use super::ecc::EccStatus;
use super::request::{ReadRequest, WriteRequest};

/// Column addressing of the device cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLayout {
    /// Main area bytes; the OOB starts at this column
    pub page_size: u32,
    /// Odd blocks live on the second plane, selected by a column bit
    pub plane_select: bool,
}

impl CacheLayout {
    /// Cache column of byte `offset` of a page of `block`
    pub fn column(&self, block: u32, offset: u32) -> u32 {
        if self.plane_select && block & 1 == 1 {
            offset | opcodes::COLUMN_PLANE_BIT
        } else {
            offset
        }
    }
}

/// Moves payload between caller buffers and the device page cache
pub trait CacheBridge {
    /// Load the request's data and OOB into the device cache
    ///
    /// Bytes of the page not covered by the request are left erased.
    fn write_to_cache<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        layout: &CacheLayout,
        req: &WriteRequest<'_>,
    ) -> Result<()>;

    /// Drain the request's data and OOB from the device cache after a load
    fn read_from_cache<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        layout: &CacheLayout,
        req: &mut ReadRequest<'_>,
    ) -> Result<()>;

    /// If `row` is still resident, the ECC result of the read that loaded it
    fn match_cache(&self, row: u32) -> Option<EccStatus>;

    /// Serve a read from the resident page without touching the array
    fn copy_from_cache<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        layout: &CacheLayout,
        req: &mut ReadRequest<'_>,
    ) -> Result<()>;

    /// Record that `row` was loaded with ECC result `ecc`
    fn set_resident(&mut self, row: u32, ecc: EccStatus);

    /// Forget the resident row
    fn invalidate(&mut self);
}

/// [`CacheBridge`] over the standard cache commands
#[derive(Debug, Default)]
pub struct SpiCacheBridge {
    resident: Option<(u32, EccStatus)>,
}

impl SpiCacheBridge {
    /// Create a bridge with nothing resident
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBridge for SpiCacheBridge {
    fn write_to_cache<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        layout: &CacheLayout,
        req: &WriteRequest<'_>,
    ) -> Result<()> {
        // PROGRAM LOAD overwrites whatever a previous PAGE READ left behind
        self.resident = None;

        let mut reset = true;
        if !req.data.is_empty() {
            let column = layout.column(req.block, req.offset);
            snand::load_cache(master, req.ctx, column, req.data, reset)?;
            reset = false;
        }
        if !req.oob.is_empty() {
            let column = layout.column(req.block, layout.page_size);
            snand::load_cache(master, req.ctx, column, req.oob, reset)?;
        }
        Ok(())
    }

    fn read_from_cache<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        layout: &CacheLayout,
        req: &mut ReadRequest<'_>,
    ) -> Result<()> {
        if !req.data.is_empty() {
            let column = layout.column(req.block, req.offset);
            snand::read_cache(master, req.ctx, column, req.data)?;
        }
        if !req.oob.is_empty() {
            let column = layout.column(req.block, layout.page_size);
            snand::read_cache(master, req.ctx, column, req.oob)?;
        }
        Ok(())
    }

    fn match_cache(&self, row: u32) -> Option<EccStatus> {
        match self.resident {
            Some((resident, ecc)) if resident == row => Some(ecc),
            _ => None,
        }
    }

    fn copy_from_cache<M: SpiMaster + ?Sized>(
        &mut self,
        master: &mut M,
        layout: &CacheLayout,
        req: &mut ReadRequest<'_>,
    ) -> Result<()> {
        // The page is still in the device cache; only the drain is needed
        self.read_from_cache(master, layout, req)
    }

    fn set_resident(&mut self, row: u32, ecc: EccStatus) {
        self.resident = Some((row, ecc));
    }

    fn invalidate(&mut self) {
        self.resident = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedMaster;

    const LAYOUT: CacheLayout = CacheLayout {
        page_size: 2048,
        plane_select: true,
    };

    #[test]
    fn test_plane_column() {
        assert_eq!(LAYOUT.column(4, 16), 16);
        assert_eq!(LAYOUT.column(5, 16), 16 | opcodes::COLUMN_PLANE_BIT);
        let single = CacheLayout {
            page_size: 2048,
            plane_select: false,
        };
        assert_eq!(single.column(5, 16), 16);
    }

    #[test]
    fn test_resident_tracking() {
        let mut bridge = SpiCacheBridge::new();
        assert_eq!(bridge.match_cache(7), None);

        bridge.set_resident(7, EccStatus::Limit);
        assert_eq!(bridge.match_cache(7), Some(EccStatus::Limit));
        assert_eq!(bridge.match_cache(8), None);

        bridge.invalidate();
        assert_eq!(bridge.match_cache(7), None);
    }

    #[test]
    fn test_write_invalidates_and_uses_random_load_for_oob() {
        let mut master = ScriptedMaster::new();
        let mut bridge = SpiCacheBridge::new();
        bridge.set_resident(3, EccStatus::Good);

        let data = [0u8; 512];
        let oob = [0u8; 16];
        let req = WriteRequest::new(0, 3, 0, &data[..], &oob[..]);
        bridge.write_to_cache(&mut master, &LAYOUT, &req).unwrap();

        assert_eq!(bridge.match_cache(3), None);
        assert_eq!(
            master.opcodes(),
            &[opcodes::PROGRAM_LOAD, opcodes::PROGRAM_LOAD_RANDOM]
        );
    }

    #[test]
    fn test_oob_only_write_resets_cache() {
        let mut master = ScriptedMaster::new();
        let mut bridge = SpiCacheBridge::new();

        let oob = [0u8; 16];
        let req = WriteRequest::new(0, 0, 0, &[], &oob[..]);
        bridge.write_to_cache(&mut master, &LAYOUT, &req).unwrap();
        assert_eq!(master.opcodes(), &[opcodes::PROGRAM_LOAD]);
    }
}
