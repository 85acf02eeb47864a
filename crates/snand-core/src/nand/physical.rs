//! Physical block operations
//!
//! [`PhysicalOps`] owns the transport, the cache bridge and the bad-block
//! table of one device and turns them into page and block operations on
//! physical units. It holds no lock: callers serialize access (see
//! [`Nftl`](crate::nftl::Nftl)).

use crate::chip::{ChipGeometry, Features, NandChip};
use crate::error::{Error, Result};
use crate::programmer::{ExecContext, SpiMaster};
use crate::protocol::snand;
use crate::spi::opcodes;

use super::bbt::BadBlockTable;
use super::cache::{CacheBridge, CacheLayout};
use super::ecc::{check_ecc, EccStatus};
use super::ops::BlockOps;
use super::request::{OpMode, ReadRequest, WriteRequest};

/// Page and block operations on physical units of one device
pub struct PhysicalOps<M, C, T> {
    master: M,
    cache: C,
    bbt: T,
    chip: NandChip,
    geometry: ChipGeometry,
    layout: CacheLayout,
    poll_timeout_us: u32,
}

impl<M: SpiMaster, C: CacheBridge, T: BadBlockTable> PhysicalOps<M, C, T> {
    /// Bring up the device
    ///
    /// Resets the chip, checks that its ID matches `chip`, clears block
    /// protection and makes sure on-die ECC (plus buffer mode and quad
    /// enable, where the family needs them) is switched on.
    pub fn attach(
        mut master: M,
        chip: NandChip,
        cache: C,
        bbt: T,
        sector_size: u32,
        poll_timeout_us: u32,
    ) -> Result<Self> {
        let geometry = ChipGeometry::from_chip(&chip, sector_size)?;

        snand::reset(&mut master, poll_timeout_us)?;
        let (manufacturer, device) = snand::read_id(&mut master)?;
        if !chip.matches_id(manufacturer, device) {
            log::error!(
                "ID {:02X} {:04X} does not match {} {} ({:02X} {:04X})",
                manufacturer,
                device,
                chip.vendor,
                chip.name,
                chip.manufacturer_id,
                chip.device_id
            );
            return Err(Error::IdMismatch);
        }

        snand::unlock_all(&mut master)?;

        let mut config = opcodes::CFG_ECC_EN;
        if chip.has_feature(Features::BUF_MODE) {
            config |= opcodes::CFG_BUF;
        }
        if chip.has_feature(Features::QUAD_ENABLE) {
            config |= opcodes::CFG_QE;
        }
        snand::update_feature(
            &mut master,
            ExecContext::Normal,
            opcodes::FEATURE_CONFIG,
            config,
            config,
        )?;

        log::debug!(
            "attached {} {}: {} dies x {} blocks x {} pages x {}+{} bytes",
            chip.vendor,
            chip.name,
            geometry.dies(),
            geometry.blocks_per_die(),
            geometry.pages_per_block(),
            geometry.page_size(),
            geometry.oob_size()
        );

        let layout = CacheLayout {
            page_size: chip.page_size,
            plane_select: chip.has_feature(Features::PLANE_SELECT),
        };

        Ok(Self {
            master,
            cache,
            bbt,
            chip,
            geometry,
            layout,
            poll_timeout_us,
        })
    }

    /// Chip description
    pub fn chip(&self) -> &NandChip {
        &self.chip
    }

    /// Bad-block table
    pub fn bbt(&self) -> &T {
        &self.bbt
    }

    /// Bad-block table (mutable)
    pub fn bbt_mut(&mut self) -> &mut T {
        &mut self.bbt
    }

    /// Transport
    pub fn master(&self) -> &M {
        &self.master
    }

    /// Transport (mutable)
    pub fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    /// Give back the transport, cache bridge and bad-block table
    pub fn into_parts(self) -> (M, C, T) {
        (self.master, self.cache, self.bbt)
    }

    /// Reset the device
    pub fn reset(&mut self) -> Result<()> {
        self.cache.invalidate();
        snand::reset(&mut self.master, self.poll_timeout_us)
    }

    /// Read (manufacturer, device) ID
    pub fn read_id(&mut self) -> Result<(u8, u16)> {
        snand::read_id(&mut self.master)
    }

    /// Run `f` with on-die ECC switched off when `mode` is raw
    ///
    /// ECC is switched back on even if `f` fails; the first error wins.
    fn with_mode<R>(
        &mut self,
        mode: OpMode,
        ctx: ExecContext,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        if mode == OpMode::Normal {
            return f(self);
        }

        // Raw page loads must never satisfy a later ECC-checked read
        self.cache.invalidate();
        snand::set_ecc_enabled(&mut self.master, ctx, false)?;
        let result = f(self);
        let restore = snand::set_ecc_enabled(&mut self.master, ctx, true);
        let value = result?;
        restore?;
        Ok(value)
    }
}

impl<M: SpiMaster, C: CacheBridge, T: BadBlockTable> BlockOps for PhysicalOps<M, C, T> {
    fn geometry(&self) -> &ChipGeometry {
        &self.geometry
    }

    fn is_bad(&mut self, block: u32) -> Result<bool> {
        self.is_bad_block(block)
    }

    fn mark_bad(&mut self, block: u32) -> Result<()> {
        self.mark_bad_block(block)
    }

    fn erase_block(&mut self, block: u32, ctx: ExecContext) -> Result<()> {
        if block >= self.geometry.total_blocks() {
            return Err(Error::OutOfRange);
        }
        let row = self.geometry.row(block, 0);
        log::trace!("erase block {} (row 0x{:06X})", block, row);

        self.cache.invalidate();
        snand::write_enable(&mut self.master, ctx)?;
        snand::row_command(&mut self.master, ctx, opcodes::BLOCK_ERASE, row)?;
        let status = snand::wait_ready(&mut self.master, ctx, self.poll_timeout_us)?;
        if status.erase_failed() {
            log::error!("erase failed at block {}", block);
            return Err(Error::EraseFailure { row });
        }
        Ok(())
    }

    fn write_page(&mut self, req: &WriteRequest<'_>) -> Result<()> {
        req.validate(&self.geometry)?;
        let row = self.geometry.row(req.block, req.page);
        let ctx = req.ctx;

        self.with_mode(req.mode, ctx, |ops| {
            snand::write_enable(&mut ops.master, ctx)?;
            ops.cache.write_to_cache(&mut ops.master, &ops.layout, req)?;
            snand::row_command(&mut ops.master, ctx, opcodes::PROGRAM_EXECUTE, row)?;
            let status = snand::wait_ready(&mut ops.master, ctx, ops.poll_timeout_us)?;
            if status.program_failed() {
                log::error!("program failed at block {} page {}", req.block, req.page);
                return Err(Error::ProgramFailure { row });
            }
            Ok(())
        })
    }

    fn read_page(&mut self, req: &mut ReadRequest<'_>) -> Result<EccStatus> {
        req.validate(&self.geometry)?;
        let row = self.geometry.row(req.block, req.page);

        if !req.is_raw() {
            if let Some(ecc) = self.cache.match_cache(row) {
                log::debug!("row 0x{:06X} resident in device cache", row);
                self.cache
                    .copy_from_cache(&mut self.master, &self.layout, req)?;
                return Ok(ecc);
            }
        }

        let (block, page) = (req.block, req.page);
        let mode = req.mode;
        let ctx = req.ctx;
        let variant = self.chip.ecc;

        let ecc = self.with_mode(mode, ctx, |ops| {
            ops.cache.invalidate();
            snand::row_command(&mut ops.master, ctx, opcodes::PAGE_READ, row)?;
            let status = snand::wait_ready(&mut ops.master, ctx, ops.poll_timeout_us)?;
            ops.cache.read_from_cache(&mut ops.master, &ops.layout, req)?;
            if mode == OpMode::Raw {
                return Ok(EccStatus::Good);
            }
            let ecc = check_ecc(&mut ops.master, ctx, variant, status)?;
            ops.cache.set_resident(row, ecc);
            Ok(ecc)
        })?;

        match ecc {
            EccStatus::Good => {}
            EccStatus::Limit => {
                log::warn!("block {} page {}: ECC correction near limit", block, page)
            }
            EccStatus::Error => {
                log::error!("block {} page {}: uncorrectable ECC error", block, page)
            }
        }
        Ok(ecc)
    }
}
