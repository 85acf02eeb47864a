//! NAND flash translation layer API
//!
//! [`Nftl`] is the entry point used by the storage stack above this crate.
//! It addresses pages by (die, block, page, sector bitmap), validates every
//! request before the bus is touched, serializes all hardware access behind
//! one per-device guard, and reports ECC results as [`PageStatus`] values.
//!
//! Super-page emulation is enabled once at attach time from
//! [`NftlConfig::unit`]. With emulation on, the blocks of the reserved
//! partition are addressed in super units and every other block in
//! physical units; without a reserved partition the whole chip is reserved.
//! A block index therefore names a super block below the end of the
//! reserved partition and a physical block past it.

mod config;

pub use config::NftlConfig;
#[cfg(feature = "std")]
pub use config::ConfigError;

use spin::Mutex;

use crate::chip::{ChipDatabase, ChipGeometry, NandChip, SizeUnit};
use crate::error::{Error, Result};
use crate::nand::{
    addr_to_req, req_to_paddr, AddrReq, BadBlockTable, BlockOps, CacheBridge, EccStatus,
    PartitionLayout, PhysicalOps, ReadRequest, SuperPageOps, UnitKind, WriteRequest,
};
use crate::programmer::{ExecContext, SpiMaster};
use crate::protocol::snand;

/// Result of a successful page operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Data is good
    Ok,
    /// Data is good but needed heavy correction; relocate soon
    EccLimit,
    /// Data is corrupt
    EccError,
}

impl From<EccStatus> for PageStatus {
    fn from(ecc: EccStatus) -> Self {
        match ecc {
            EccStatus::Good => PageStatus::Ok,
            EccStatus::Limit => PageStatus::EccLimit,
            EccStatus::Error => PageStatus::EccError,
        }
    }
}

/// Flat address resolved by [`Nftl::locate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Unit, block, page and offset covering the address
    pub req: AddrReq,
    /// Physical page index, for addresses in physical units
    pub row: Option<u32>,
}

/// Which unit serves each chip-wide block index
#[derive(Debug, Clone, Copy)]
struct Routing {
    /// Super blocks `[0, super_end)` belong to the reserved partition
    super_end: u32,
    /// Physical blocks `[physical_start, total)` lie outside it
    physical_start: u32,
}

impl Routing {
    fn new(unit: UnitKind, physical: &ChipGeometry, partitions: &PartitionLayout) -> Result<Self> {
        let total = physical.total_blocks();
        let end = match (unit, partitions.reserved) {
            (UnitKind::Physical, None) => 0,
            (UnitKind::Super, None) => total,
            (UnitKind::Physical, Some(r)) => {
                log::error!("reserved partition {:#x}..{:#x} needs super units", r.start, r.end);
                return Err(Error::InvalidArgument);
            }
            (UnitKind::Super, Some(r)) if r.start != 0 => {
                log::error!("reserved partition must start at 0, not {:#x}", r.start);
                return Err(Error::InvalidArgument);
            }
            (UnitKind::Super, Some(r)) => (r.end / physical.block_size()) as u32,
        };

        Ok(Self {
            super_end: end / 2,
            physical_start: end,
        })
    }
}

/// Serialized translation-layer frontend of one device
pub struct Nftl<M, C, T> {
    device: Mutex<PhysicalOps<M, C, T>>,
    chip: NandChip,
    unit: UnitKind,
    geometry: ChipGeometry,
    physical: ChipGeometry,
    partitions: PartitionLayout,
    routing: Routing,
}

impl<M: SpiMaster, C: CacheBridge, T: BadBlockTable> Nftl<M, C, T> {
    /// Attach to a device known to be `chip`
    pub fn attach(master: M, chip: NandChip, cache: C, bbt: T, config: NftlConfig) -> Result<Self> {
        config.validate()?;

        let ops = PhysicalOps::attach(
            master,
            chip,
            cache,
            bbt,
            config.sector_size,
            config.poll_timeout_us(),
        )?;
        let physical = *ops.geometry();
        config.partitions.validate(&physical)?;

        let geometry = match config.unit {
            UnitKind::Physical => physical,
            UnitKind::Super => physical.doubled()?,
        };
        let routing = Routing::new(config.unit, &physical, &config.partitions)?;
        let partitions = match (config.unit, config.partitions.reserved) {
            (UnitKind::Super, None) => {
                PartitionLayout::with_reserved(0, physical.chip_size_in(SizeUnit::Byte))
            }
            _ => config.partitions,
        };
        let chip = ops.chip().clone();

        log::info!(
            "{} {}: {} MiB, {:?} units of {} + {} bytes",
            chip.vendor,
            chip.name,
            physical.chip_size_in(SizeUnit::Byte) / (1024 * 1024),
            config.unit,
            geometry.page_size(),
            geometry.oob_size()
        );

        Ok(Self {
            device: Mutex::new(ops),
            chip,
            unit: config.unit,
            geometry,
            physical,
            partitions,
            routing,
        })
    }

    /// Identify the device through `db`, then attach to it
    pub fn probe(
        mut master: M,
        db: &ChipDatabase,
        cache: C,
        bbt: T,
        config: NftlConfig,
    ) -> Result<Self> {
        snand::reset(&mut master, config.poll_timeout_us())?;
        let (manufacturer, device) = snand::read_id(&mut master)?;
        let chip = match db.find_by_id(manufacturer, device) {
            Some(chip) => chip.clone(),
            None => {
                log::error!("no chip with ID {:02X} {:04X}", manufacturer, device);
                return Err(Error::ChipNotFound);
            }
        };
        Self::attach(master, chip, cache, bbt, config)
    }

    /// Chip description
    pub fn chip(&self) -> &NandChip {
        &self.chip
    }

    /// Addressing unit chosen at attach time
    pub fn unit(&self) -> UnitKind {
        self.unit
    }

    /// Unit serving (die, block), or [`Error::OutOfRange`] if no block
    /// has that index
    pub fn block_unit(&self, die: u32, block: u32) -> Result<UnitKind> {
        self.route(die, block, 0).map(|target| target.unit)
    }

    /// Geometry of the unit serving (die, block)
    pub fn block_geometry(&self, die: u32, block: u32) -> Result<ChipGeometry> {
        self.route(die, block, 0).map(|target| target.geometry)
    }

    /// Partition layout in effect
    pub fn partitions(&self) -> &PartitionLayout {
        &self.partitions
    }

    /// Geometry of the addressing unit
    ///
    /// With emulation on this is the super geometry of the reserved
    /// partition; blocks past it use [`Nftl::physical_geometry`].
    pub fn geometry(&self) -> &ChipGeometry {
        &self.geometry
    }

    /// Physical geometry of the chip
    pub fn physical_geometry(&self) -> &ChipGeometry {
        &self.physical
    }

    /// Page size in `unit`
    pub fn page_size(&self, unit: SizeUnit) -> u64 {
        self.geometry.page_size_in(unit)
    }

    /// Block size in `unit`
    pub fn block_size(&self, unit: SizeUnit) -> u64 {
        self.geometry.block_size_in(unit)
    }

    /// Die size in `unit`
    pub fn die_size(&self, unit: SizeUnit) -> u64 {
        self.geometry.die_size_in(unit)
    }

    /// Chip size in `unit`
    pub fn chip_size(&self, unit: SizeUnit) -> u64 {
        self.geometry.chip_size_in(unit)
    }

    /// Read the sectors of `sectors` from (die, block, page)
    ///
    /// `data` receives `popcount(sectors) * sector_size` bytes starting at
    /// the first selected sector; `oob` is filled from the start of the
    /// spare area (for a super page whose selection starts in the second
    /// half, the spare area of the odd block). Either buffer may be empty,
    /// not both.
    pub fn read_page(
        &self,
        die: u32,
        block: u32,
        page: u32,
        sectors: u32,
        data: &mut [u8],
        oob: &mut [u8],
    ) -> Result<PageStatus> {
        let target = self.route(die, block, page)?;
        let (offset, len) = sector_span(&target.geometry, sectors)?;
        let data = data.get_mut(..len).ok_or(Error::BufferTooSmall)?;
        if data.is_empty() && oob.is_empty() {
            return Err(Error::InvalidArgument);
        }

        let mut req = ReadRequest::new(target.block, page, offset, data, oob);
        let ecc = self.with_ops(target, |ops| ops.read_page(&mut req))?;
        Ok(ecc.into())
    }

    /// Program the sectors of `sectors` of (die, block, page)
    pub fn write_page(
        &self,
        die: u32,
        block: u32,
        page: u32,
        sectors: u32,
        data: &[u8],
        oob: &[u8],
    ) -> Result<PageStatus> {
        let (target, req) = self.write_request(die, block, page, sectors, data, oob)?;
        self.with_ops(target, |ops| ops.write_page(&req))?;
        Ok(PageStatus::Ok)
    }

    /// Erase (die, block)
    pub fn erase_block(&self, die: u32, block: u32) -> Result<()> {
        let target = self.route(die, block, 0)?;
        self.with_ops(target, |ops| ops.erase_block(target.block, ExecContext::Normal))
    }

    /// Whether (die, block) is bad
    pub fn is_bad_block(&self, die: u32, block: u32) -> Result<bool> {
        let target = self.route(die, block, 0)?;
        self.with_ops(target, |ops| ops.is_bad(target.block))
    }

    /// Retire (die, block)
    pub fn mark_bad_block(&self, die: u32, block: u32) -> Result<()> {
        let target = self.route(die, block, 0)?;
        self.with_ops(target, |ops| ops.mark_bad(target.block))
    }

    /// Copy block `from` of `die` into block `to` of the same die
    ///
    /// Both blocks must use the same unit.
    pub fn copy_block(&self, die: u32, from: u32, to: u32) -> Result<()> {
        let src = self.route(die, from, 0)?;
        let dst = self.route(die, to, 0)?;
        if src.unit != dst.unit {
            return Err(Error::InvalidArgument);
        }
        self.with_ops(src, |ops| ops.copy_block(src.block, dst.block))
    }

    /// Program a page from the panic context
    ///
    /// Takes `&mut self`, so no other user of this device can exist; the
    /// guard is bypassed and the transport is driven without sleeping.
    pub fn panic_write_page(
        &mut self,
        die: u32,
        block: u32,
        page: u32,
        sectors: u32,
        data: &[u8],
        oob: &[u8],
    ) -> Result<PageStatus> {
        let (target, req) = self.write_request(die, block, page, sectors, data, oob)?;
        let req = req.in_context(ExecContext::Panic);
        dispatch(self.device.get_mut(), target, |ops| ops.write_page(&req))?;
        Ok(PageStatus::Ok)
    }

    /// Erase a block from the panic context
    pub fn panic_erase_block(&mut self, die: u32, block: u32) -> Result<()> {
        let target = self.route(die, block, 0)?;
        dispatch(self.device.get_mut(), target, |ops| {
            ops.erase_block(target.block, ExecContext::Panic)
        })
    }

    /// Resolve a flat byte address over the partition layout
    ///
    /// The block and page of the result are valid arguments for the page
    /// and block operations of this frontend.
    pub fn locate(&self, addr: u64) -> Result<Location> {
        let req = addr_to_req(&self.physical, &self.partitions, addr)?;
        let row = match req.unit {
            UnitKind::Physical => Some(req_to_paddr(&self.physical, req.block, req.page)?),
            UnitKind::Super => None,
        };
        Ok(Location { req, row })
    }

    /// Run `f` on the physical layer while holding the device guard
    pub fn with_device<R>(&self, f: impl FnOnce(&mut PhysicalOps<M, C, T>) -> R) -> R {
        f(&mut *self.device.lock())
    }

    /// Detach, giving back the physical layer
    pub fn into_inner(self) -> PhysicalOps<M, C, T> {
        self.device.into_inner()
    }

    fn with_ops<R>(&self, target: Target, f: impl FnOnce(&mut dyn BlockOps) -> Result<R>) -> Result<R> {
        // The guard is dropped when this statement ends, on every path
        dispatch(&mut *self.device.lock(), target, f)
    }

    /// Unit, geometry and chip-wide block index of (die, block), after
    /// bounds checking
    fn route(&self, die: u32, block: u32, page: u32) -> Result<Target> {
        if die >= self.physical.dies() {
            return Err(Error::OutOfRange);
        }

        if self.unit == UnitKind::Super && block < self.geometry.blocks_per_die() {
            let chip_block = self.geometry.chip_block(die, block);
            if chip_block < self.routing.super_end {
                return Target::checked(UnitKind::Super, self.geometry, chip_block, page);
            }
        }

        if block < self.physical.blocks_per_die() {
            let chip_block = self.physical.chip_block(die, block);
            if chip_block >= self.routing.physical_start {
                return Target::checked(UnitKind::Physical, self.physical, chip_block, page);
            }
        }

        Err(Error::OutOfRange)
    }

    fn write_request<'a>(
        &self,
        die: u32,
        block: u32,
        page: u32,
        sectors: u32,
        data: &'a [u8],
        oob: &'a [u8],
    ) -> Result<(Target, WriteRequest<'a>)> {
        let target = self.route(die, block, page)?;
        let (offset, len) = sector_span(&target.geometry, sectors)?;
        let data = data.get(..len).ok_or(Error::BufferTooSmall)?;
        if data.is_empty() && oob.is_empty() {
            return Err(Error::InvalidArgument);
        }
        Ok((target, WriteRequest::new(target.block, page, offset, data, oob)))
    }
}

/// Block resolved by `Nftl::route`
#[derive(Debug, Clone, Copy)]
struct Target {
    unit: UnitKind,
    geometry: ChipGeometry,
    block: u32,
}

impl Target {
    fn checked(unit: UnitKind, geometry: ChipGeometry, block: u32, page: u32) -> Result<Self> {
        if page >= geometry.pages_per_block() {
            return Err(Error::OutOfRange);
        }
        Ok(Self { unit, geometry, block })
    }
}

/// Run `f` on the strategy serving `target`
fn dispatch<M, C, T, R>(
    device: &mut PhysicalOps<M, C, T>,
    target: Target,
    f: impl FnOnce(&mut dyn BlockOps) -> Result<R>,
) -> Result<R>
where
    M: SpiMaster,
    C: CacheBridge,
    T: BadBlockTable,
{
    match target.unit {
        UnitKind::Physical => f(device),
        UnitKind::Super => f(&mut SuperPageOps::new(device, target.geometry)),
    }
}

/// Byte offset and length covered by a sector bitmap
///
/// Bit `n` selects sector `n` of the page. The selected sectors must be
/// contiguous and exist in the page; an empty bitmap selects nothing.
fn sector_span(geometry: &ChipGeometry, sectors: u32) -> Result<(u32, usize)> {
    if sectors == 0 {
        return Ok((0, 0));
    }

    let per_page = geometry.sectors_per_page();
    if per_page < u32::BITS && sectors >> per_page != 0 {
        return Err(Error::InvalidArgument);
    }

    let first = sectors.trailing_zeros();
    let count = sectors.count_ones();
    let run = ((1u64 << count) - 1) as u32;
    if sectors >> first != run {
        return Err(Error::InvalidArgument);
    }

    let sector_size = geometry.sector_size();
    Ok((first * sector_size, (count * sector_size) as usize))
}
