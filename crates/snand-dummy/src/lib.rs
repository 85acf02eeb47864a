//! snand-dummy - In-memory SPI NAND emulator for testing
//!
//! This crate provides a transport that emulates a serial NAND chip in
//! memory: the feature registers, the page cache, the array and the busy
//! timing of array operations. It is useful for testing the driver stack
//! without hardware, and can inject the faults real parts show in the field
//! (bitflips, program and erase failures, stuck busy, bus errors).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;

use snand_core::chip::{EccVariant, Features, NandChip};
use snand_core::error::{Error, Result};
use snand_core::programmer::SpiMaster;
use snand_core::spi::{opcodes, SpiCommand};

#[cfg(feature = "std")]
mod image;
#[cfg(feature = "std")]
mod trace;

#[cfg(feature = "std")]
pub use image::ImageError;
#[cfg(feature = "std")]
pub use trace::{BusEvent, BusTrace};

/// Protection register value at power-up on parts locked at POR
const PROTECTION_POR_LOCKED: u8 = 0x38;

/// ECC outcome to report for a page read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccFault {
    /// Bitflips corrected well within the engine's strength
    Corrected,
    /// Bitflips corrected at the limit of the engine
    Limit,
    /// Bitflips beyond the engine's strength
    Uncorrectable,
}

/// Register values a read with `fault` leaves behind: (status field,
/// extended status, aux bitflip count)
fn ecc_registers(variant: EccVariant, fault: EccFault) -> (u8, u8, u8) {
    match variant {
        EccVariant::Status2Bit { shift } => {
            let field = match fault {
                EccFault::Corrected => 0b01,
                EccFault::Limit => 0b11,
                EccFault::Uncorrectable => 0b10,
            };
            (field << shift, 0, 0)
        }
        EccVariant::Status3Bit { shift } => {
            let field = match fault {
                EccFault::Corrected => 0b001,
                EccFault::Limit => 0b101,
                EccFault::Uncorrectable => 0b010,
            };
            (field << shift, 0, 0)
        }
        EccVariant::StatusExtended { shift, ext_shift } => {
            let (field, ext) = match fault {
                EccFault::Corrected => (0b01, 0b00),
                EccFault::Limit => (0b01, 0b11),
                // Extended bits are garbage on an uncorrectable read
                EccFault::Uncorrectable => (0b10, 0b11),
            };
            (field << shift, ext << ext_shift, 0)
        }
        EccVariant::AuxRegister { shift, limit } => match fault {
            EccFault::Corrected => (0b01 << shift, 0, 1),
            EccFault::Limit => (0b01 << shift, 0, limit),
            EccFault::Uncorrectable => (0b10 << shift, 0, 0),
        },
    }
}

fn ecc_field_mask(variant: EccVariant) -> u8 {
    let (shift, width) = match variant {
        EccVariant::Status3Bit { shift } => (shift, 3),
        EccVariant::Status2Bit { shift }
        | EccVariant::StatusExtended { shift, .. }
        | EccVariant::AuxRegister { shift, .. } => (shift, 2),
    };
    (((1u16 << width) - 1) as u8) << shift
}

/// Dummy SPI NAND chip
///
/// Emulates `chip` in memory. Pages that were never programmed since the
/// last erase are not stored. Time is simulated: every command takes 1us
/// and `delay_us` advances the clock without sleeping.
pub struct DummyNand {
    chip: NandChip,
    page_size: usize,
    oob_size: usize,
    total_rows: u32,

    array: BTreeMap<u32, Vec<u8>>,
    cache: Vec<u8>,
    cache_row: Option<u32>,

    protection: u8,
    config: u8,
    status: u8,
    status_ext: u8,
    aux_ecc: u8,

    busy_reads: u32,
    busy_remaining: u32,
    stuck_busy: bool,
    now_us: u64,

    ecc_faults: BTreeMap<u32, EccFault>,
    program_faults: BTreeSet<u32>,
    erase_faults: BTreeSet<u32>,
    transport_faults: BTreeMap<u8, u32>,

    commands: u64,
    #[cfg(feature = "std")]
    trace: Option<BusTrace>,
}

impl DummyNand {
    /// Create an erased chip in its power-up state
    pub fn new(chip: NandChip) -> Self {
        let page_size = chip.page_size as usize;
        let oob_size = chip.oob_size as usize;
        let total_rows = chip.dies * chip.blocks_per_die * chip.pages_per_block;

        let protection = if chip.has_feature(Features::LOCKED_AT_POR) {
            PROTECTION_POR_LOCKED
        } else {
            0
        };
        let mut config = opcodes::CFG_ECC_EN;
        if chip.has_feature(Features::BUF_MODE) {
            config |= opcodes::CFG_BUF;
        }

        Self {
            chip,
            page_size,
            oob_size,
            total_rows,
            array: BTreeMap::new(),
            cache: vec![0xFF; page_size + oob_size],
            cache_row: None,
            protection,
            config,
            status: 0,
            status_ext: 0,
            aux_ecc: 0,
            busy_reads: 1,
            busy_remaining: 0,
            stuck_busy: false,
            now_us: 0,
            ecc_faults: BTreeMap::new(),
            program_faults: BTreeSet::new(),
            erase_faults: BTreeSet::new(),
            transport_faults: BTreeMap::new(),
            commands: 0,
            #[cfg(feature = "std")]
            trace: None,
        }
    }

    /// Emulated chip
    pub fn chip(&self) -> &NandChip {
        &self.chip
    }

    /// Bytes per page including OOB
    pub fn raw_page_size(&self) -> usize {
        self.page_size + self.oob_size
    }

    /// Number of pages in the array
    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    /// Page `row`, data followed by OOB (erased pages read as 0xFF)
    pub fn page(&self, row: u32) -> Vec<u8> {
        match self.array.get(&row) {
            Some(page) => page.clone(),
            None => vec![0xFF; self.raw_page_size()],
        }
    }

    /// Mutable access to page `row`, data followed by OOB
    ///
    /// Bypasses the NAND programming rules; used to set up test images.
    pub fn page_mut(&mut self, row: u32) -> &mut [u8] {
        let size = self.raw_page_size();
        self.array.entry(row).or_insert_with(|| vec![0xFF; size])
    }

    /// Number of status reads that report busy after each array operation
    pub fn set_busy_reads(&mut self, reads: u32) {
        self.busy_reads = reads;
    }

    /// Keep the busy bit set forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Report `fault` when `row` is read with ECC enabled
    pub fn inject_ecc(&mut self, row: u32, fault: EccFault) {
        self.ecc_faults.insert(row, fault);
    }

    /// Make programs of `row` fail
    pub fn fail_program(&mut self, row: u32) {
        self.program_faults.insert(row);
    }

    /// Make erases of `block` fail
    pub fn fail_erase(&mut self, block: u32) {
        self.erase_faults.insert(block);
    }

    /// Make the next `count` commands with `opcode` fail on the bus
    pub fn fail_transport(&mut self, opcode: u8, count: u32) {
        self.transport_faults.insert(opcode, count);
    }

    /// Remove every injected fault
    pub fn clear_faults(&mut self) {
        self.ecc_faults.clear();
        self.program_faults.clear();
        self.erase_faults.clear();
        self.transport_faults.clear();
        self.stuck_busy = false;
    }

    /// Commands executed so far
    pub fn command_count(&self) -> u64 {
        self.commands
    }

    /// Current value of a feature register
    pub fn feature(&self, register: u8) -> u8 {
        match register {
            opcodes::FEATURE_PROTECTION => self.protection,
            opcodes::FEATURE_CONFIG => self.config,
            opcodes::FEATURE_STATUS => self.status,
            opcodes::FEATURE_STATUS_EXT => self.status_ext,
            _ => 0,
        }
    }

    fn start_busy(&mut self) {
        self.busy_remaining = self.busy_reads;
    }

    fn ecc_enabled(&self) -> bool {
        self.config & opcodes::CFG_ECC_EN != 0
    }

    fn pages_per_block(&self) -> u32 {
        self.chip.pages_per_block
    }

    /// Cache column with the plane bit checked and stripped
    fn cache_column(&self, column: u32) -> Result<usize> {
        if !self.chip.has_feature(Features::PLANE_SELECT) {
            return Ok(column as usize);
        }
        let plane = (column & opcodes::COLUMN_PLANE_BIT != 0) as u32;
        if let Some(row) = self.cache_row {
            let block_plane = (row / self.pages_per_block()) & 1;
            if plane != block_plane {
                log::error!("plane bit {} does not match cached row 0x{:06X}", plane, row);
                return Err(Error::InvalidArgument);
            }
        }
        Ok((column & !opcodes::COLUMN_PLANE_BIT) as usize)
    }

    fn handle_get_feature(&mut self, cmd: &mut SpiCommand<'_>) {
        let register = cmd.address.unwrap_or(0) as u8;
        let mut value = self.feature(register);
        if register == opcodes::FEATURE_STATUS {
            if self.stuck_busy {
                value |= opcodes::SR_OIP;
            } else if self.busy_remaining > 0 {
                self.busy_remaining -= 1;
                value |= opcodes::SR_OIP;
            }
        }
        cmd.read_buf.fill(value);
    }

    fn handle_set_feature(&mut self, cmd: &SpiCommand<'_>) {
        let Some(&value) = cmd.write_data.first() else {
            return;
        };
        match cmd.address.unwrap_or(0) as u8 {
            opcodes::FEATURE_PROTECTION => self.protection = value,
            opcodes::FEATURE_CONFIG => self.config = value,
            // Status is read-only
            _ => {}
        }
    }

    fn handle_page_read(&mut self, row: u32) -> Result<()> {
        if row >= self.total_rows {
            return Err(Error::OutOfRange);
        }

        self.cache = self.page(row);
        self.cache_row = Some(row);

        let variant = self.chip.ecc;
        self.status &= !ecc_field_mask(variant);
        self.status_ext = 0;
        self.aux_ecc = 0;
        if self.ecc_enabled() {
            if let Some(&fault) = self.ecc_faults.get(&row) {
                let (status, ext, aux) = ecc_registers(variant, fault);
                self.status |= status;
                self.status_ext = ext;
                self.aux_ecc = aux;
            }
        }

        self.start_busy();
        Ok(())
    }

    fn handle_read_cache(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        let column = self.cache_column(cmd.address.unwrap_or(0))?;
        for (i, byte) in cmd.read_buf.iter_mut().enumerate() {
            *byte = self.cache.get(column + i).copied().unwrap_or(0xFF);
        }
        Ok(())
    }

    fn handle_program_load(&mut self, cmd: &SpiCommand<'_>, reset: bool) -> Result<()> {
        if reset {
            self.cache.fill(0xFF);
            self.cache_row = None;
        }
        let column = self.cache_column(cmd.address.unwrap_or(0))?;
        if column + cmd.write_data.len() > self.cache.len() {
            return Err(Error::OutOfRange);
        }
        self.cache[column..column + cmd.write_data.len()].copy_from_slice(cmd.write_data);
        Ok(())
    }

    fn handle_program_execute(&mut self, row: u32) -> Result<()> {
        if row >= self.total_rows {
            return Err(Error::OutOfRange);
        }

        let allowed = self.status & opcodes::SR_WEL != 0 && self.protection == 0;
        self.status &= !(opcodes::SR_WEL | opcodes::SR_P_FAIL);

        if !allowed || self.program_faults.contains(&row) {
            self.status |= opcodes::SR_P_FAIL;
        } else {
            let cache = core::mem::take(&mut self.cache);
            // NAND programming can only clear bits
            for (cell, &byte) in self.page_mut(row).iter_mut().zip(&cache) {
                *cell &= byte;
            }
            self.cache = cache;
        }

        self.start_busy();
        Ok(())
    }

    fn handle_block_erase(&mut self, row: u32) -> Result<()> {
        if row >= self.total_rows {
            return Err(Error::OutOfRange);
        }

        let allowed = self.status & opcodes::SR_WEL != 0 && self.protection == 0;
        self.status &= !(opcodes::SR_WEL | opcodes::SR_E_FAIL);

        let ppb = self.pages_per_block();
        let block = row / ppb;
        if !allowed || self.erase_faults.contains(&block) {
            self.status |= opcodes::SR_E_FAIL;
        } else {
            let first = block * ppb;
            let rows: Vec<u32> = self.array.range(first..first + ppb).map(|(&r, _)| r).collect();
            for r in rows {
                self.array.remove(&r);
            }
        }

        self.start_busy();
        Ok(())
    }

    fn run(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.now_us += 1;
        self.commands += 1;

        #[cfg(feature = "std")]
        if let Some(trace) = &self.trace {
            trace.record(cmd.opcode, cmd.address);
        }

        if let Some(remaining) = self.transport_faults.get_mut(&cmd.opcode) {
            if *remaining > 0 {
                *remaining -= 1;
                log::debug!("injected bus failure on opcode {:02X}", cmd.opcode);
                return Err(Error::Transport);
            }
        }

        match cmd.opcode {
            opcodes::RESET => {
                self.status = 0;
                self.cache_row = None;
                self.start_busy();
                Ok(())
            }
            opcodes::READ_ID => {
                let id = [
                    self.chip.manufacturer_id,
                    (self.chip.device_id >> 8) as u8,
                    self.chip.device_id as u8,
                ];
                for (dst, src) in cmd.read_buf.iter_mut().zip(id) {
                    *dst = src;
                }
                Ok(())
            }
            opcodes::GET_FEATURE => {
                self.handle_get_feature(cmd);
                Ok(())
            }
            opcodes::SET_FEATURE => {
                self.handle_set_feature(cmd);
                Ok(())
            }
            opcodes::WREN => {
                self.status |= opcodes::SR_WEL;
                Ok(())
            }
            opcodes::PAGE_READ => self.handle_page_read(cmd.address.unwrap_or(0)),
            opcodes::READ_CACHE => self.handle_read_cache(cmd),
            opcodes::PROGRAM_LOAD => self.handle_program_load(cmd, true),
            opcodes::PROGRAM_LOAD_RANDOM => self.handle_program_load(cmd, false),
            opcodes::PROGRAM_EXECUTE => self.handle_program_execute(cmd.address.unwrap_or(0)),
            opcodes::BLOCK_ERASE => self.handle_block_erase(cmd.address.unwrap_or(0)),
            opcodes::MX_GET_ECC_STATUS => {
                cmd.read_buf.fill(self.aux_ecc);
                Ok(())
            }
            _ => Err(Error::OpcodeNotSupported),
        }
    }
}

impl SpiMaster for DummyNand {
    fn max_read_len(&self) -> usize {
        4096
    }

    fn max_write_len(&self) -> usize {
        // Small enough that a full page needs RANDOM PROGRAM LOAD continuations
        1024
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.run(cmd)
    }

    fn delay_us(&mut self, us: u32) {
        self.now_us += us as u64;
    }

    fn now_us(&self) -> u64 {
        self.now_us
    }
}
