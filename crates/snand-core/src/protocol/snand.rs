//! Serial NAND protocol implementation
//!
//! This module implements the command sequences shared by ONFI-style SPI
//! NAND chips: feature register access, array operations addressed by row,
//! cache transfers addressed by column, and the bounded busy poll.
//!
//! Every function takes an [`ExecContext`]. In the panic context commands go
//! through [`SpiMaster::execute_atomic`] and the poll loop never sleeps.

use crate::error::{Error, Result};
use crate::programmer::{execute_in, ExecContext, SpiMaster};
use crate::spi::{opcodes, SpiCommand};

use super::StatusReg;

/// Delay between status polls in the normal context
///
/// Page reads take 25-100us, programs 200-700us and erases 2-10ms on
/// current parts, so a 10us poll keeps the added latency small.
pub const STATUS_POLL_DELAY_US: u32 = 10;

/// Default busy timeout (1s)
pub const DEFAULT_POLL_TIMEOUT_US: u32 = 1_000_000;

/// Read the manufacturer and device ID
///
/// Returns (manufacturer_id, device_id) on success.
pub fn read_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<(u8, u16)> {
    let mut buf = [0u8; 3];
    let mut cmd = SpiCommand::read_id(&mut buf);
    master.execute(&mut cmd)?;

    let manufacturer = buf[0];
    let device = ((buf[1] as u16) << 8) | (buf[2] as u16);
    log::trace!("READ ID: {:02X} {:04X}", manufacturer, device);

    Ok((manufacturer, device))
}

/// Reset the device and wait for it to become ready
pub fn reset<M: SpiMaster + ?Sized>(master: &mut M, timeout_us: u32) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::RESET);
    master.execute(&mut cmd)?;
    wait_ready(master, ExecContext::Normal, timeout_us)?;
    Ok(())
}

/// Read a feature register
pub fn get_feature<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    register: u8,
) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::get_feature(register, &mut buf);
    execute_in(master, ctx, &mut cmd)?;
    Ok(buf[0])
}

/// Write a feature register
pub fn set_feature<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    register: u8,
    value: u8,
) -> Result<()> {
    let data = [value];
    let mut cmd = SpiCommand::set_feature(register, &data);
    execute_in(master, ctx, &mut cmd)
}

/// Read-modify-write the bits selected by `mask` in a feature register
pub fn update_feature<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    register: u8,
    mask: u8,
    value: u8,
) -> Result<()> {
    let current = get_feature(master, ctx, register)?;
    let updated = (current & !mask) | (value & mask);
    if updated != current {
        set_feature(master, ctx, register, updated)?;
    }
    Ok(())
}

/// Read the status register
pub fn read_status<M: SpiMaster + ?Sized>(master: &mut M, ctx: ExecContext) -> Result<StatusReg> {
    get_feature(master, ctx, opcodes::FEATURE_STATUS).map(StatusReg)
}

/// Send the Write Enable command
pub fn write_enable<M: SpiMaster + ?Sized>(master: &mut M, ctx: ExecContext) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WREN);
    execute_in(master, ctx, &mut cmd)
}

/// Issue a row-addressed array command (PAGE READ, PROGRAM EXECUTE, BLOCK ERASE)
pub fn row_command<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    opcode: u8,
    row: u32,
) -> Result<()> {
    log::trace!("cmd {:02X} row 0x{:06X}", opcode, row);
    let mut cmd = SpiCommand::row(opcode, row);
    execute_in(master, ctx, &mut cmd)
}

/// Wait for the busy bit to clear
///
/// Polls the status register until OIP clears or `timeout_us` elapses on
/// the transport clock. After the deadline passes, the status register is
/// read exactly once more so a completion racing the deadline check is not
/// reported as a timeout. Nothing is retried: a timeout is returned as
/// [`Error::Timeout`].
///
/// In the panic context the loop spins without calling `delay_us`.
pub fn wait_ready<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    timeout_us: u32,
) -> Result<StatusReg> {
    let deadline = master.now_us().saturating_add(timeout_us as u64);

    loop {
        let status = read_status(master, ctx)?;
        if !status.is_busy() {
            return Ok(status);
        }
        if master.now_us() >= deadline {
            break;
        }
        if !ctx.is_atomic() {
            master.delay_us(STATUS_POLL_DELAY_US);
        }
    }

    let status = read_status(master, ctx)?;
    if !status.is_busy() {
        return Ok(status);
    }

    log::error!(
        "device still busy after {}us (status 0x{:02X})",
        timeout_us,
        status.bits()
    );
    Err(Error::Timeout)
}

/// Read `buf.len()` bytes from the device cache starting at `column`
pub fn read_cache<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    column: u32,
    buf: &mut [u8],
) -> Result<()> {
    let max_len = master.max_read_len();
    let mut offset = 0;

    while offset < buf.len() {
        let chunk_len = core::cmp::min(max_len, buf.len() - offset);
        let chunk = &mut buf[offset..offset + chunk_len];
        let mut cmd = SpiCommand::read_cache(column + offset as u32, chunk);
        execute_in(master, ctx, &mut cmd)?;
        offset += chunk_len;
    }

    Ok(())
}

/// Load `data` into the device cache at `column`
///
/// With `reset_cache` the first chunk uses PROGRAM LOAD, which fills the
/// rest of the cache with 0xFF. All other chunks use RANDOM PROGRAM LOAD so
/// earlier data is kept.
pub fn load_cache<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    column: u32,
    data: &[u8],
    reset_cache: bool,
) -> Result<()> {
    let max_len = master.max_write_len();
    let mut offset = 0;
    let mut opcode = if reset_cache {
        opcodes::PROGRAM_LOAD
    } else {
        opcodes::PROGRAM_LOAD_RANDOM
    };

    while offset < data.len() {
        let chunk_len = core::cmp::min(max_len, data.len() - offset);
        let chunk = &data[offset..offset + chunk_len];
        let mut cmd = SpiCommand::program_load(opcode, column + offset as u32, chunk);
        execute_in(master, ctx, &mut cmd)?;
        offset += chunk_len;
        opcode = opcodes::PROGRAM_LOAD_RANDOM;
    }

    Ok(())
}

/// Read the Macronix bitflip count of the last page read
pub fn read_mx_ecc_status<M: SpiMaster + ?Sized>(master: &mut M, ctx: ExecContext) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand {
        opcode: opcodes::MX_GET_ECC_STATUS,
        address: None,
        address_width: crate::spi::AddressWidth::None,
        dummy_cycles: 8,
        write_data: &[],
        read_buf: &mut buf,
    };
    execute_in(master, ctx, &mut cmd)?;
    Ok(buf[0])
}

/// Enable or disable the on-die ECC engine
pub fn set_ecc_enabled<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    enabled: bool,
) -> Result<()> {
    let value = if enabled { opcodes::CFG_ECC_EN } else { 0 };
    update_feature(
        master,
        ctx,
        opcodes::FEATURE_CONFIG,
        opcodes::CFG_ECC_EN,
        value,
    )
}

/// Clear all block protection bits
pub fn unlock_all<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    set_feature(master, ExecContext::Normal, opcodes::FEATURE_PROTECTION, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedMaster;

    #[test]
    fn test_wait_ready_returns_final_status() {
        let mut master = ScriptedMaster::new();
        master.push_status(&[0x01, 0x01, 0x08]);

        let status = wait_ready(&mut master, ExecContext::Normal, 1000).unwrap();
        assert!(status.program_failed());
        assert_eq!(master.status_reads(), 3);
        assert_eq!(master.delays(), 2);
    }

    #[test]
    fn test_wait_ready_timeout_does_one_extra_read() {
        let mut master = ScriptedMaster::new();
        master.set_tick_us(100);
        master.set_stuck_busy(true);

        assert_eq!(
            wait_ready(&mut master, ExecContext::Normal, 1000),
            Err(Error::Timeout)
        );
        let reads_in_loop = master.status_reads() - 1;
        // Every loop read but the last is followed by a sleep
        assert_eq!(master.delays(), reads_in_loop - 1);
    }

    #[test]
    fn test_wait_ready_catches_completion_at_deadline() {
        let mut master = ScriptedMaster::new();
        master.set_tick_us(600);
        // Two busy reads take us past the 1000us deadline; the extra read
        // sees the device ready.
        master.push_status(&[0x01, 0x01, 0x00]);

        let status = wait_ready(&mut master, ExecContext::Normal, 1000).unwrap();
        assert!(!status.is_busy());
        assert_eq!(master.status_reads(), 3);
    }

    #[test]
    fn test_wait_ready_atomic_never_sleeps() {
        let mut master = ScriptedMaster::new();
        master.push_status(&[0x01, 0x01, 0x01, 0x00]);

        wait_ready(&mut master, ExecContext::Panic, 1000).unwrap();
        assert_eq!(master.delays(), 0);
        assert_eq!(master.atomic_commands(), 4);
    }

    #[test]
    fn test_load_cache_chunks_use_random_load() {
        let mut master = ScriptedMaster::new();
        master.set_max_len(16);
        let data = [0xA5u8; 40];

        load_cache(&mut master, ExecContext::Normal, 0, &data, true).unwrap();
        assert_eq!(
            master.opcodes(),
            &[
                opcodes::PROGRAM_LOAD,
                opcodes::PROGRAM_LOAD_RANDOM,
                opcodes::PROGRAM_LOAD_RANDOM
            ]
        );
    }
}
