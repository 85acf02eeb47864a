//! Transport trait definitions

use alloc::boxed::Box;

use crate::error::Result;
use crate::spi::SpiCommand;

/// Execution context of an operation
///
/// Normal operations may sleep between status polls and wait for the device
/// guard. Panic operations run when nothing else is left alive (crash dumps):
/// they spin without sleeping and use the non-blocking transport path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecContext {
    /// Regular, sleeping context
    #[default]
    Normal,
    /// Atomic context: no sleeping, non-blocking transfers
    Panic,
}

impl ExecContext {
    /// Returns true for the atomic (panic) context
    pub fn is_atomic(self) -> bool {
        self == Self::Panic
    }
}

/// SPI master trait
///
/// This trait represents a transport that can execute serial NAND commands:
/// write the opcode, address, dummy and payload bytes, then optionally read
/// back `read_buf.len()` bytes. There is no framing beyond that.
///
/// ## Example
///
/// ```ignore
/// impl SpiMaster for Spidev {
///     fn max_read_len(&self) -> usize { 4096 }
///     fn max_write_len(&self) -> usize { 4096 }
///
///     fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
///         let mut header = [0u8; 8];
///         cmd.encode_header(&mut header);
///         self.transfer(&header[..cmd.header_len()], cmd.write_data, cmd.read_buf)
///             .map_err(|_| Error::Transport)
///     }
///
///     fn delay_us(&mut self, us: u32) { std::thread::sleep(Duration::from_micros(us as u64)) }
///     fn now_us(&self) -> u64 { self.epoch.elapsed().as_micros() as u64 }
/// }
/// ```
pub trait SpiMaster {
    /// Get the maximum number of bytes that can be read in a single transaction
    fn max_read_len(&self) -> usize;

    /// Get the maximum number of bytes that can be written in a single transaction
    fn max_write_len(&self) -> usize;

    /// Execute a single SPI command, possibly blocking
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()>;

    /// Execute a single SPI command without blocking or sleeping
    ///
    /// Used from the panic context. Transports whose `execute` never sleeps
    /// can keep the default.
    fn execute_atomic(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.execute(cmd)
    }

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Monotonic time in microseconds, used for poll deadlines
    fn now_us(&self) -> u64;
}

/// Dispatch `cmd` through the transport path matching `ctx`
pub fn execute_in<M: SpiMaster + ?Sized>(
    master: &mut M,
    ctx: ExecContext,
    cmd: &mut SpiCommand<'_>,
) -> Result<()> {
    match ctx {
        ExecContext::Normal => master.execute(cmd),
        ExecContext::Panic => master.execute_atomic(cmd),
    }
}

// Blanket impl for boxed SPI masters to allow trait objects
impl SpiMaster for Box<dyn SpiMaster + Send> {
    fn max_read_len(&self) -> usize {
        (**self).max_read_len()
    }

    fn max_write_len(&self) -> usize {
        (**self).max_write_len()
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }

    fn execute_atomic(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        (**self).execute_atomic(cmd)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}
