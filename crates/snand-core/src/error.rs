//! Error types for snand-core
//!
//! This module provides a no_std compatible error type that is shared by the
//! physical layer, the bad-block manager and the NFTL frontend.
//!
//! ECC results are not errors: a read that needed correction
//! (or failed correction) still returns `Ok` with an
//! [`EccStatus`](crate::nand::EccStatus). Only operations that cannot make
//! sense of an uncorrectable page, such as block copies, turn it into
//! [`Error::EccUncorrectable`].

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Argument errors, raised before any bus transaction
    /// Die, block, page or byte address lies outside the chip geometry
    OutOfRange,
    /// Request is malformed (no buffers, bad sector bitmap, bad offset)
    InvalidArgument,
    /// Provided buffer is too small for the operation
    BufferTooSmall,

    // Device errors
    /// Busy flag did not clear before the poll deadline
    Timeout,
    /// Program-fail bit was set after a page program
    ProgramFailure {
        /// Physical page index (row) that failed to program
        row: u32,
    },
    /// Erase-fail bit was set after a block erase
    EraseFailure {
        /// First row of the block that failed to erase
        row: u32,
    },
    /// Page data could not be corrected by the on-die ECC engine
    EccUncorrectable {
        /// Physical page index (row) that was read
        row: u32,
    },

    // Transport errors
    /// The underlying SPI transfer failed
    Transport,
    /// Opcode is not supported by the transport
    OpcodeNotSupported,

    // Chip identification errors
    /// No known chip answered the ID command
    ChipNotFound,
    /// ID read from the bus does not match the configured chip
    IdMismatch,
    /// Chip geometry is not made of power-of-two sizes
    InvalidGeometry,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "address out of range"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Timeout => write!(f, "device busy timeout"),
            Self::ProgramFailure { row } => write!(f, "program failed at row 0x{:06X}", row),
            Self::EraseFailure { row } => write!(f, "erase failed at row 0x{:06X}", row),
            Self::EccUncorrectable { row } => {
                write!(f, "uncorrectable ECC error at row 0x{:06X}", row)
            }
            Self::Transport => write!(f, "SPI transfer failed"),
            Self::OpcodeNotSupported => write!(f, "SPI opcode not supported by transport"),
            Self::ChipNotFound => write!(f, "NAND chip not found"),
            Self::IdMismatch => write!(f, "NAND ID mismatch"),
            Self::InvalidGeometry => write!(f, "chip geometry is not a power of two"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
