//! Status register accessors
//!
//! The status register is kept as a plain byte; every field is read through
//! an explicit mask and shift.

use crate::spi::opcodes;

/// Value of the status feature register (0xC0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusReg(pub u8);

impl StatusReg {
    /// Raw register value
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Operation in progress
    pub const fn is_busy(self) -> bool {
        self.0 & opcodes::SR_OIP != 0
    }

    /// Write enable latch set
    pub const fn write_enabled(self) -> bool {
        self.0 & opcodes::SR_WEL != 0
    }

    /// Last erase failed
    pub const fn erase_failed(self) -> bool {
        self.0 & opcodes::SR_E_FAIL != 0
    }

    /// Last program failed
    pub const fn program_failed(self) -> bool {
        self.0 & opcodes::SR_P_FAIL != 0
    }

    /// Extract a `width`-bit field starting at bit `shift`
    pub const fn field(self, shift: u8, width: u8) -> u8 {
        field(self.0, shift, width)
    }
}

/// Extract a `width`-bit field starting at bit `shift` from a register byte
pub const fn field(value: u8, shift: u8, width: u8) -> u8 {
    let mask = ((1u16 << width) - 1) as u8;
    (value >> shift) & mask
}
