//! Address width types

/// Address width for SPI NAND commands
///
/// Serial NAND uses two address shapes: a 2-byte column address into the
/// page cache and a 3-byte row address (physical page index) for array
/// operations. Feature register accesses carry a 1-byte register address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// No address phase
    #[default]
    None,
    /// 1-byte feature register address
    OneByte,
    /// 2-byte column address
    TwoByte,
    /// 3-byte row address
    ThreeByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::OneByte => 1,
            Self::TwoByte => 2,
            Self::ThreeByte => 3,
        }
    }

    /// Returns the largest address representable with this width
    pub const fn max_address(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::OneByte => 0xFF,
            Self::TwoByte => 0xFFFF,
            Self::ThreeByte => 0x00FF_FFFF,
        }
    }

    /// Encode an address into bytes, most significant byte first
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        let n = self.bytes() as usize;
        for (i, byte) in buf.iter_mut().take(n).enumerate() {
            *byte = (address >> (8 * (n - 1 - i))) as u8;
        }
    }
}
