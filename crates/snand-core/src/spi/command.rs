//! SPI command structure

use super::{opcodes, AddressWidth};

/// A single SPI NAND transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any): feature register, column or row
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// Number of dummy cycles after address
    pub dummy_cycles: u8,

    /// Data to write after opcode/address/dummy
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, RESET)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a READ ID command (one dummy byte before the ID bytes)
    pub fn read_id(buf: &'a mut [u8]) -> Self {
        Self {
            opcode: opcodes::READ_ID,
            address: None,
            address_width: AddressWidth::None,
            dummy_cycles: 8,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a GET FEATURE command for the given feature register
    pub fn get_feature(register: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode: opcodes::GET_FEATURE,
            address: Some(register as u32),
            address_width: AddressWidth::OneByte,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a SET FEATURE command for the given feature register
    pub fn set_feature(register: u8, data: &'a [u8]) -> Self {
        Self {
            opcode: opcodes::SET_FEATURE,
            address: Some(register as u32),
            address_width: AddressWidth::OneByte,
            dummy_cycles: 0,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an array command addressed by row (PAGE READ, PROGRAM EXECUTE,
    /// BLOCK ERASE)
    pub fn row(opcode: u8, row: u32) -> Self {
        Self {
            opcode,
            address: Some(row),
            address_width: AddressWidth::ThreeByte,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a READ FROM CACHE command at the given column
    pub fn read_cache(column: u32, buf: &'a mut [u8]) -> Self {
        Self {
            opcode: opcodes::READ_CACHE,
            address: Some(column),
            address_width: AddressWidth::TwoByte,
            dummy_cycles: 8,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a PROGRAM LOAD (or RANDOM PROGRAM LOAD) command at the given column
    pub fn program_load(opcode: u8, column: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(column),
            address_width: AddressWidth::TwoByte,
            dummy_cycles: 0,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Returns true if this command has a read phase
    pub fn has_read(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Returns true if this command has a write phase
    pub fn has_write(&self) -> bool {
        !self.write_data.is_empty()
    }

    /// Returns true if this command has an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Number of bytes sent before the write payload: opcode, address and
    /// dummy bytes
    pub fn header_len(&self) -> usize {
        1 + self.address_width.bytes() as usize + (self.dummy_cycles as usize) / 8
    }

    /// Encode opcode, address and dummy bytes into `buf`
    ///
    /// `buf` must be at least [`header_len`](Self::header_len) bytes long.
    /// Dummy bytes are sent as zero.
    pub fn encode_header(&self, buf: &mut [u8]) {
        buf[0] = self.opcode;
        let addr_len = self.address_width.bytes() as usize;
        if let Some(addr) = self.address {
            self.address_width.encode(addr, &mut buf[1..1 + addr_len]);
        }
        for byte in &mut buf[1 + addr_len..self.header_len()] {
            *byte = 0;
        }
    }

    /// Calculate the total number of bytes to transfer (for timing/buffer allocation)
    pub fn total_bytes(&self) -> usize {
        self.header_len() + self.write_data.len() + self.read_buf.len()
    }
}
