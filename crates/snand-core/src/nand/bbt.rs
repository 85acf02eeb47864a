//! Bad-block table interface and an in-memory implementation

use alloc::vec::Vec;

/// Cached state of one physical block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    /// Never scanned in this session
    #[default]
    Unmarked,
    /// Scanned, marker intact
    Good,
    /// Factory or runtime bad block
    Bad,
}

/// Persistent bad-block table
///
/// The on-flash marker is the source of truth; the table caches it so a
/// block is scanned at most once per session.
pub trait BadBlockTable {
    /// Cached state of `block`
    fn is_badblock(&self, block: u32) -> BlockState;

    /// Record the state of `block`
    fn mark_badblock(&mut self, block: u32, bad: bool);
}

const STATE_BITS: u32 = 2;
const STATES_PER_BYTE: u32 = 8 / STATE_BITS;

const RAW_UNMARKED: u8 = 0b00;
const RAW_GOOD: u8 = 0b01;
const RAW_BAD: u8 = 0b10;

/// Bad-block table kept in RAM, two bits per block
///
/// The table grows on demand; blocks past its end are unmarked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBbt {
    bits: Vec<u8>,
}

impl MemoryBbt {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a table saved with [`as_bytes`](Self::as_bytes)
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bits: bytes.to_vec(),
        }
    }

    /// Packed table contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Blocks recorded as bad, in increasing order
    pub fn bad_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        let blocks = self.bits.len() as u32 * STATES_PER_BYTE;
        (0..blocks).filter(move |&block| self.is_badblock(block) == BlockState::Bad)
    }

    fn position(block: u32) -> (usize, u32) {
        let byte = (block / STATES_PER_BYTE) as usize;
        let shift = (block % STATES_PER_BYTE) * STATE_BITS;
        (byte, shift)
    }
}

impl BadBlockTable for MemoryBbt {
    fn is_badblock(&self, block: u32) -> BlockState {
        let (byte, shift) = Self::position(block);
        let raw = self.bits.get(byte).map_or(RAW_UNMARKED, |&b| (b >> shift) & 0b11);
        match raw {
            RAW_GOOD => BlockState::Good,
            RAW_BAD => BlockState::Bad,
            _ => BlockState::Unmarked,
        }
    }

    fn mark_badblock(&mut self, block: u32, bad: bool) {
        let (byte, shift) = Self::position(block);
        if byte >= self.bits.len() {
            self.bits.resize(byte + 1, 0);
        }
        let raw = if bad { RAW_BAD } else { RAW_GOOD };
        self.bits[byte] = (self.bits[byte] & !(0b11 << shift)) | (raw << shift);
    }
}
