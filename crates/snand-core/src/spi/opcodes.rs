//! Standard serial NAND opcodes and feature registers
//!
//! These are the commands shared by ONFI-style SPI NAND parts (Winbond W25N,
//! GigaDevice GD5F, Micron MT29F, Macronix MX35, Toshiba/Kioxia TC58).

// ============================================================================
// Device control
// ============================================================================

/// Device reset
pub const RESET: u8 = 0xFF;
/// Read manufacturer and device ID (one dummy byte first)
pub const READ_ID: u8 = 0x9F;
/// Write Enable - required before program and erase
pub const WREN: u8 = 0x06;

// ============================================================================
// Feature registers
// ============================================================================

/// Get Feature (read a feature register)
pub const GET_FEATURE: u8 = 0x0F;
/// Set Feature (write a feature register)
pub const SET_FEATURE: u8 = 0x1F;

/// Block protection register
pub const FEATURE_PROTECTION: u8 = 0xA0;
/// Configuration register (ECC enable, buffer mode)
pub const FEATURE_CONFIG: u8 = 0xB0;
/// Status register (busy, WEL, fail bits, ECC status)
pub const FEATURE_STATUS: u8 = 0xC0;
/// Extended status register used by some GigaDevice parts for ECCSE bits
pub const FEATURE_STATUS_EXT: u8 = 0xF0;

// ============================================================================
// Array operations (row addressed)
// ============================================================================

/// Page Read: load a page from the array into the device cache
pub const PAGE_READ: u8 = 0x13;
/// Program Execute: program the device cache into the array
pub const PROGRAM_EXECUTE: u8 = 0x10;
/// Block Erase (128 KiB typical)
pub const BLOCK_ERASE: u8 = 0xD8;

// ============================================================================
// Cache operations (column addressed)
// ============================================================================

/// Read From Cache (one dummy byte after the column address)
pub const READ_CACHE: u8 = 0x03;
/// Program Load: reset the cache to 0xFF and load data at the column
pub const PROGRAM_LOAD: u8 = 0x02;
/// Random Program Load: load data at the column without resetting the cache
pub const PROGRAM_LOAD_RANDOM: u8 = 0x84;

// ============================================================================
// Vendor specific
// ============================================================================

/// Macronix "Get ECC Status" - returns the bitflip count of the last read
pub const MX_GET_ECC_STATUS: u8 = 0x7C;

// ============================================================================
// Status register (0xC0) bits
// ============================================================================

/// Operation In Progress (busy)
pub const SR_OIP: u8 = 1 << 0;
/// Write Enable Latch
pub const SR_WEL: u8 = 1 << 1;
/// Erase Fail
pub const SR_E_FAIL: u8 = 1 << 2;
/// Program Fail
pub const SR_P_FAIL: u8 = 1 << 3;

// ============================================================================
// Configuration register (0xB0) bits
// ============================================================================

/// On-die ECC enable
pub const CFG_ECC_EN: u8 = 1 << 4;
/// Buffer read mode (Winbond)
pub const CFG_BUF: u8 = 1 << 3;
/// Quad enable (GigaDevice, Macronix)
pub const CFG_QE: u8 = 1 << 0;

/// Column bit selecting the plane on two-plane parts
pub const COLUMN_PLANE_BIT: u32 = 1 << 12;
