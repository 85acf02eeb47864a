//! SPI types and command structures
//!
//! This module provides types for representing SPI NAND transactions and the
//! standard serial NAND opcodes and feature registers.

mod address;
mod command;
pub mod opcodes;

pub use address::AddressWidth;
pub use command::SpiCommand;
pub use opcodes::*;
