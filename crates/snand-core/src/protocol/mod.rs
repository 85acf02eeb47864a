//! Protocol implementations
//!
//! This module contains the serial NAND command sequences and the status
//! register accessors.

pub mod snand;
pub mod status;

pub use status::StatusReg;
