//! Transport traits and abstractions
//!
//! This module defines the trait every SPI NAND transport must implement.
//! The rest of the crate never touches hardware except through it.

mod traits;

pub use traits::*;
