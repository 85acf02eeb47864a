//! snand-core - Serial NAND physical layer and translation-layer API
//!
//! This crate drives ONFI-style SPI NAND chips through a [`SpiMaster`]
//! transport. It provides:
//!
//! - the command sequences and bounded busy poll ([`protocol::snand`])
//! - per-family ECC status decoding, bad-block management and the five
//!   physical block operations ([`nand`])
//! - optional super-page emulation, where one logical page spans two
//!   physical blocks ([`nand::SuperPageOps`])
//! - the serialized NFTL frontend ([`nftl::Nftl`])
//!
//! It is `no_std` and only needs `alloc`.
//!
//! # Features
//!
//! - `std` - Enable standard library support: RON chip database loading,
//!   TOML configuration and `std::error::Error` impls
//!
//! # Example
//!
//! ```ignore
//! use snand_core::chip::{ChipDatabase, SizeUnit};
//! use snand_core::nand::{MemoryBbt, SpiCacheBridge};
//! use snand_core::nftl::{Nftl, NftlConfig};
//!
//! let db = ChipDatabase::with_builtin();
//! let nftl = Nftl::probe(master, &db, SpiCacheBridge::new(), MemoryBbt::new(), NftlConfig::default())?;
//! let mut page = vec![0u8; nftl.page_size(SizeUnit::Byte) as usize];
//! let status = nftl.read_page(0, 5, 3, 0xF, &mut page, &mut [])?;
//! ```
//!
//! [`SpiMaster`]: programmer::SpiMaster

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod error;
pub mod nand;
pub mod nftl;
pub mod programmer;
pub mod protocol;
pub mod spi;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
