//! NAND physical layer
//!
//! This module turns the raw command set into page and block operations:
//!
//! - [`request`]: page request types
//! - [`addr`]: flat address translation over the partition layout
//! - [`ecc`]: per-family ECC status decoding
//! - [`cache`]: transfers through the device page cache
//! - [`bbt`] / `bbm`: bad-block table and marker handling
//! - [`PhysicalOps`] and [`SuperPageOps`]: the two [`BlockOps`] strategies

pub mod addr;
mod bbm;
pub mod bbt;
pub mod cache;
pub mod ecc;
mod ops;
mod physical;
pub mod request;
mod superpage;

pub use addr::{addr_to_req, req_to_paddr, AddrReq, PartitionLayout, ReservedPartition, UnitKind};
pub use bbt::{BadBlockTable, BlockState, MemoryBbt};
pub use cache::{CacheBridge, CacheLayout, SpiCacheBridge};
pub use ecc::{check_ecc, classify, EccStatus};
pub use ops::BlockOps;
pub use physical::PhysicalOps;
pub use request::{OpMode, ReadRequest, Request, WriteRequest};
pub use superpage::{SubRequest, SuperPageOps, SuperRequest};
