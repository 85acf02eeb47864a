//! NAND chip types and database
//!
//! This module provides types for describing serial NAND chips (geometry,
//! ECC reporting scheme, bad-block marker layout) and a database of known
//! chips.

mod database;
mod features;
mod geometry;
mod types;

pub use database::*;
pub use features::Features;
pub use geometry::{ChipGeometry, SizeUnit};
pub use types::*;
