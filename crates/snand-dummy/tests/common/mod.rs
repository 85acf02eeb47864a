//! Shared helpers for the emulator-backed tests

#![allow(dead_code)]

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use snand_core::chip::{ChipDatabase, NandChip};
use snand_core::nand::{MemoryBbt, SpiCacheBridge, UnitKind};
use snand_core::nftl::{Nftl, NftlConfig};
use snand_dummy::DummyNand;

pub type TestNftl = Nftl<DummyNand, SpiCacheBridge, MemoryBbt>;

/// W25N01GV: 1 die, 1024 blocks, 64 pages of 2048 + 64 bytes
pub const DEFAULT_CHIP: &str = "W25N01GV";

pub fn chip(name: &str) -> NandChip {
    ChipDatabase::with_builtin()
        .find_by_name(name)
        .cloned()
        .unwrap_or_else(|| panic!("{} not in the built-in database", name))
}

pub fn config(unit: UnitKind) -> NftlConfig {
    NftlConfig {
        unit,
        ..NftlConfig::default()
    }
}

pub fn attach_with(nand: DummyNand, unit: UnitKind) -> TestNftl {
    let chip = nand.chip().clone();
    Nftl::attach(nand, chip, SpiCacheBridge::new(), MemoryBbt::new(), config(unit)).unwrap()
}

pub fn attach(name: &str, unit: UnitKind) -> TestNftl {
    attach_with(DummyNand::new(chip(name)), unit)
}

/// Physical row of (block, page) on a 64 page-per-block chip
pub fn row(block: u32, page: u32) -> u32 {
    block * 64 + page
}

pub fn seq_gen(seed: u64, buf: &mut [u8]) {
    let mut small_rng = SmallRng::seed_from_u64(seed);
    small_rng.fill_bytes(buf);
}

pub fn seq_assert(seed: u64, buf: &[u8]) {
    let mut expected = vec![0u8; buf.len()];
    seq_gen(seed, &mut expected);
    assert!(buf == &expected[..], "data mismatch for seed {}", seed);
}

/// Run `f` on the emulated chip behind `nftl`
pub fn with_nand<R>(nftl: &TestNftl, f: impl FnOnce(&mut DummyNand) -> R) -> R {
    nftl.with_device(|ops| f(ops.master_mut()))
}
