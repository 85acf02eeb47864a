mod common;

use common::{attach, attach_with, chip, row, with_nand, DEFAULT_CHIP};
use snand_core::error::Error;
use snand_core::nand::{BadBlockTable, BlockState, UnitKind};
use snand_core::spi::opcodes;
use snand_dummy::DummyNand;

const OOB: usize = 2048;

fn marker(nftl: &common::TestNftl, block: u32, page: u32) -> u8 {
    with_nand(nftl, |nand| nand.page(row(block, page))[OOB])
}

#[test]
fn fresh_block_is_good_and_scanned_once() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);

    assert!(!nftl.is_bad_block(0, 3).unwrap());
    let state = nftl.with_device(|ops| ops.bbt().is_badblock(3));
    assert_eq!(state, BlockState::Good);

    // The table answers from now on, even if the marker changes
    with_nand(&nftl, |nand| nand.page_mut(row(3, 0))[OOB] = 0x00);
    let trace = with_nand(&nftl, |nand| nand.enable_trace());
    assert!(!nftl.is_bad_block(0, 3).unwrap());
    assert!(trace.events().is_empty());
}

#[test]
fn mark_bad_is_idempotent() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);

    nftl.mark_bad_block(0, 12).unwrap();
    assert!(nftl.is_bad_block(0, 12).unwrap());
    assert_eq!(marker(&nftl, 12, 0), 0x00);
    assert_eq!(marker(&nftl, 12, 63), 0x00);

    nftl.mark_bad_block(0, 12).unwrap();
    assert!(nftl.is_bad_block(0, 12).unwrap());
}

#[test]
fn mark_bad_tolerates_erase_failure() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    with_nand(&nftl, |nand| nand.fail_erase(13));

    nftl.mark_bad_block(0, 13).unwrap();
    assert!(nftl.is_bad_block(0, 13).unwrap());
    assert_eq!(marker(&nftl, 13, 0), 0x00);
    assert_eq!(marker(&nftl, 13, 63), 0x00);
}

#[test]
fn marker_write_failure_keeps_block_retired() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    with_nand(&nftl, |nand| nand.fail_program(row(14, 0)));

    assert_eq!(
        nftl.mark_bad_block(0, 14),
        Err(Error::ProgramFailure { row: row(14, 0) })
    );
    assert!(nftl.is_bad_block(0, 14).unwrap());
    // The second marker is still attempted
    assert_eq!(marker(&nftl, 14, 63), 0x00);
}

#[test]
fn scan_retries_a_failed_read_once() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);

    with_nand(&nftl, |nand| nand.fail_transport(opcodes::PAGE_READ, 1));
    assert!(!nftl.is_bad_block(0, 20).unwrap());

    with_nand(&nftl, |nand| nand.fail_transport(opcodes::PAGE_READ, 2));
    assert!(nftl.is_bad_block(0, 21).unwrap());
}

#[test]
fn marker_pages_follow_the_family() {
    // Macronix parts carry the marker on the first two pages
    let mut nand = DummyNand::new(chip("MX35LF1GE4AB"));
    nand.page_mut(row(4, 1))[OOB] = 0x00;
    let nftl = attach_with(nand, UnitKind::Physical);
    assert!(nftl.is_bad_block(0, 4).unwrap());

    // Dosilicon parts carry it on the last two pages, page 0 is ignored
    let mut nand = DummyNand::new(chip("DS35Q1GA"));
    nand.page_mut(row(4, 0))[OOB] = 0x00;
    nand.page_mut(row(5, 62))[OOB] = 0x00;
    let nftl = attach_with(nand, UnitKind::Physical);
    assert!(!nftl.is_bad_block(0, 4).unwrap());
    assert!(nftl.is_bad_block(0, 5).unwrap());
}

#[test]
fn super_block_is_bad_if_either_half_is() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Super);
    with_nand(&nftl, |nand| nand.page_mut(row(9, 0))[OOB] = 0x00);

    assert!(!nftl.is_bad_block(0, 3).unwrap());
    assert!(nftl.is_bad_block(0, 4).unwrap());

    nftl.mark_bad_block(0, 5).unwrap();
    assert_eq!(marker(&nftl, 10, 0), 0x00);
    assert_eq!(marker(&nftl, 11, 63), 0x00);
}
