mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use common::{
    attach, chip, config, row, seq_assert, seq_gen, with_nand, TestNftl, DEFAULT_CHIP,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use snand_core::chip::{ChipDatabase, SizeUnit};
use snand_core::error::Error;
use snand_core::nand::{MemoryBbt, PartitionLayout, SpiCacheBridge, UnitKind};
use snand_core::nftl::{Nftl, NftlConfig, PageStatus};
use snand_core::programmer::SpiMaster;
use snand_core::spi::opcodes;
use snand_dummy::{BusEvent, DummyNand, EccFault, ImageError};

#[test]
fn probe_identifies_the_chip() {
    let nand = DummyNand::new(chip("GD5F1GQ4UB"));
    let nftl = Nftl::probe(
        nand,
        &ChipDatabase::with_builtin(),
        SpiCacheBridge::new(),
        MemoryBbt::new(),
        config(UnitKind::Physical),
    )
    .unwrap();

    assert_eq!(nftl.chip().name, "GD5F1GQ4UB");
    assert_eq!(nftl.geometry().oob_size(), 128);
    with_nand(&nftl, |nand| {
        assert_eq!(nand.feature(opcodes::FEATURE_PROTECTION), 0);
        assert_ne!(nand.feature(opcodes::FEATURE_CONFIG) & opcodes::CFG_QE, 0);
    });
}

#[test]
fn probe_and_attach_reject_unknown_parts() {
    let result = Nftl::probe(
        DummyNand::new(chip(DEFAULT_CHIP)),
        &ChipDatabase::new(),
        SpiCacheBridge::new(),
        MemoryBbt::new(),
        NftlConfig::default(),
    );
    assert!(matches!(result, Err(Error::ChipNotFound)));

    let result = Nftl::attach(
        DummyNand::new(chip(DEFAULT_CHIP)),
        chip("GD5F1GQ4UB"),
        SpiCacheBridge::new(),
        MemoryBbt::new(),
        NftlConfig::default(),
    );
    assert!(matches!(result, Err(Error::IdMismatch)));
}

#[test]
fn attach_rejects_a_misaligned_reserved_partition() {
    let mut cfg = config(UnitKind::Physical);
    cfg.partitions = PartitionLayout::with_reserved(0, 128 * 1024);
    let result = Nftl::attach(
        DummyNand::new(chip(DEFAULT_CHIP)),
        chip(DEFAULT_CHIP),
        SpiCacheBridge::new(),
        MemoryBbt::new(),
        cfg,
    );
    assert!(matches!(result, Err(Error::InvalidArgument)));
}

#[test]
fn physical_size_queries() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    assert_eq!(nftl.page_size(SizeUnit::Byte), 2048);
    assert_eq!(nftl.page_size(SizeUnit::Sector), 4);
    assert_eq!(nftl.block_size(SizeUnit::Byte), 128 * 1024);
    assert_eq!(nftl.die_size(SizeUnit::Block), 1024);
    assert_eq!(nftl.chip_size(SizeUnit::Page), 65536);
}

#[test]
fn sector_bitmap_selects_part_of_the_page() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    let mut page = vec![0u8; 2048];
    seq_gen(9, &mut page);
    nftl.write_page(0, 30, 1, 0b1111, &page, &[]).unwrap();

    let mut buf = vec![0u8; 1024];
    nftl.read_page(0, 30, 1, 0b0110, &mut buf, &mut []).unwrap();
    assert_eq!(buf, page[512..1536]);

    // Extra buffer space past the selected sectors is left alone
    let mut buf = vec![0xEEu8; 1024];
    nftl.read_page(0, 30, 1, 0b1000, &mut buf, &mut []).unwrap();
    assert_eq!(buf[..512], page[1536..]);
    assert!(buf[512..].iter().all(|&b| b == 0xEE));

    // OOB only
    let mut oob = [0u8; 4];
    nftl.read_page(0, 30, 1, 0, &mut [], &mut oob).unwrap();
    assert_eq!(oob, [0xFF; 4]);
}

#[test]
fn invalid_requests_never_reach_the_bus() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    let trace = with_nand(&nftl, |nand| nand.enable_trace());
    let mut buf = vec![0u8; 2048];
    let data = [0u8; 2048];

    assert_eq!(
        nftl.read_page(1, 0, 0, 0b1111, &mut buf, &mut []),
        Err(Error::OutOfRange)
    );
    assert_eq!(
        nftl.read_page(0, 1024, 0, 0b1111, &mut buf, &mut []),
        Err(Error::OutOfRange)
    );
    assert_eq!(
        nftl.write_page(0, 0, 64, 0b1111, &data, &[]),
        Err(Error::OutOfRange)
    );
    assert_eq!(
        nftl.read_page(0, 0, 0, 0b0101, &mut buf, &mut []),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        nftl.read_page(0, 0, 0, 0, &mut buf, &mut []),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        nftl.write_page(0, 0, 0, 0b1111, &data[..1024], &[]),
        Err(Error::BufferTooSmall)
    );
    assert_eq!(
        nftl.write_page(0, 0, 0, 0b0001, &data[..512], &[0u8; 65]),
        Err(Error::OutOfRange)
    );
    assert_eq!(nftl.erase_block(0, 1024), Err(Error::OutOfRange));
    assert_eq!(nftl.mark_bad_block(0, 5000), Err(Error::OutOfRange));
    assert_eq!(nftl.copy_block(0, 3, 3), Err(Error::InvalidArgument));

    assert!(trace.events().is_empty());
}

#[test]
fn copy_block_duplicates_data_and_oob() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    let mut data = vec![0u8; 2048];
    let oob = [0x5Au8; 16];
    for page in [0, 1, 63] {
        seq_gen(page as u64 + 100, &mut data);
        nftl.write_page(0, 60, page, 0b1111, &data, &oob).unwrap();
    }
    // Stale content in the target is erased first
    nftl.write_page(0, 61, 5, 0b1111, &[0u8; 2048], &[]).unwrap();

    nftl.copy_block(0, 60, 61).unwrap();

    with_nand(&nftl, |nand| {
        for page in [0, 1, 63] {
            let copied = nand.page(row(61, page));
            seq_assert(page as u64 + 100, &copied[..2048]);
            assert_eq!(copied[2048..2064], oob);
        }
        assert!(nand.page(row(61, 5)).iter().all(|&b| b == 0xFF));
    });
}

#[test]
fn copy_block_stops_on_uncorrectable_source() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    with_nand(&nftl, |nand| nand.inject_ecc(row(62, 2), EccFault::Uncorrectable));

    assert_eq!(
        nftl.copy_block(0, 62, 63),
        Err(Error::EccUncorrectable { row: row(62, 2) })
    );
}

/// (simulated time, commands executed)
fn clock(nftl: &common::TestNftl) -> (u64, u64) {
    with_nand(nftl, |nand| (nand.now_us(), nand.command_count()))
}

#[test]
fn panic_path_never_sleeps() {
    let mut nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    let data = [0x77u8; 2048];

    let (t0, c0) = clock(&nftl);
    assert_eq!(
        nftl.panic_write_page(0, 70, 0, 0b1111, &data, &[]),
        Ok(PageStatus::Ok)
    );
    nftl.panic_erase_block(0, 71).unwrap();
    let (t1, c1) = clock(&nftl);
    // Every microsecond went to a command, none to a delay
    assert_eq!(t1 - t0, c1 - c0);

    nftl.write_page(0, 71, 0, 0b1111, &data, &[]).unwrap();
    let (t2, c2) = clock(&nftl);
    assert!(t2 - t1 > c2 - c1);

    let mut buf = vec![0u8; 2048];
    nftl.read_page(0, 70, 0, 0b1111, &mut buf, &mut []).unwrap();
    assert_eq!(buf, data);
}

fn attach_reserved(start: u64, end: u64, unit: UnitKind) -> Result<TestNftl, Error> {
    let mut cfg = config(unit);
    cfg.partitions = PartitionLayout::with_reserved(start, end);
    Nftl::attach(
        DummyNand::new(chip(DEFAULT_CHIP)),
        chip(DEFAULT_CHIP),
        SpiCacheBridge::new(),
        MemoryBbt::new(),
        cfg,
    )
}

#[test]
fn locate_resolves_both_partitions() {
    let nftl = attach_reserved(0, 8 << 20, UnitKind::Super).unwrap();

    let loc = nftl.locate(0x1000 + 7).unwrap();
    assert_eq!(loc.req.unit, UnitKind::Super);
    assert_eq!((loc.req.block, loc.req.page, loc.req.offset), (0, 1, 7));
    assert_eq!(loc.row, None);

    let loc = nftl.locate((8 << 20) + 2048 * 3 + 5).unwrap();
    assert_eq!(loc.req.unit, UnitKind::Physical);
    assert_eq!((loc.req.block, loc.req.page, loc.req.offset), (64, 3, 5));
    assert_eq!(loc.row, Some(row(64, 3)));

    assert_eq!(nftl.locate(128 << 20).map(|l| l.row), Err(Error::OutOfRange));
}

#[test]
fn located_positions_read_back_what_was_written() {
    let nftl = attach_reserved(0, 8 << 20, UnitKind::Super).unwrap();

    // Inside the reserved partition: one super page over blocks 0 and 1
    let loc = nftl.locate(0x1000).unwrap();
    assert_eq!(nftl.block_unit(0, loc.req.block), Ok(UnitKind::Super));
    let mut data = vec![0u8; 4096];
    seq_gen(41, &mut data);
    nftl.write_page(0, loc.req.block, loc.req.page, 0xFF, &data, &[])
        .unwrap();

    let mut buf = vec![0u8; 4096];
    nftl.read_page(0, loc.req.block, loc.req.page, 0xFF, &mut buf, &mut [])
        .unwrap();
    seq_assert(41, &buf);
    with_nand(&nftl, |nand| {
        assert_eq!(&nand.page(row(0, 1))[..2048], &data[..2048]);
        assert_eq!(&nand.page(row(1, 1))[..2048], &data[2048..]);
    });

    // Past it: a plain physical page
    let loc = nftl.locate((8 << 20) + 5 * 2048).unwrap();
    assert_eq!(nftl.block_unit(0, loc.req.block), Ok(UnitKind::Physical));
    let mut data = vec![0u8; 2048];
    seq_gen(42, &mut data);
    nftl.write_page(0, loc.req.block, loc.req.page, 0b1111, &data, &[])
        .unwrap();

    let mut buf = vec![0u8; 2048];
    nftl.read_page(0, loc.req.block, loc.req.page, 0b1111, &mut buf, &mut [])
        .unwrap();
    seq_assert(42, &buf);
    with_nand(&nftl, |nand| {
        assert_eq!(Some(row(64, 5)), loc.row);
        assert_eq!(&nand.page(row(64, 5))[..2048], &data[..]);
        assert!(nand.page(row(65, 5))[..2048].iter().all(|&b| b == 0xFF));
    });
}

#[test]
fn block_indices_between_the_partitions_do_not_exist() {
    let nftl = attach_reserved(0, 8 << 20, UnitKind::Super).unwrap();

    // Super blocks 0..32 cover physical 0..64; physical starts at 64
    assert_eq!(nftl.block_unit(0, 31), Ok(UnitKind::Super));
    assert_eq!(nftl.block_unit(0, 32), Err(Error::OutOfRange));
    assert_eq!(nftl.block_unit(0, 63), Err(Error::OutOfRange));
    assert_eq!(nftl.block_unit(0, 64), Ok(UnitKind::Physical));
    assert_eq!(nftl.block_unit(0, 1023), Ok(UnitKind::Physical));
    assert_eq!(nftl.block_unit(0, 1024), Err(Error::OutOfRange));

    let trace = with_nand(&nftl, |nand| nand.enable_trace());
    assert_eq!(nftl.erase_block(0, 40), Err(Error::OutOfRange));
    assert!(trace.events().is_empty());

    // Physical blocks use the physical page size
    let data = [0u8; 4096];
    assert_eq!(
        nftl.write_page(0, 64, 0, 0xFF, &data, &[]),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        nftl.block_geometry(0, 64).map(|g| g.page_size()),
        Ok(2048)
    );
    assert_eq!(nftl.block_geometry(0, 0).map(|g| g.page_size()), Ok(4096));
}

#[test]
fn whole_chip_super_mode_locates_super_units() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Super);

    let loc = nftl.locate(0x1000).unwrap();
    assert_eq!(loc.req.unit, UnitKind::Super);
    assert_eq!((loc.req.block, loc.req.page, loc.req.offset), (0, 1, 0));
    assert_eq!(nftl.block_unit(0, 511), Ok(UnitKind::Super));
    assert_eq!(nftl.block_unit(0, 512), Err(Error::OutOfRange));
}

#[test]
fn attach_rejects_layouts_the_units_cannot_serve() {
    // A reserved partition without super-page emulation
    assert!(matches!(
        attach_reserved(0, 8 << 20, UnitKind::Physical),
        Err(Error::InvalidArgument)
    ));
    // Super block indices would collide with the physical blocks below it
    assert!(matches!(
        attach_reserved(256 * 1024, 8 << 20, UnitKind::Super),
        Err(Error::InvalidArgument)
    ));
}

#[test]
fn random_writes_read_back() {
    let nftl = attach(DEFAULT_CHIP, UnitKind::Physical);
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mut written = HashSet::new();
    let mut data = vec![0u8; 2048];

    for _ in 0..64 {
        let block = rng.gen_range(100..120);
        let page = rng.gen_range(0..64);
        if !written.insert((block, page)) {
            continue;
        }
        seq_gen(row(block, page) as u64, &mut data);
        nftl.write_page(0, block, page, 0b1111, &data, &[]).unwrap();
    }

    let mut buf = vec![0u8; 2048];
    for &(block, page) in &written {
        let status = nftl.read_page(0, block, page, 0b1111, &mut buf, &mut []).unwrap();
        assert_eq!(status, PageStatus::Ok);
        seq_assert(row(block, page) as u64, &buf);
    }
}

/// Every `start` opcode is followed by `end` with no other thread's
/// command in between
fn assert_unbroken(events: &[BusEvent], start: u8, end: u8) {
    for (i, event) in events.iter().enumerate() {
        if event.opcode != start {
            continue;
        }
        let window = events[i..]
            .iter()
            .position(|e| e.opcode == end)
            .map(|len| &events[i..=i + len])
            .unwrap_or_else(|| panic!("opcode {:02X} at {} never completed", start, i));
        assert!(
            window.iter().all(|e| e.thread == event.thread),
            "sequence at {} interleaved with another thread",
            i
        );
    }
}

#[test]
fn concurrent_users_are_serialized() {
    let nftl = Arc::new(attach(DEFAULT_CHIP, UnitKind::Physical));
    let trace = with_nand(&nftl, |nand| nand.enable_trace());

    let workers: Vec<_> = (0..2u32)
        .map(|t| {
            let nftl = Arc::clone(&nftl);
            thread::spawn(move || {
                let block = 200 + t;
                let mut data = vec![0u8; 2048];
                for page in 0..16 {
                    seq_gen((t * 100 + page) as u64, &mut data);
                    nftl.write_page(0, block, page, 0b1111, &data, &[]).unwrap();
                }
                for page in 0..16 {
                    nftl.read_page(0, block, page, 0b1111, &mut data, &mut [])
                        .unwrap();
                    seq_assert((t * 100 + page) as u64, &data);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let events = trace.events();
    assert_unbroken(&events, opcodes::PAGE_READ, opcodes::READ_CACHE);
    assert_unbroken(&events, opcodes::PROGRAM_LOAD, opcodes::PROGRAM_EXECUTE);
}

#[test]
fn image_must_match_the_chip() {
    let nand = DummyNand::new(chip(DEFAULT_CHIP));
    assert_eq!(nand.image_size(), 1024 * 64 * (2048 + 64));

    let path = std::env::temp_dir().join(format!("snand-short-image-{}.bin", std::process::id()));
    std::fs::write(&path, [0xFFu8; 4096]).unwrap();
    let result = DummyNand::from_image(chip(DEFAULT_CHIP), &path);
    std::fs::remove_file(&path).unwrap();

    match result {
        Err(ImageError::SizeMismatch { expected, actual }) => {
            assert_eq!(expected, nand.image_size());
            assert_eq!(actual, 4096);
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("short image accepted"),
    }
}
