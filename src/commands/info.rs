//! Info command implementation

use snand_core::chip::SizeUnit;

use crate::device::Device;

const UNITS: [(SizeUnit, &str); 4] = [
    (SizeUnit::Byte, "bytes"),
    (SizeUnit::Sector, "sectors"),
    (SizeUnit::Page, "pages"),
    (SizeUnit::Block, "blocks"),
];

/// Print chip, geometry and size information
pub fn print_info(nftl: &Device) {
    let chip = nftl.chip();
    let physical = nftl.physical_geometry();

    println!("NAND Chip Information");
    println!("=====================");
    println!();
    println!("Vendor:          {}", chip.vendor);
    println!("Name:            {}", chip.name);
    println!(
        "ID:              {:02X} {:04X}",
        chip.manufacturer_id, chip.device_id
    );
    println!("ECC reporting:   {:?}", chip.ecc);
    println!(
        "BB marker:       {:?} pages, OOB byte {}",
        chip.bbm.pages, chip.bbm.offset
    );
    println!();
    println!("Physical geometry");
    println!("  Dies:            {}", physical.dies());
    println!("  Blocks per die:  {}", physical.blocks_per_die());
    println!("  Pages per block: {}", physical.pages_per_block());
    println!(
        "  Page:            {} + {} bytes",
        physical.page_size(),
        physical.oob_size()
    );
    println!();
    println!("Addressing unit: {:?}", nftl.unit());
    if let Some(reserved) = nftl.partitions().reserved {
        println!(
            "Reserved:        0x{:X}..0x{:X} in super units, physical past it",
            reserved.start, reserved.end
        );
    }
    println!(
        "{:<8} {:>12} {:>12} {:>12} {:>12}",
        "", "page", "block", "die", "chip"
    );
    for (unit, name) in UNITS {
        println!(
            "{:<8} {:>12} {:>12} {:>12} {:>12}",
            name,
            nftl.page_size(unit),
            nftl.block_size(unit),
            nftl.die_size(unit),
            nftl.chip_size(unit)
        );
    }
}
