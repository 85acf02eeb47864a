//! Locate command implementation

use snand_core::nand::UnitKind;

use crate::device::Device;

/// Translate a flat byte address and print where it lands
pub fn run_locate(nftl: &Device, addr: u64) -> Result<(), Box<dyn std::error::Error>> {
    let loc = nftl.locate(addr)?;
    let unit = match loc.req.unit {
        UnitKind::Physical => "physical",
        UnitKind::Super => "super",
    };

    println!("Address:  0x{:010X}", addr);
    println!("Unit:     {}", unit);
    println!("Block:    {}", loc.req.block);
    println!("Page:     {}", loc.req.page);
    println!("Offset:   {}", loc.req.offset);
    match loc.row {
        Some(row) => println!("Row:      0x{:06X}", row),
        None => println!(
            "Rows:     blocks {} and {}, page {}",
            loc.req.block * 2,
            loc.req.block * 2 + 1,
            loc.req.page
        ),
    }
    Ok(())
}
