//! Page read and write commands

use std::fs;
use std::path::Path;

use snand_core::chip::ChipGeometry;
use snand_core::nftl::PageStatus;

use crate::cli::PageArgs;
use crate::device::Device;

/// Sector bitmap selecting every sector of a page
fn all_sectors(geometry: &ChipGeometry) -> u32 {
    let count = geometry.sectors_per_page();
    if count >= u32::BITS {
        u32::MAX
    } else {
        (1 << count) - 1
    }
}

fn selected_bytes(geometry: &ChipGeometry, sectors: u32) -> usize {
    sectors.count_ones() as usize * geometry.sector_size() as usize
}

fn describe(status: PageStatus) -> &'static str {
    match status {
        PageStatus::Ok => "OK",
        PageStatus::EccLimit => "ECC LIMIT",
        PageStatus::EccError => "ECC ERROR",
    }
}

/// Read one page (the selected sectors) to `output`
pub fn run_read(
    nftl: &Device,
    pos: &PageArgs,
    output: &Path,
    oob_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = nftl.block_geometry(pos.die, pos.block)?;
    let sectors = pos.sectors.unwrap_or_else(|| all_sectors(&geometry));
    let mut data = vec![0u8; selected_bytes(&geometry, sectors)];
    let mut oob = match oob_output {
        Some(_) => vec![0u8; geometry.oob_size() as usize],
        None => Vec::new(),
    };

    let status = nftl.read_page(pos.die, pos.block, pos.page, sectors, &mut data, &mut oob)?;

    fs::write(output, &data)?;
    println!("Wrote {} bytes to {:?}", data.len(), output);
    if let Some(path) = oob_output {
        fs::write(path, &oob)?;
        println!("Wrote {} OOB bytes to {:?}", oob.len(), path);
    }

    println!(
        "Die {} block {} page {}: {}",
        pos.die,
        pos.block,
        pos.page,
        describe(status)
    );
    Ok(())
}

/// Program one page (the selected sectors) from `input`
///
/// A short input is padded with 0xFF, which leaves those bytes erased.
pub fn run_write(
    nftl: &Device,
    pos: &PageArgs,
    input: &Path,
    oob_input: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = nftl.block_geometry(pos.die, pos.block)?;
    let sectors = pos.sectors.unwrap_or_else(|| all_sectors(&geometry));
    let span = selected_bytes(&geometry, sectors);

    let mut data = fs::read(input)?;
    if data.len() > span {
        return Err(format!(
            "{:?} is {} bytes, the selected sectors hold {}",
            input,
            data.len(),
            span
        )
        .into());
    }
    data.resize(span, 0xFF);

    let oob = match oob_input {
        Some(path) => fs::read(path)?,
        None => Vec::new(),
    };

    nftl.write_page(pos.die, pos.block, pos.page, sectors, &data, &oob)?;
    println!(
        "Programmed die {} block {} page {} ({} data, {} OOB bytes)",
        pos.die,
        pos.block,
        pos.page,
        data.len(),
        oob.len()
    );
    Ok(())
}
