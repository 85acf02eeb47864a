//! Bad-block scan command

use indicatif::{ProgressBar, ProgressStyle};
use snand_core::Error;

use crate::device::Device;

/// Check every block and list the bad ones
///
/// Block indices are walked over the physical range; indices that name no
/// block in the partition layout are skipped.
pub fn run_scan(nftl: &Device) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = nftl.physical_geometry();
    let total = geometry.dies() as u64 * geometry.blocks_per_die() as u64;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} blocks ({eta})")?
            .progress_chars("#>-"),
    );

    let mut bad = Vec::new();
    for die in 0..geometry.dies() {
        for block in 0..geometry.blocks_per_die() {
            let unit = match nftl.block_unit(die, block) {
                Ok(unit) => unit,
                Err(Error::OutOfRange) => {
                    pb.inc(1);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if nftl.is_bad_block(die, block)? {
                bad.push((die, block, unit));
            }
            pb.inc(1);
        }
    }
    pb.finish_with_message("Scan complete");

    if bad.is_empty() {
        println!("No bad blocks");
    } else {
        println!("{} bad block(s):", bad.len());
        for (die, block, unit) in bad {
            println!("  die {} block {} ({:?})", die, block, unit);
        }
    }
    Ok(())
}
