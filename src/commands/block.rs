//! Block commands: erase, mark-bad and copy

use crate::cli::BlockArgs;
use crate::device::Device;

/// Erase one block
pub fn run_erase(nftl: &Device, pos: &BlockArgs) -> Result<(), Box<dyn std::error::Error>> {
    nftl.erase_block(pos.die, pos.block)?;
    println!("Erased die {} block {}", pos.die, pos.block);
    Ok(())
}

/// Retire one block
pub fn run_mark_bad(nftl: &Device, pos: &BlockArgs) -> Result<(), Box<dyn std::error::Error>> {
    if nftl.is_bad_block(pos.die, pos.block)? {
        println!("Die {} block {} is already bad", pos.die, pos.block);
        return Ok(());
    }
    nftl.mark_bad_block(pos.die, pos.block)?;
    println!("Marked die {} block {} bad", pos.die, pos.block);
    Ok(())
}

/// Copy block `from` to block `to`
pub fn run_copy(
    nftl: &Device,
    die: u32,
    from: u32,
    to: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    for block in [from, to] {
        if nftl.is_bad_block(die, block)? {
            return Err(format!("die {} block {} is bad", die, block).into());
        }
    }
    nftl.copy_block(die, from, to)?;
    println!("Copied die {} block {} to block {}", die, from, to);
    Ok(())
}
