//! Bad-block management
//!
//! A block is bad when the marker byte in the OOB of one of its marker
//! pages is not 0xFF. Scans run in raw mode so the on-die ECC engine never
//! "corrects" a marker, and their result is written to the bad-block table
//! so each block is scanned at most once per session.

use alloc::vec;

use crate::error::{Error, Result};
use crate::programmer::{ExecContext, SpiMaster};

use super::bbt::{BadBlockTable, BlockState};
use super::cache::CacheBridge;
use super::ops::BlockOps;
use super::physical::PhysicalOps;
use super::request::{ReadRequest, WriteRequest};

/// Marker value of a good block
const GOOD_BLOCK_MARKER: u8 = 0xFF;

impl<M: SpiMaster, C: CacheBridge, T: BadBlockTable> PhysicalOps<M, C, T> {
    /// Whether physical `block` is bad
    ///
    /// Answers from the table when it knows the block, scans the marker
    /// pages otherwise. A marker page that cannot be read even after one
    /// retry makes the block bad.
    pub fn is_bad_block(&mut self, block: u32) -> Result<bool> {
        if block >= self.geometry().total_blocks() {
            return Err(Error::OutOfRange);
        }

        match self.bbt().is_badblock(block) {
            BlockState::Good => return Ok(false),
            BlockState::Bad => return Ok(true),
            BlockState::Unmarked => {}
        }

        let bad = self.scan_block(block);
        self.bbt_mut().mark_badblock(block, bad);
        log::debug!("scanned block {}: {}", block, if bad { "bad" } else { "good" });
        Ok(bad)
    }

    /// Mark physical `block` bad
    ///
    /// Does nothing for a block that is already bad. Otherwise the block is
    /// erased (a failed erase is only logged), recorded bad in the table,
    /// and zero markers are programmed to its first and last page. Both
    /// marker writes are attempted; the first failure is returned and the
    /// table entry stays bad.
    pub fn mark_bad_block(&mut self, block: u32) -> Result<()> {
        if self.is_bad_block(block)? {
            log::debug!("block {} already bad", block);
            return Ok(());
        }

        if let Err(e) = self.erase_block(block, ExecContext::Normal) {
            log::warn!("erase of block {} before marking it bad failed: {}", block, e);
        }

        // The table is updated first so a crash during the marker writes
        // still leaves the block retired
        self.bbt_mut().mark_badblock(block, true);
        log::info!("marking block {} bad", block);

        let marker = vec![0u8; self.geometry().oob_size() as usize];
        let last_page = self.geometry().pages_per_block() - 1;

        let first = self.write_page(&WriteRequest::new(block, 0, 0, &[], &marker).raw());
        let last = self.write_page(&WriteRequest::new(block, last_page, 0, &[], &marker).raw());
        first.and(last)
    }

    fn scan_block(&mut self, block: u32) -> bool {
        let bbm = self.chip().bbm;
        let (pages, count) = bbm.pages.candidates(self.geometry().pages_per_block());
        let mut oob = vec![0u8; self.geometry().oob_size() as usize];

        pages[..count]
            .iter()
            .any(|&page| self.marker_is_bad(block, page, bbm.offset as usize, &mut oob))
    }

    fn marker_is_bad(&mut self, block: u32, page: u32, offset: usize, oob: &mut [u8]) -> bool {
        for attempt in 0..2 {
            let mut req = ReadRequest::new(block, page, 0, &mut [], &mut *oob).raw();
            match self.read_page(&mut req) {
                Ok(_) => {
                    return oob
                        .get(offset)
                        .map_or(true, |&marker| marker != GOOD_BLOCK_MARKER)
                }
                Err(e) if attempt == 0 => {
                    log::warn!("marker read of block {} page {} failed: {}, retrying", block, page, e)
                }
                Err(e) => {
                    log::warn!("marker read of block {} page {} failed again: {}", block, page, e)
                }
            }
        }
        true
    }
}
