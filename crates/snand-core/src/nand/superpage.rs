//! Super-page emulation
//!
//! A super page is twice a physical page: its first half is page `p` of
//! physical block `2k`, its second half page `p` of block `2k + 1`, where
//! `k` is the super block. OOB doubles the same way. [`SuperRequest`] splits
//! one super-page access into at most two physical accesses and
//! [`SuperPageOps`] runs the five block operations on top of any physical
//! [`BlockOps`].

use crate::chip::ChipGeometry;
use crate::error::{Error, Result};
use crate::programmer::ExecContext;

use super::ecc::EccStatus;
use super::ops::BlockOps;
use super::request::{ReadRequest, Request, WriteRequest};

/// One physical access produced by a [`SuperRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRequest {
    /// Physical block
    pub block: u32,
    /// Page inside the physical block
    pub page: u32,
    /// Byte offset inside the physical page
    pub offset: u32,
    /// Main area bytes of this access
    pub data_len: usize,
    /// OOB bytes of this access
    pub oob_len: usize,
}

/// Split of a super-page access into physical accesses
///
/// Iterating yields the physical accesses in order. The first one targets
/// block `2k` when the offset lies in the first half of the super page and
/// `2k + 1` otherwise; each following access starts at offset 0 of the next
/// physical block. Iteration ends when no data or OOB is left, after at most
/// two accesses.
#[derive(Debug, Clone)]
pub struct SuperRequest {
    page_size: u32,
    oob_size: u32,
    block: u32,
    page: u32,
    offset: u32,
    data_remaining: usize,
    oob_remaining: usize,
    issued: u8,
}

impl SuperRequest {
    /// Most physical accesses a super request can need
    pub const MAX_SUBREQUESTS: u8 = 2;

    /// Plan the access of `data_len` bytes at `offset` of super page
    /// (`block`, `page`) plus `oob_len` OOB bytes
    ///
    /// `physical` is the physical geometry. The super position itself is
    /// not bounds checked here.
    pub fn new(
        physical: &ChipGeometry,
        block: u32,
        page: u32,
        offset: u32,
        data_len: usize,
        oob_len: usize,
    ) -> Result<Self> {
        let page_size = physical.page_size();
        let oob_size = physical.oob_size();

        if offset as u64 + data_len as u64 > page_size as u64 * 2 {
            return Err(Error::OutOfRange);
        }
        if oob_len > oob_size as usize * 2 {
            return Err(Error::OutOfRange);
        }

        let (first_block, offset) = if offset < page_size {
            (block * 2, offset)
        } else {
            (block * 2 + 1, offset - page_size)
        };

        // A request that starts in the second half has a single physical
        // page left for its OOB
        if first_block & 1 == 1 && oob_len > oob_size as usize {
            return Err(Error::InvalidArgument);
        }

        Ok(Self {
            page_size,
            oob_size,
            block: first_block,
            page,
            offset,
            data_remaining: data_len,
            oob_remaining: oob_len,
            issued: 0,
        })
    }

    /// True once all data and OOB has been handed out
    pub fn is_done(&self) -> bool {
        self.data_remaining == 0 && self.oob_remaining == 0
    }
}

impl Iterator for SuperRequest {
    type Item = SubRequest;

    fn next(&mut self) -> Option<SubRequest> {
        if self.is_done() {
            return None;
        }
        debug_assert!(self.issued < Self::MAX_SUBREQUESTS);
        if self.issued >= Self::MAX_SUBREQUESTS {
            return None;
        }

        let room = (self.page_size - self.offset) as usize;
        let sub = SubRequest {
            block: self.block,
            page: self.page,
            offset: self.offset,
            data_len: self.data_remaining.min(room),
            oob_len: self.oob_remaining.min(self.oob_size as usize),
        };

        self.data_remaining -= sub.data_len;
        self.oob_remaining -= sub.oob_len;
        self.offset = 0;
        self.block += 1;
        self.issued += 1;

        log::trace!(
            "super split: block {} page {} offset {} data {} oob {}",
            sub.block,
            sub.page,
            sub.offset,
            sub.data_len,
            sub.oob_len
        );
        Some(sub)
    }
}

/// [`BlockOps`] on super units, on top of physical [`BlockOps`]
pub struct SuperPageOps<'a> {
    inner: &'a mut dyn BlockOps,
    geometry: ChipGeometry,
}

impl<'a> SuperPageOps<'a> {
    /// Wrap physical operations
    ///
    /// `geometry` is the super geometry, normally
    /// `inner.geometry().doubled()`.
    pub fn new(inner: &'a mut dyn BlockOps, geometry: ChipGeometry) -> Self {
        Self { inner, geometry }
    }

    fn check_block(&self, block: u32) -> Result<()> {
        if block >= self.geometry.total_blocks() {
            return Err(Error::OutOfRange);
        }
        Ok(())
    }

    fn split<B: AsRef<[u8]>>(&self, req: &Request<B>) -> Result<SuperRequest> {
        if req.block >= self.geometry.total_blocks() || req.page >= self.geometry.pages_per_block() {
            return Err(Error::OutOfRange);
        }
        if req.data_len() == 0 && req.oob_len() == 0 {
            return Err(Error::InvalidArgument);
        }
        SuperRequest::new(
            self.inner.geometry(),
            req.block,
            req.page,
            req.offset,
            req.data_len(),
            req.oob_len(),
        )
    }
}

impl BlockOps for SuperPageOps<'_> {
    fn geometry(&self) -> &ChipGeometry {
        &self.geometry
    }

    fn is_bad(&mut self, block: u32) -> Result<bool> {
        self.check_block(block)?;
        let first = self.inner.is_bad(block * 2)?;
        let second = self.inner.is_bad(block * 2 + 1)?;
        Ok(first || second)
    }

    fn mark_bad(&mut self, block: u32) -> Result<()> {
        self.check_block(block)?;
        let first = self.inner.mark_bad(block * 2);
        let second = self.inner.mark_bad(block * 2 + 1);
        first.and(second)
    }

    fn erase_block(&mut self, block: u32, ctx: ExecContext) -> Result<()> {
        self.check_block(block)?;
        self.inner.erase_block(block * 2, ctx)?;
        self.inner.erase_block(block * 2 + 1, ctx)
    }

    fn write_page(&mut self, req: &WriteRequest<'_>) -> Result<()> {
        let split = self.split(req)?;
        let mut data = req.data;
        let mut oob = req.oob;

        for sub in split {
            let (sub_data, rest) = data.split_at(sub.data_len);
            let (sub_oob, oob_rest) = oob.split_at(sub.oob_len);
            data = rest;
            oob = oob_rest;

            let mut phys = WriteRequest::new(sub.block, sub.page, sub.offset, sub_data, sub_oob)
                .in_context(req.ctx);
            phys.mode = req.mode;
            self.inner.write_page(&phys)?;
        }
        Ok(())
    }

    fn read_page(&mut self, req: &mut ReadRequest<'_>) -> Result<EccStatus> {
        let split = self.split(req)?;
        let mut data: &mut [u8] = &mut *req.data;
        let mut oob: &mut [u8] = &mut *req.oob;
        let mut worst = EccStatus::Good;

        // Both halves are read even after an uncorrectable first half, so a
        // LIMIT never hides an ERROR and vice versa
        for sub in split {
            let (sub_data, rest) = core::mem::take(&mut data).split_at_mut(sub.data_len);
            let (sub_oob, oob_rest) = core::mem::take(&mut oob).split_at_mut(sub.oob_len);
            data = rest;
            oob = oob_rest;

            let mut phys = ReadRequest::new(sub.block, sub.page, sub.offset, sub_data, sub_oob)
                .in_context(req.ctx);
            phys.mode = req.mode;
            worst = worst.worst(self.inner.read_page(&mut phys)?);
        }
        Ok(worst)
    }
}
