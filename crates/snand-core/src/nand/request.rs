//! Page requests passed through the physical and emulation layers

use crate::chip::ChipGeometry;
use crate::error::{Error, Result};
use crate::programmer::ExecContext;

/// How a page operation treats the on-die ECC engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpMode {
    /// ECC enabled, results classified
    #[default]
    Normal,
    /// ECC disabled for the duration of the operation
    Raw,
}

/// One page operation
///
/// `block` is the chip-wide block index of the unit the request is aimed
/// at: a physical block for [`PhysicalOps`](super::PhysicalOps), a super
/// block for [`SuperPageOps`](super::SuperPageOps). An empty slice stands
/// for an absent buffer; the transfer lengths are the slice lengths.
#[derive(Debug)]
pub struct Request<B> {
    /// Block index
    pub block: u32,
    /// Page inside the block
    pub page: u32,
    /// Byte offset of `data` inside the page
    pub offset: u32,
    /// Main area buffer
    pub data: B,
    /// Spare area buffer, transferred from the start of the OOB
    ///
    /// Under super-page emulation the OOB follows the data: a request
    /// starting in the second half uses the spare area of the odd block.
    pub oob: B,
    /// ECC handling
    pub mode: OpMode,
    /// Execution context
    pub ctx: ExecContext,
}

/// Request reading into caller buffers
pub type ReadRequest<'a> = Request<&'a mut [u8]>;

/// Request writing from caller buffers
pub type WriteRequest<'a> = Request<&'a [u8]>;

impl<B: AsRef<[u8]>> Request<B> {
    /// Create a normal-mode request at `offset` of (block, page)
    pub fn new(block: u32, page: u32, offset: u32, data: B, oob: B) -> Self {
        Self {
            block,
            page,
            offset,
            data,
            oob,
            mode: OpMode::Normal,
            ctx: ExecContext::Normal,
        }
    }

    /// Switch the request to raw mode
    pub fn raw(mut self) -> Self {
        self.mode = OpMode::Raw;
        self
    }

    /// Run the request in the given execution context
    pub fn in_context(mut self, ctx: ExecContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Main area bytes to transfer
    pub fn data_len(&self) -> usize {
        self.data.as_ref().len()
    }

    /// Spare area bytes to transfer
    pub fn oob_len(&self) -> usize {
        self.oob.as_ref().len()
    }

    /// True if the request is in raw mode
    pub fn is_raw(&self) -> bool {
        self.mode == OpMode::Raw
    }

    /// Check the request against `geometry`
    ///
    /// The position must exist, `offset + data_len` must stay inside the
    /// page, the OOB must fit the spare area and at least one buffer must be
    /// present.
    pub fn validate(&self, geometry: &ChipGeometry) -> Result<()> {
        if self.block >= geometry.total_blocks() || self.page >= geometry.pages_per_block() {
            return Err(Error::OutOfRange);
        }
        if self.data_len() == 0 && self.oob_len() == 0 {
            return Err(Error::InvalidArgument);
        }
        let end = self.offset as u64 + self.data_len() as u64;
        if end > geometry.page_size() as u64 {
            return Err(Error::OutOfRange);
        }
        if self.oob_len() > geometry.oob_size() as usize {
            return Err(Error::OutOfRange);
        }
        Ok(())
    }
}
