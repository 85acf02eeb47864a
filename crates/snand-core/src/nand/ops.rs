//! The block operation vocabulary shared by every addressing strategy

use alloc::vec;

use crate::chip::ChipGeometry;
use crate::error::{Error, Result};
use crate::programmer::ExecContext;

use super::ecc::EccStatus;
use super::request::{ReadRequest, WriteRequest};

/// Five primitive block operations plus block copy
///
/// Implemented by [`PhysicalOps`](super::PhysicalOps) for physical units and
/// by [`SuperPageOps`](super::SuperPageOps) for double-size units. The
/// strategy is picked once at attach time and used through `dyn BlockOps`.
/// Block indices are chip wide and expressed in the implementor's unit.
pub trait BlockOps {
    /// Geometry of the addressing unit
    fn geometry(&self) -> &ChipGeometry;

    /// Whether `block` is bad, scanning it if the table has no answer
    fn is_bad(&mut self, block: u32) -> Result<bool>;

    /// Mark `block` bad in the table and on flash
    fn mark_bad(&mut self, block: u32) -> Result<()>;

    /// Erase `block`
    fn erase_block(&mut self, block: u32, ctx: ExecContext) -> Result<()>;

    /// Program one page
    fn write_page(&mut self, req: &WriteRequest<'_>) -> Result<()>;

    /// Read one page
    ///
    /// ECC results are values: an uncorrectable page still returns `Ok`.
    fn read_page(&mut self, req: &mut ReadRequest<'_>) -> Result<EccStatus>;

    /// Copy every page, data and OOB, of `from` into `to`
    ///
    /// `to` is erased first. The copy stops at the first error; an
    /// uncorrectable source page is [`Error::EccUncorrectable`].
    fn copy_block(&mut self, from: u32, to: u32) -> Result<()> {
        let geometry = *self.geometry();
        if from >= geometry.total_blocks() || to >= geometry.total_blocks() {
            return Err(Error::OutOfRange);
        }
        if from == to {
            return Err(Error::InvalidArgument);
        }

        let page_size = geometry.page_size() as usize;
        let mut scratch = vec![0u8; page_size + geometry.oob_size() as usize];

        self.erase_block(to, ExecContext::Normal)?;

        for page in 0..geometry.pages_per_block() {
            let (data, oob) = scratch.split_at_mut(page_size);
            let mut read = ReadRequest::new(from, page, 0, data, oob);
            if self.read_page(&mut read)? == EccStatus::Error {
                log::error!("copy of block {} stopped at page {}: uncorrectable", from, page);
                return Err(Error::EccUncorrectable {
                    row: geometry.row(from, page),
                });
            }

            let (data, oob) = scratch.split_at(page_size);
            self.write_page(&WriteRequest::new(to, page, 0, data, oob))?;
        }

        log::debug!("copied block {} to block {}", from, to);
        Ok(())
    }
}
