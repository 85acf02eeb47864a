//! CLI command implementations
//!
//! Every command runs against an attached [`Device`](crate::device::Device)
//! and reports through stdout; failures bubble up as boxed errors.

mod block;
mod info;
mod list;
mod locate;
mod page;
mod scan;

pub use block::{run_copy, run_erase, run_mark_bad};
pub use info::print_info;
pub use list::list_chips;
pub use locate::run_locate;
pub use page::{run_read, run_write};
pub use scan::run_scan;
