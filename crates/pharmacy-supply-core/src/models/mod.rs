//! Domain models for pharmacy supply analysis.

mod entry;
mod replenishment;
mod supply;

pub use entry::*;
pub use replenishment::*;
pub use supply::*;
