//! Conversion history.
//!
//! Terminal job transitions are recorded fire-and-forget: the orchestrator
//! emits through a [`HistoryHandle`], and a [`HistoryWriter`] task drains the
//! channel into a [`HistorySink`].

mod handle;
mod record;
mod store;
mod writer;

pub use handle::*;
pub use record::*;
pub use store::*;
pub use writer::*;
