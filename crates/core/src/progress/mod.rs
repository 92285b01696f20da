//! Per-job progress channels.
//!
//! A backend gets a [`ProgressSink`]; the orchestrator drains the other end
//! through a [`ProgressReporter`] that maps raw backend percentages into the
//! job's progress bands and writes them to the store.

mod reporter;
mod sink;

pub use reporter::{ProgressBands, ProgressReporter};
pub use sink::{progress_channel, ProgressSink};
