//! Conversion jobs and their lifecycle.
//!
//! The [`JobStore`] owns every job and is the only place jobs change.
//! Transitions follow `queued -> processing -> {completed, failed}` (plus
//! `queued -> failed` when dispatch fails up front); terminal jobs can only
//! be removed.

mod error;
mod estimate;
mod store;
mod types;

pub use error::JobError;
pub use estimate::{initial_estimate_ms, remaining_ms};
pub use store::{JobSnapshot, JobStore};
pub use types::{ConversionJob, JobEvent, JobId, JobStatus, JobSummary};
