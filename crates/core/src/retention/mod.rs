//! Retention of completed jobs.
//!
//! [`RetentionSweeper`] periodically removes completed jobs older than the
//! window held by [`RetentionControl`].

mod settings;
mod sweeper;

pub use settings::{RetentionControl, RetentionSettings, SettingsError};
pub use sweeper::RetentionSweeper;
