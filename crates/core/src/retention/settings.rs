//! Runtime-adjustable retention settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Longer windows are treated as this (roughly a thousand years).
const MAX_WINDOW_MINUTES: u64 = 525_600_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Retention window must be at least one minute")]
    ZeroWindow,
}

/// Retention policy for completed jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionSettings {
    pub enabled: bool,
    /// How long a completed job stays visible.
    pub window_minutes: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_minutes: 5,
        }
    }
}

impl RetentionSettings {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.window_minutes.min(MAX_WINDOW_MINUTES) as i64)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.window_minutes == 0 {
            return Err(SettingsError::ZeroWindow);
        }
        Ok(())
    }
}

/// Shared handle to the current [`RetentionSettings`].
///
/// Changes take effect on the sweeper's next tick. Cloning yields another
/// handle to the same settings.
#[derive(Debug, Clone)]
pub struct RetentionControl {
    tx: std::sync::Arc<watch::Sender<RetentionSettings>>,
}

impl RetentionControl {
    pub fn new(settings: RetentionSettings) -> Self {
        let (tx, _) = watch::channel(settings);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    pub fn get(&self) -> RetentionSettings {
        *self.tx.borrow()
    }

    /// Receives every settings change.
    pub fn subscribe(&self) -> watch::Receiver<RetentionSettings> {
        self.tx.subscribe()
    }

    pub fn set(&self, settings: RetentionSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.tx.send_replace(settings);
        tracing::info!(
            enabled = settings.enabled,
            window_minutes = settings.window_minutes,
            "Retention settings updated"
        );
        Ok(())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.tx.send_modify(|s| s.enabled = enabled);
    }

    pub fn set_window_minutes(&self, window_minutes: u64) -> Result<(), SettingsError> {
        self.set(RetentionSettings {
            window_minutes,
            ..self.get()
        })
    }
}
