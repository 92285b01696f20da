use std::sync::Arc;

use fileforge_core::{
    BatchOrchestrator, Config, FormatRegistry, HistorySink, JobStore, RetentionControl,
};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<BatchOrchestrator>,
    retention: RetentionControl,
    history: Arc<dyn HistorySink>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<BatchOrchestrator>,
        retention: RetentionControl,
        history: Arc<dyn HistorySink>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            orchestrator,
            retention,
            history,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<BatchOrchestrator> {
        &self.orchestrator
    }

    pub fn store(&self) -> &JobStore {
        self.orchestrator.store()
    }

    pub fn registry(&self) -> &FormatRegistry {
        self.orchestrator.router().registry()
    }

    pub fn retention(&self) -> &RetentionControl {
        &self.retention
    }

    pub fn history(&self) -> &dyn HistorySink {
        self.history.as_ref()
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
