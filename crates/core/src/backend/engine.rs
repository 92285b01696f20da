//! Lazily loaded, shared backend engine.
//!
//! Some backends need an expensive runtime (a probed binary, a loaded codec
//! library) before they can convert anything. [`SharedEngine`] owns that
//! runtime with an explicit lifecycle:
//!
//! ```text
//! Uninitialized --get()--> Loading --ok--> Ready --teardown()--> Uninitialized
//!                              \--err--> Uninitialized
//! ```
//!
//! Concurrent callers of [`SharedEngine::get`] while a load is in flight all
//! await the same load.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from loading an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Engine failed to load: {reason}")]
    LoadFailed { reason: String },

    #[error("Engine was torn down while loading")]
    TornDown,
}

impl EngineError {
    pub fn load_failed(reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            reason: reason.into(),
        }
    }
}

/// Loads an engine instance.
#[async_trait]
pub trait EngineLoader: Send + Sync + 'static {
    type Engine: Send + Sync + 'static;

    /// Name used in logs.
    fn name(&self) -> &str;

    async fn load(&self) -> Result<Self::Engine, EngineError>;
}

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Uninitialized,
    Loading,
    Ready,
}

type LoadFuture<E> = Shared<BoxFuture<'static, Result<Arc<E>, EngineError>>>;

enum EngineState<E> {
    Uninitialized,
    Loading(LoadFuture<E>),
    Ready(Arc<E>),
}

/// Lazily loaded engine shared by every conversion that needs it.
pub struct SharedEngine<L: EngineLoader> {
    loader: Arc<L>,
    state: Mutex<EngineState<L::Engine>>,
}

impl<L: EngineLoader> SharedEngine<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            state: Mutex::new(EngineState::Uninitialized),
        }
    }

    /// Current state.
    pub fn status(&self) -> EngineStatus {
        match &*self.state.lock() {
            EngineState::Uninitialized => EngineStatus::Uninitialized,
            EngineState::Loading(_) => EngineStatus::Loading,
            EngineState::Ready(_) => EngineStatus::Ready,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status() == EngineStatus::Loading
    }

    /// Returns the engine, loading it first if needed.
    ///
    /// A failed load leaves the engine uninitialized so the next call retries.
    pub async fn get(&self) -> Result<Arc<L::Engine>, EngineError> {
        let load = {
            let mut state = self.state.lock();
            match &*state {
                EngineState::Ready(engine) => return Ok(Arc::clone(engine)),
                EngineState::Loading(load) => {
                    debug!(engine = self.loader.name(), "Waiting for in-flight engine load");
                    load.clone()
                }
                EngineState::Uninitialized => {
                    info!(engine = self.loader.name(), "Loading engine");
                    let loader = Arc::clone(&self.loader);
                    let load = async move { loader.load().await.map(Arc::new) }
                        .boxed()
                        .shared();
                    *state = EngineState::Loading(load.clone());
                    load
                }
            }
        };

        let result = load.clone().await;

        let mut state = self.state.lock();
        match &*state {
            // Only the load we awaited may move the state forward
            EngineState::Loading(current) if current.ptr_eq(&load) => match &result {
                Ok(engine) => {
                    info!(engine = self.loader.name(), "Engine ready");
                    *state = EngineState::Ready(Arc::clone(engine));
                }
                Err(e) => {
                    warn!(engine = self.loader.name(), "Engine load failed: {}", e);
                    *state = EngineState::Uninitialized;
                }
            },
            EngineState::Uninitialized if result.is_ok() => {
                // Torn down while we were waiting
                return Err(EngineError::TornDown);
            }
            _ => {}
        }

        result
    }

    /// Drops the loaded engine (or abandons an in-flight load).
    ///
    /// Returns whether there was anything to tear down.
    pub fn teardown(&self) -> bool {
        let mut state = self.state.lock();
        let had_engine = !matches!(&*state, EngineState::Uninitialized);
        *state = EngineState::Uninitialized;
        if had_engine {
            info!(engine = self.loader.name(), "Engine torn down");
        }
        had_engine
    }
}
