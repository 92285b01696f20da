//! HTTP and WebSocket surface for the FileForge conversion engine.

pub mod api;
pub mod metrics;
pub mod state;

pub use api::{create_router, WsBroadcaster};
pub use state::AppState;
