pub mod convert;
pub mod error;
pub mod formats;
pub mod handlers;
pub mod history;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod settings;
pub mod ws;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};
