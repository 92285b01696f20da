//! Conversion router.
//!
//! Resolves an `(input, output)` pair to a [`ConversionRoute`] with an
//! exhaustive match over the input's [`FormatCategory`](crate::format::FormatCategory),
//! hands the request to the backend installed for that route's family, and
//! normalizes what comes back.

mod dispatch;
mod error;
mod route;

pub use dispatch::ConversionRouter;
pub use error::ConversionError;
pub use route::ConversionRoute;
