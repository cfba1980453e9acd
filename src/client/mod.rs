//! HTTP access to the review backend
//!
//! All calls go through a [`Dispatcher`], which owns the response cache and
//! the in-flight request registry for one application instance.

mod dispatcher;
mod error;
mod inflight;
mod request;

pub use dispatcher::Dispatcher;
pub use error::ApiError;
pub use request::RequestOptions;
