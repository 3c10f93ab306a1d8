//! # Meridian Core
//!
//! Core types for the Meridian dispatch layer:
//!
//! - [`Context`] - Per-request state threaded through hooks and handlers
//! - [`Handler`] - A handler with declared parameter names
//! - [`Arguments`] - The named argument pool handed to handlers
//! - [`Reply`] / [`encode`] - Handler return values and their encoding
//! - [`PaginationInfo`] - Per-list page selection parsed from the query string
//! - [`ApiError`] / [`DispatchError`] / [`SetupError`] - Error types
//! - [`ErrorKind`] / [`KindRegistry`] - Error classification for handler matching

#![doc(html_root_url = "https://docs.rs/meridian-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod arguments;
mod context;
pub mod encode;
mod error;
mod handler;
pub mod kind;
pub mod pagination;
mod reply;

pub use arguments::{ArgValue, Arguments};
pub use context::{Context, DispatchRequest, RequestId, RouteInfo};
pub use encode::{encode, Encoded, DEFAULT_PRESENTATION_MODE};
pub use error::{
    ApiError, DispatchError, DispatchResult, SetupError, INTERNAL_ERROR, OBJECT_NOT_FOUND,
};
pub use handler::{handler_fn, BoxFuture, FnHandler, Handler};
pub use kind::{ErrorKind, KindRegistry};
pub use pagination::{PaginableListInfo, PaginationInfo};
pub use reply::{ApiObject, Page, RawResponse, Reply, JSON_MEDIA_TYPE};
