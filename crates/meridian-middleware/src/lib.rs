//! # Meridian Middleware
//!
//! Services and error handlers for the Meridian dispatch layer.
//!
//! ## Services
//!
//! A [`Service`] is a named unit with an optional before hook and an optional
//! after hook. For one request, the effective services of a route run in
//! order:
//!
//! ```text
//! before(s1) → before(s2) → … → handler → after(s1) → after(s2) → …
//! ```
//!
//! A before hook may mutate the context (state, injected arguments,
//! presentation mode) and aborts processing only by failing. An after hook
//! receives the current reply and may replace it by returning `Some`; later
//! hooks observe earlier replacements.
//!
//! ## Error handlers
//!
//! An [`ErrorHandler`] is registered for an [`ErrorKind`](meridian_core::ErrorKind).
//! [`select_handler`] scans handlers in registration order and picks the
//! first whose kind is the raised kind or one of its ancestors. Selection is
//! first-match: a general handler registered before a specific one wins.

#![doc(html_root_url = "https://docs.rs/meridian-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
mod error_handler;
mod service;

pub use chain::{run_after_hooks, run_before_hooks};
pub use error_handler::{select_handler, ErrorHandler};
pub use service::{AfterHook, BeforeHook, Service};
