//! Handler trait and closure adapter.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::arguments::Arguments;
use crate::context::Context;
use crate::error::DispatchResult;
use crate::reply::Reply;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A request handler.
///
/// A handler declares the names of the parameters it accepts. The dispatcher
/// validates route path parameters against them at registration time and
/// passes only declared names at call time. The request [`Context`] is always
/// passed alongside the arguments.
pub trait Handler: Send + Sync + 'static {
    /// Returns the declared parameter names.
    fn params(&self) -> &[String];

    /// Invokes the handler.
    fn call<'a>(&'a self, ctx: &'a mut Context, args: Arguments) -> BoxFuture<'a, DispatchResult<Reply>>;
}

/// A [`Handler`] built from a closure.
pub struct FnHandler<F> {
    params: Vec<String>,
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Arguments) -> BoxFuture<'a, DispatchResult<Reply>>
        + Send
        + Sync
        + 'static,
{
    fn params(&self) -> &[String] {
        &self.params
    }

    fn call<'a>(&'a self, ctx: &'a mut Context, args: Arguments) -> BoxFuture<'a, DispatchResult<Reply>> {
        (self.f)(ctx, args)
    }
}

/// Builds a handler from its parameter names and a closure.
///
/// # Example
///
/// ```
/// use meridian_core::{handler_fn, Reply};
/// use serde_json::json;
///
/// let greet = handler_fn(&["name"], |_ctx, mut args| {
///     Box::pin(async move {
///         let name: String = args.take("name")?;
///         Ok(Reply::Json(json!({ "hello": name })))
///     })
/// });
/// ```
pub fn handler_fn<F>(params: &[&str], f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Arguments) -> BoxFuture<'a, DispatchResult<Reply>>
        + Send
        + Sync
        + 'static,
{
    FnHandler {
        params: params.iter().map(|p| (*p).to_string()).collect(),
        f,
    }
}
