//! Named before/after hook pairs.

use std::fmt;
use std::sync::Arc;

use meridian_core::{BoxFuture, Context, DispatchResult, Reply};

/// A before hook.
pub type BeforeHook =
    Arc<dyn for<'a> Fn(&'a mut Context) -> BoxFuture<'a, DispatchResult<()>> + Send + Sync>;

/// An after hook; returning `Some` replaces the reply.
pub type AfterHook = Arc<
    dyn for<'a> Fn(&'a mut Context, &'a Reply) -> BoxFuture<'a, DispatchResult<Option<Reply>>>
        + Send
        + Sync,
>;

/// A named middleware unit.
///
/// Services are immutable once built and are shared between routes and
/// routers through `Arc`.
///
/// # Example
///
/// ```
/// use meridian_middleware::Service;
/// use serde_json::json;
///
/// let auth = Service::new("auth").before(|ctx| {
///     Box::pin(async move {
///         let ok = ctx.header("x-token") == Some("secret");
///         ctx.set_state("flag", json!(ok));
///         Ok(())
///     })
/// });
/// assert!(auth.has_before());
/// assert!(!auth.has_after());
/// ```
#[derive(Clone)]
pub struct Service {
    name: String,
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
}

impl Service {
    /// Creates a service with no hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before: None,
            after: None,
        }
    }

    /// Sets the before hook.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, DispatchResult<()>> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Sets the after hook.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut Context, &'a Reply) -> BoxFuture<'a, DispatchResult<Option<Reply>>>
            + Send
            + Sync
            + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }

    /// Returns the service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if a before hook is set.
    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    /// Returns `true` if an after hook is set.
    pub fn has_after(&self) -> bool {
        self.after.is_some()
    }

    /// Runs the before hook, if any.
    pub async fn run_before(&self, ctx: &mut Context) -> DispatchResult<()> {
        match &self.before {
            Some(hook) => hook(ctx).await,
            None => Ok(()),
        }
    }

    /// Runs the after hook, if any.
    pub async fn run_after(&self, ctx: &mut Context, reply: &Reply) -> DispatchResult<Option<Reply>> {
        match &self.after {
            Some(hook) => hook(ctx, reply).await,
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("before", &self.has_before())
            .field("after", &self.has_after())
            .finish()
    }
}
