//! The router tree under construction.

use std::sync::Arc;

use meridian_core::{BoxFuture, Context, DispatchError, DispatchResult, ErrorKind, Reply, SetupError};
use meridian_middleware::{ErrorHandler, Service};

use crate::route::Route;
use crate::tree::RouterTree;

/// A router: routes, child routers, services and error handlers.
///
/// Routers are assembled bottom-up and frozen into a [`RouterTree`]. Each
/// router's effective services and error handlers are its own followed by
/// its parent's effective ones.
///
/// # Example
///
/// ```
/// use meridian_core::{handler_fn, ErrorKind, Reply};
/// use meridian_middleware::Service;
/// use meridian_router::{Route, Router};
/// use serde_json::json;
///
/// let ping = handler_fn(&[], |_ctx, _args| Box::pin(async { Ok(Reply::Json(json!("pong"))) }));
///
/// let api = Router::named("api")
///     .prefix("/api")
///     .service(Service::new("audit"))
///     .route(Route::get("/ping", ping));
///
/// let tree = Router::new()
///     .on_error(ErrorKind::API, |err, _ctx| Box::pin(async move { Err(err) }))
///     .nest(api)
///     .freeze()
///     .unwrap();
///
/// assert_eq!(tree.routes()[0].template().as_str(), "/api/ping");
/// ```
#[derive(Debug, Default)]
pub struct Router {
    pub(crate) name: Option<String>,
    pub(crate) prefix: String,
    pub(crate) routes: Vec<Route>,
    pub(crate) children: Vec<Router>,
    pub(crate) services: Vec<Arc<Service>>,
    pub(crate) error_handlers: Vec<Arc<ErrorHandler>>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty named router.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the path prefix applied to this router's routes and children.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Adds a route.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.add_route(route);
        self
    }

    /// Adds a child router.
    #[must_use]
    pub fn nest(mut self, child: Router) -> Self {
        self.add_child(child);
        self
    }

    /// Appends a service.
    #[must_use]
    pub fn service(mut self, service: impl Into<Arc<Service>>) -> Self {
        self.register_service(service);
        self
    }

    /// Appends an error handler.
    #[must_use]
    pub fn error_handler(mut self, handler: impl Into<Arc<ErrorHandler>>) -> Self {
        self.register_error_handler(handler);
        self
    }

    /// Appends an error handler for `kind` built from a closure.
    #[must_use]
    pub fn on_error<F>(self, kind: ErrorKind, handler: F) -> Self
    where
        F: for<'a> Fn(DispatchError, &'a mut Context) -> BoxFuture<'a, DispatchResult<Reply>>
            + Send
            + Sync
            + 'static,
    {
        self.error_handler(ErrorHandler::new(kind, handler))
    }

    /// Adds a route.
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Adds a child router.
    pub fn add_child(&mut self, child: Router) {
        self.children.push(child);
    }

    /// Appends a service.
    pub fn register_service(&mut self, service: impl Into<Arc<Service>>) {
        self.services.push(service.into());
    }

    /// Appends an error handler.
    pub fn register_error_handler(&mut self, handler: impl Into<Arc<ErrorHandler>>) {
        self.error_handlers.push(handler.into());
    }

    /// Returns the router name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the routes registered directly on this router.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the child routers.
    pub fn children(&self) -> &[Router] {
        &self.children
    }

    /// Returns this router's own services.
    pub fn services(&self) -> &[Arc<Service>] {
        &self.services
    }

    /// Returns this router's own error handlers.
    pub fn error_handlers(&self) -> &[Arc<ErrorHandler>] {
        &self.error_handlers
    }

    /// Validates every route and freezes the tree with this router as root.
    ///
    /// # Errors
    ///
    /// Returns the first [`SetupError`] found: an invalid template, a path
    /// parameter missing from its handler's parameters, a fetch rule on a
    /// non-path parameter, or a duplicate method and template.
    pub fn freeze(self) -> Result<RouterTree, SetupError> {
        RouterTree::build(self)
    }
}
