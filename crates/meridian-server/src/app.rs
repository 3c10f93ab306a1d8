//! The application root.

use std::sync::Arc;

use meridian_config::MeridianConfig;
use meridian_core::{
    BoxFuture, Context, DispatchError, DispatchResult, ErrorKind, KindRegistry, Reply, SetupError,
    DEFAULT_PRESENTATION_MODE,
};
use meridian_middleware::{ErrorHandler, Service};
use meridian_router::{Route, Router};

use crate::dispatcher::Dispatcher;

/// Setup-time builder for a whole application.
///
/// Owns the root [`Router`], the application's error kinds and the default
/// presentation mode. [`App::build`] validates everything and freezes it
/// into a [`Dispatcher`].
///
/// # Example
///
/// ```
/// use meridian_core::{handler_fn, Reply};
/// use meridian_router::Route;
/// use meridian_server::App;
/// use serde_json::json;
///
/// let dispatcher = App::new()
///     .route(Route::get(
///         "/ping",
///         handler_fn(&[], |_ctx, _args| Box::pin(async { Ok(Reply::Json(json!("pong"))) })),
///     ))
///     .build()
///     .unwrap();
///
/// assert_eq!(dispatcher.tree().len(), 1);
/// ```
#[derive(Debug)]
pub struct App {
    root: Router,
    kinds: Vec<(ErrorKind, ErrorKind)>,
    presentation_mode: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            root: Router::named("root"),
            kinds: Vec::new(),
            presentation_mode: DEFAULT_PRESENTATION_MODE.to_string(),
        }
    }
}

impl App {
    /// Creates an empty application.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an application using the dispatch settings of `config`.
    #[must_use]
    pub fn from_config(config: &MeridianConfig) -> Self {
        Self::new().presentation_mode(config.dispatch.presentation_mode.clone())
    }

    /// Replaces the root router.
    #[must_use]
    pub fn with_root(mut self, root: Router) -> Self {
        self.root = root;
        self
    }

    /// Adds a route to the root router.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.root.add_route(route);
        self
    }

    /// Attaches a child router to the root.
    #[must_use]
    pub fn nest(mut self, child: Router) -> Self {
        self.root.add_child(child);
        self
    }

    /// Adds a service inherited by every route.
    #[must_use]
    pub fn service(mut self, service: impl Into<Arc<Service>>) -> Self {
        self.root.register_service(service);
        self
    }

    /// Adds an error handler inherited by every route.
    #[must_use]
    pub fn error_handler(mut self, handler: impl Into<Arc<ErrorHandler>>) -> Self {
        self.root.register_error_handler(handler);
        self
    }

    /// Adds an error handler built from a closure.
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

    /// Declares an application error kind under `parent`.
    ///
    /// Registration is checked by [`App::build`].
    #[must_use]
    pub fn register_kind(mut self, kind: ErrorKind, parent: ErrorKind) -> Self {
        self.kinds.push((kind, parent));
        self
    }

    /// Sets the presentation mode used when neither the route nor the
    /// request selects one.
    #[must_use]
    pub fn presentation_mode(mut self, mode: impl Into<String>) -> Self {
        self.presentation_mode = mode.into();
        self
    }

    /// Returns the root router.
    pub fn root(&self) -> &Router {
        &self.root
    }

    /// Validates the application and freezes it.
    ///
    /// # Errors
    ///
    /// Returns the first [`SetupError`]: an invalid or duplicate route, a
    /// path parameter the handler does not declare, a fetch rule for a
    /// non-path parameter, or a kind registered twice or under an unknown
    /// parent.
    pub fn build(self) -> Result<Dispatcher, SetupError> {
        let mut kinds = KindRegistry::new();
        for (kind, parent) in self.kinds {
            kinds.register(kind, parent)?;
        }
        let tree = self.root.freeze()?;
        tracing::debug!(
            routers = tree.len(),
            routes = tree.routes().len(),
            presentation_mode = %self.presentation_mode,
            "application built"
        );
        Dispatcher::new(tree, kinds, self.presentation_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::handler_fn;

    fn ok_route(path: &str) -> Route {
        Route::get(
            path,
            handler_fn(&["id"], |_ctx, _args| Box::pin(async { Ok(Reply::Empty) })),
        )
    }

    #[test]
    fn test_build_counts_nested_routes() {
        let dispatcher = App::new()
            .route(ok_route("/a/{id}"))
            .nest(
                Router::named("child")
                    .route(ok_route("/b/{id}"))
                    .route(ok_route("/c/{id}")),
            )
            .build()
            .unwrap();
        assert_eq!(dispatcher.tree().routes().len(), 3);
        assert_eq!(dispatcher.tree().len(), 2);
        assert_eq!(dispatcher.default_mode(), "public");
    }

    #[test]
    fn test_from_config_sets_mode() {
        let config = MeridianConfig::builder().presentation_mode("internal").build();
        let dispatcher = App::from_config(&config).build().unwrap();
        assert_eq!(dispatcher.default_mode(), "internal");
    }

    #[test]
    fn test_duplicate_route_is_fatal() {
        let result = App::new()
            .route(ok_route("/a/{id}"))
            .nest(Router::new().route(ok_route("/a/{id}")))
            .build();
        assert!(matches!(result, Err(SetupError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_kind_under_unknown_parent_is_fatal() {
        let result = App::new()
            .register_kind(ErrorKind::new("billing"), ErrorKind::new("payments"))
            .build();
        assert!(matches!(result, Err(SetupError::UnknownKind(_))));
    }

    #[test]
    fn test_registered_kind_is_known() {
        let dispatcher = App::new()
            .register_kind(ErrorKind::new("payments"), ErrorKind::ERROR)
            .register_kind(ErrorKind::new("billing"), ErrorKind::new("payments"))
            .build()
            .unwrap();
        assert!(dispatcher
            .kinds()
            .is_a(&ErrorKind::new("billing"), &ErrorKind::ERROR));
    }
}
