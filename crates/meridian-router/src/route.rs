//! Routes: one handler bound to one method and path template.

use std::fmt;
use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use meridian_core::{Handler, RouteInfo, SetupError};
use meridian_middleware::{ErrorHandler, Service};

use crate::fetch::FetchDescriptor;
use crate::plan::ArgumentPlan;
use crate::template::PathTemplate;
use crate::tree::{RouteId, RouterId};

/// A route under construction.
///
/// # Example
///
/// ```
/// use meridian_core::{handler_fn, Reply};
/// use meridian_router::{FetchDescriptor, Route};
/// use meridian_store::MemoryStore;
/// use serde_json::Value;
///
/// let users = MemoryStore::new().database("app").create_table::<Value>("users", "id");
///
/// let route = Route::get(
///     "/users/{id}",
///     handler_fn(&["id"], |_ctx, mut args| {
///         Box::pin(async move { Ok(Reply::Json(args.take::<Value>("id")?)) })
///     }),
/// )
/// .named("get_user")
/// .fetch("id", FetchDescriptor::one(&users));
///
/// assert_eq!(route.name(), "get_user");
/// ```
pub struct Route {
    method: Method,
    template: String,
    name: Option<String>,
    handler: Arc<dyn Handler>,
    services: Vec<Arc<Service>>,
    fetch: IndexMap<String, FetchDescriptor>,
    presentation_mode: Option<String>,
}

impl Route {
    /// Creates a route for `method` and `template`.
    pub fn new(method: Method, template: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            method,
            template: template.into(),
            name: None,
            handler: Arc::new(handler),
            services: Vec::new(),
            fetch: IndexMap::new(),
            presentation_mode: None,
        }
    }

    /// Creates a `GET` route.
    pub fn get(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::GET, template, handler)
    }

    /// Creates a `POST` route.
    pub fn post(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::POST, template, handler)
    }

    /// Creates a `PUT` route.
    pub fn put(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PUT, template, handler)
    }

    /// Creates a `PATCH` route.
    pub fn patch(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PATCH, template, handler)
    }

    /// Creates a `DELETE` route.
    pub fn delete(template: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::DELETE, template, handler)
    }

    /// Names the route for logging.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a route-local service; route services run before inherited ones.
    #[must_use]
    pub fn service(mut self, service: impl Into<Arc<Service>>) -> Self {
        self.services.push(service.into());
        self
    }

    /// Resolves path parameter `param` through `descriptor`.
    #[must_use]
    pub fn fetch(mut self, param: impl Into<String>, descriptor: FetchDescriptor) -> Self {
        self.fetch.insert(param.into(), descriptor);
        self
    }

    /// Overrides the presentation mode for this route.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.presentation_mode = Some(mode.into());
        self
    }

    /// Returns the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template as written on the route.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the route name, falling back to `"METHOD template"`.
    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.template))
    }

    /// Validates the route and compiles it under `prefix`.
    pub(crate) fn compile(
        self,
        id: RouteId,
        router: RouterId,
        prefix: &str,
        inherited_services: &[Arc<Service>],
        error_handlers: Vec<Arc<ErrorHandler>>,
    ) -> Result<CompiledRoute, SetupError> {
        let name = self.name();
        let full = join_paths(prefix, &self.template);
        let template = PathTemplate::parse(&name, &full)?;
        let plan = ArgumentPlan::build(&name, &template, self.handler.params(), &self.fetch)?;

        let mut info = RouteInfo::new(self.method, full);
        if let Some(route_name) = self.name {
            info = info.with_name(route_name);
        }
        if let Some(mode) = self.presentation_mode {
            info = info.with_presentation_mode(mode);
        }

        let mut services = self.services;
        services.extend(inherited_services.iter().cloned());

        Ok(CompiledRoute {
            id,
            router,
            info: Arc::new(info),
            template,
            handler: self.handler,
            plan,
            services,
            error_handlers,
        })
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("name", &self.name)
            .field("services", &self.services)
            .field("fetch", &self.fetch)
            .field("presentation_mode", &self.presentation_mode)
            .finish_non_exhaustive()
    }
}

/// Joins a router prefix and a route template.
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    match (prefix.is_empty(), path) {
        (true, _) => path.to_string(),
        (false, "" | "/") => prefix.to_string(),
        (false, _) if path.starts_with('/') => format!("{prefix}{path}"),
        (false, _) => format!("{prefix}/{path}"),
    }
}

/// A validated route inside a frozen router tree.
///
/// Its service and error-handler lists are the effective ones: route-local
/// services, then its router's, then each ancestor's.
pub struct CompiledRoute {
    id: RouteId,
    router: RouterId,
    info: Arc<RouteInfo>,
    template: PathTemplate,
    handler: Arc<dyn Handler>,
    plan: ArgumentPlan,
    services: Vec<Arc<Service>>,
    error_handlers: Vec<Arc<ErrorHandler>>,
}

impl CompiledRoute {
    /// Returns the route id.
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Returns the owning router.
    pub fn router(&self) -> RouterId {
        self.router
    }

    /// Returns the static route information shared with each [`Context`].
    ///
    /// [`Context`]: meridian_core::Context
    pub fn info(&self) -> &Arc<RouteInfo> {
        &self.info
    }

    /// Returns the method.
    pub fn method(&self) -> &Method {
        self.info.method()
    }

    /// Returns the full path template.
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Returns the route name.
    pub fn name(&self) -> String {
        self.info.name()
    }

    /// Returns the handler.
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Returns the argument plan.
    pub fn plan(&self) -> &ArgumentPlan {
        &self.plan
    }

    /// Returns the effective services in execution order.
    pub fn services(&self) -> &[Arc<Service>] {
        &self.services
    }

    /// Returns the effective error handlers in matching order.
    pub fn error_handlers(&self) -> &[Arc<ErrorHandler>] {
        &self.error_handlers
    }
}

impl fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("id", &self.id)
            .field("router", &self.router)
            .field("info", &self.info)
            .field("plan", &self.plan)
            .field("services", &self.services)
            .field("error_handlers", &self.error_handlers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("", "/users"), "/users");
        assert_eq!(join_paths("/api", "/users"), "/api/users");
        assert_eq!(join_paths("/api/", "users"), "/api/users");
        assert_eq!(join_paths("/api", "/"), "/api");
        assert_eq!(join_paths("/api", ""), "/api");
    }
}
