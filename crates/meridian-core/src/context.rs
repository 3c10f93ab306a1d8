//! Per-request context.
//!
//! A [`Context`] is created for every dispatched request and threaded
//! through before hooks, the handler, after hooks and error handlers. It is
//! never shared across requests.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::arguments::Arguments;
use crate::error::{ApiError, DispatchError};
use crate::pagination::{self, PaginationInfo};
use crate::reply::Reply;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines of one request easy to
/// correlate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The inbound request as seen by the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: IndexMap<String, String>,
}

impl DispatchRequest {
    /// Creates a request with no headers, body or path parameters.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            path_params: IndexMap::new(),
        }
    }

    /// Sets the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a path parameter captured by the transport.
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Sets all captured path parameters.
    pub fn with_path_params(mut self, params: IndexMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    /// Returns the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string.
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Deserializes the query string.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_urlencoded::from_str(self.query_string().unwrap_or_default())
            .map_err(|err| ApiError::bad_request("query.invalid", err.to_string()))
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserializes a JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|err| ApiError::bad_request("body.invalid", err.to_string()))
    }

    /// Returns a captured path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Returns every captured path parameter.
    pub fn path_params(&self) -> &IndexMap<String, String> {
        &self.path_params
    }
}

/// Static information about the route serving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    method: Method,
    template: String,
    name: Option<String>,
    presentation_mode: Option<String>,
}

impl RouteInfo {
    /// Creates route information.
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            name: None,
            presentation_mode: None,
        }
    }

    /// Sets the route name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the presentation mode for this route.
    pub fn with_presentation_mode(mut self, mode: impl Into<String>) -> Self {
        self.presentation_mode = Some(mode.into());
        self
    }

    /// Returns the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the route name, falling back to `"METHOD template"`.
    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.template))
    }

    /// Returns the route's presentation mode override.
    pub fn presentation_mode(&self) -> Option<&str> {
        self.presentation_mode.as_deref()
    }
}

/// Per-request state.
///
/// Injected arguments live here only until the handler is called: the
/// dispatch pipeline moves them into the handler's argument pool, so after
/// hooks and error handlers see an empty [`Context::injected`]. State in
/// [`Context::state`] stays for the whole request.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use http::Method;
/// use meridian_core::{Context, DispatchRequest, RouteInfo};
///
/// let request = DispatchRequest::new(Method::GET, "/posts?page@=2".parse().unwrap());
/// let mut ctx = Context::new(Arc::new(request), Arc::new(RouteInfo::new(Method::GET, "/posts")));
///
/// assert_eq!(ctx.pagination().unwrap().list(None).page, 2);
/// ctx.set_state("user", serde_json::json!("ada"));
/// ctx.inject_arg("limit", 10_u32);
/// ```
pub struct Context {
    request: Arc<DispatchRequest>,
    route: Arc<RouteInfo>,
    request_id: RequestId,
    injected: Arguments,
    state: IndexMap<String, Value>,
    pagination: Option<PaginationInfo>,
    presentation_mode: Option<String>,
}

impl Context {
    /// Creates the context of a request served by `route`.
    pub fn new(request: Arc<DispatchRequest>, route: Arc<RouteInfo>) -> Self {
        Self {
            request,
            route,
            request_id: RequestId::new(),
            injected: Arguments::new(),
            state: IndexMap::new(),
            pagination: None,
            presentation_mode: None,
        }
    }

    /// Returns the request.
    pub fn request(&self) -> &DispatchRequest {
        &self.request
    }

    /// Returns a shared handle to the request.
    pub fn request_handle(&self) -> Arc<DispatchRequest> {
        Arc::clone(&self.request)
    }

    /// Returns the route serving the request.
    pub fn route(&self) -> &RouteInfo {
        &self.route
    }

    /// Returns the request id.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// Returns a captured path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.request.path_param(name)
    }

    /// Makes a value available to the handler under `name`.
    ///
    /// Injected values override resolved path arguments of the same name and
    /// are only delivered if the handler declares the name. They are consumed
    /// by the handler call; use [`Context::set_state`] for values later hooks
    /// need to read.
    pub fn inject_arg<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.injected.insert(name, value);
    }

    /// Returns the injected arguments not yet handed to the handler.
    pub fn injected(&self) -> &Arguments {
        &self.injected
    }

    /// Moves the injected arguments out of the context, leaving it empty.
    pub fn take_injected(&mut self) -> Arguments {
        std::mem::take(&mut self.injected)
    }

    /// Returns the free-form state map.
    pub fn state(&self) -> &IndexMap<String, Value> {
        &self.state
    }

    /// Returns the free-form state map for mutation.
    pub fn state_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.state
    }

    /// Sets a state entry.
    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    /// Returns a state entry.
    pub fn state_value(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Returns the pagination selection, parsing the query string on first use.
    ///
    /// Later calls reuse the parsed selection; lists first accessed after
    /// parsing get default settings.
    pub fn pagination(&mut self) -> Result<&mut PaginationInfo, ApiError> {
        if self.pagination.is_none() {
            let parsed = PaginationInfo::from_query(self.request.query_string().unwrap_or_default())?;
            self.pagination = Some(parsed);
        }
        Ok(self.pagination.get_or_insert_with(PaginationInfo::new))
    }

    /// Paginates `items` according to the selection of list `listname`.
    pub fn paginate<R: Into<Reply>>(
        &mut self,
        items: impl IntoIterator<Item = R>,
        listname: Option<&str>,
        has_next_page: Option<bool>,
    ) -> Result<Reply, ApiError> {
        let info = *self.pagination()?.list(listname);
        let items = items.into_iter().map(Into::into).collect();
        Ok(Reply::Page(pagination::paginate(items, info, has_next_page)))
    }

    /// Wraps items that already form one page of list `listname`.
    pub fn as_paginable<R: Into<Reply>>(
        &mut self,
        items: impl IntoIterator<Item = R>,
        listname: Option<&str>,
        has_next_page: Option<bool>,
    ) -> Result<Reply, ApiError> {
        let info = *self.pagination()?.list(listname);
        let items = items.into_iter().map(Into::into).collect();
        Ok(Reply::Page(pagination::as_paginable(items, info, has_next_page)))
    }

    /// Returns the presentation mode chosen for this request, if any.
    pub fn presentation_mode(&self) -> Option<&str> {
        self.presentation_mode.as_deref()
    }

    /// Chooses the presentation mode for this request.
    pub fn set_presentation_mode(&mut self, mode: impl Into<String>) {
        self.presentation_mode = Some(mode.into());
    }

    /// Resolves the effective presentation mode.
    ///
    /// The request's own choice wins over the route's, which wins over
    /// `default`.
    pub fn effective_presentation_mode<'a>(&'a self, default: &'a str) -> &'a str {
        self.presentation_mode()
            .or_else(|| self.route.presentation_mode())
            .unwrap_or(default)
    }

    /// Builds a signal that stops processing and answers with `reply`.
    ///
    /// ```ignore
    /// return Err(ctx.respond_now(RawResponse::text(StatusCode::FORBIDDEN, "no")));
    /// ```
    pub fn respond_now(&self, reply: impl Into<Reply>) -> DispatchError {
        tracing::debug!(request_id = %self.request_id, "responding immediately");
        DispatchError::respond(reply)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("route", &self.route.name())
            .field("injected", &self.injected)
            .field("state", &self.state)
            .field("pagination", &self.pagination)
            .field("presentation_mode", &self.presentation_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;
    use serde_json::json;

    fn context(uri: &str) -> Context {
        let request = DispatchRequest::new(Method::GET, uri.parse().unwrap());
        Context::new(Arc::new(request), Arc::new(RouteInfo::new(Method::GET, "/items")))
    }

    #[test]
    fn test_request_accessors() {
        let mut headers = HeaderMap::new();
        headers.insert("x-token", HeaderValue::from_static("secret"));
        let request = DispatchRequest::new(Method::POST, "/users/u1?verbose=1".parse().unwrap())
            .with_headers(headers)
            .with_body(r#"{"name":"Ada"}"#)
            .with_path_param("id", "u1");

        assert_eq!(request.path(), "/users/u1");
        assert_eq!(request.query_string(), Some("verbose=1"));
        assert_eq!(request.header("x-token"), Some("secret"));
        assert_eq!(request.path_param("id"), Some("u1"));
        assert_eq!(request.json::<Value>().unwrap(), json!({"name": "Ada"}));

        #[derive(Deserialize)]
        struct Flags {
            verbose: u8,
        }
        assert_eq!(request.query::<Flags>().unwrap().verbose, 1);
    }

    #[test]
    fn test_pagination_parsed_once() {
        let mut ctx = context("/items?page@=3");
        assert_eq!(ctx.pagination().unwrap().list(None).page, 3);

        ctx.pagination().unwrap().list(None).page = 7;
        assert_eq!(ctx.pagination().unwrap().list(None).page, 7);
    }

    #[test]
    fn test_pagination_error_is_bad_request() {
        let mut ctx = context("/items?perPage@=many");
        assert_eq!(ctx.pagination().unwrap_err().status().as_u16(), 400);
    }

    #[test]
    fn test_paginate_through_context() {
        let mut ctx = context("/items?page@posts=2&perPage@posts=2");
        let reply = ctx
            .paginate((0..5).map(|i| json!(i)), Some("posts"), None)
            .unwrap();
        let Reply::Page(page) = reply else {
            panic!("expected a page");
        };
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.next_page, Some(3));
    }

    #[test]
    fn test_presentation_mode_precedence() {
        let request = Arc::new(DispatchRequest::new(Method::GET, "/me".parse().unwrap()));
        let route = Arc::new(RouteInfo::new(Method::GET, "/me").with_presentation_mode("personal"));
        let mut ctx = Context::new(request, route);

        assert_eq!(ctx.effective_presentation_mode("public"), "personal");
        ctx.set_presentation_mode("admin");
        assert_eq!(ctx.effective_presentation_mode("public"), "admin");
        assert_eq!(context("/x").effective_presentation_mode("public"), "public");
    }

    #[test]
    fn test_injected_arguments_are_taken() {
        let mut ctx = context("/items");
        ctx.inject_arg("user", "ada".to_string());
        assert!(ctx.injected().contains("user"));

        let taken = ctx.take_injected();
        assert_eq!(taken.len(), 1);
        assert!(ctx.injected().is_empty());
    }

    #[test]
    fn test_route_name_fallback() {
        let info = RouteInfo::new(Method::DELETE, "/users/{id}");
        assert_eq!(info.name(), "DELETE /users/{id}");
        assert_eq!(info.with_name("delete_user").name(), "delete_user");
    }
}
