//! Request dispatch over a frozen application.

use std::sync::Arc;

use bytes::Bytes;
use http::Request;
use meridian_core::{DispatchRequest, KindRegistry, SetupError};
use meridian_router::RouterTree;

use crate::route_table::{RouteLookup, RouteTable};
use crate::translate::{
    api_error_response, encoded_response, error_response, internal_error_response,
    method_not_allowed_response, not_found_response, HttpResponse,
};

/// A built application, cheap to clone and share across tasks.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    tree: RouterTree,
    table: RouteTable,
    kinds: KindRegistry,
    default_mode: String,
}

impl Dispatcher {
    pub(crate) fn new(
        tree: RouterTree,
        kinds: KindRegistry,
        default_mode: String,
    ) -> Result<Self, SetupError> {
        let table = RouteTable::build(&tree)?;
        Ok(Self {
            inner: Arc::new(Inner {
                tree,
                table,
                kinds,
                default_mode,
            }),
        })
    }

    /// Returns the frozen router tree.
    pub fn tree(&self) -> &RouterTree {
        &self.inner.tree
    }

    /// Returns the error kind hierarchy.
    pub fn kinds(&self) -> &KindRegistry {
        &self.inner.kinds
    }

    /// Returns the application's default presentation mode.
    pub fn default_mode(&self) -> &str {
        &self.inner.default_mode
    }

    /// Handles one request with a fully buffered body.
    ///
    /// Never fails: unmatched paths give 404, unmatched methods 405, and
    /// errors no handler recovered are translated at this boundary.
    pub async fn handle(&self, request: Request<Bytes>) -> HttpResponse {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();

        let (route_id, params) = match self.inner.table.lookup(&parts.method, &path) {
            Ok(RouteLookup::Found { route, params }) => (route, params),
            Ok(RouteLookup::MethodNotAllowed(allowed)) => {
                tracing::debug!(http.method = %parts.method, path = %path, "method not allowed");
                return method_not_allowed_response(&allowed);
            }
            Ok(RouteLookup::NotFound) => {
                tracing::debug!(http.method = %parts.method, path = %path, "no route");
                return not_found_response(&path);
            }
            Err(err) => return api_error_response(&err),
        };

        let Some(route) = self.inner.tree.route(route_id) else {
            tracing::error!(route = route_id.index(), "route table points outside the tree");
            return internal_error_response();
        };

        let request = DispatchRequest::new(parts.method, parts.uri)
            .with_headers(parts.headers)
            .with_body(body)
            .with_path_params(params);

        match route
            .dispatch(Arc::new(request), &self.inner.kinds, &self.inner.default_mode)
            .await
        {
            Ok(encoded) => encoded_response(encoded),
            Err(err) => {
                let mode = route
                    .info()
                    .presentation_mode()
                    .unwrap_or(&self.inner.default_mode);
                error_response(err, mode)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::App;
    use http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use meridian_core::{handler_fn, ApiError, Reply};
    use meridian_router::Route;
    use serde_json::{json, Value};

    fn dispatcher() -> Dispatcher {
        App::new()
            .route(Route::get(
                "/items/{id}",
                handler_fn(&["id"], |_ctx, mut args| {
                    Box::pin(async move {
                        let id: String = args.take("id")?;
                        if id == "missing" {
                            return Err(ApiError::object_not_found("id", &id).into());
                        }
                        Ok(Reply::Json(json!({ "id": id })))
                    })
                }),
            ))
            .route(Route::post(
                "/items",
                handler_fn(&[], |_ctx, _args| Box::pin(async { Ok(Reply::Empty) })),
            ))
            .route(Route::get(
                "/shelves/{n:int}",
                handler_fn(&["n"], |_ctx, mut args| {
                    Box::pin(async move { Ok(Reply::Json(json!(args.take::<i64>("n")?))) })
                }),
            ))
            .build()
            .unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_matched_route() {
        let response = dispatcher().handle(request(Method::GET, "/items/a%20b")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"id": "a b"}));
    }

    #[tokio::test]
    async fn test_api_error_translated() {
        let response = dispatcher().handle(request(Method::GET, "/items/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "object.notfound");
        assert_eq!(body["statusCode"], 404);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = dispatcher().handle(request(Method::GET, "/nothing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "route.notfound");
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let response = dispatcher().handle(request(Method::DELETE, "/items")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(http::header::ALLOW).unwrap(), "POST");
    }

    #[tokio::test]
    async fn test_int_converter_limits_matching() {
        let response = dispatcher().handle(request(Method::GET, "/shelves/12")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!(12));

        let response = dispatcher().handle(request(Method::GET, "/shelves/abc")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "route.notfound");
    }
}
