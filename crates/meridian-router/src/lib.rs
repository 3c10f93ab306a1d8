//! # Meridian Router
//!
//! The router tree and the per-route dispatch pipeline.
//!
//! - [`Router`] - Setup-time builder for routes, child routers, services and
//!   error handlers
//! - [`Route`] - One handler bound to a method and a path template
//! - [`FetchDescriptor`] - Declarative lookup of a path parameter in a table
//! - [`RouterTree`] - The frozen tree, with effective (inherited) services and
//!   error handlers
//! - [`CompiledRoute::dispatch`] - Runs one request through a route
//!
//! ## Inheritance
//!
//! A route runs its own services first, then those of its router, then those
//! of each ancestor up to the root. Error handlers are scanned in the same
//! order and the first one whose kind matches wins.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use http::Method;
//! use meridian_core::{handler_fn, DispatchRequest, KindRegistry, Reply};
//! use meridian_router::{Route, Router};
//! use serde_json::json;
//!
//! let tree = Router::new()
//!     .route(Route::get(
//!         "/hello/{name}",
//!         handler_fn(&["name"], |_ctx, mut args| {
//!             Box::pin(async move {
//!                 let name: String = args.take("name")?;
//!                 Ok(Reply::Json(json!({ "hello": name })))
//!             })
//!         }),
//!     ))
//!     .freeze()
//!     .unwrap();
//!
//! let request = DispatchRequest::new(Method::GET, "/hello/ada".parse().unwrap())
//!     .with_path_param("name", "ada");
//! let route = &tree.routes()[0];
//! let encoded = tokio_test::block_on(route.dispatch(Arc::new(request), &KindRegistry::new(), "public"))
//!     .unwrap();
//! assert_eq!(encoded.as_json(), Some(&json!({"hello": "ada"})));
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod fetch;
mod pipeline;
mod plan;
mod route;
mod router;
mod template;
mod tree;

pub use fetch::{Cardinality, FetchDescriptor, KeyFormat, Lookup, Resolved};
pub use plan::{ArgumentPlan, ParamSource};
pub use route::{CompiledRoute, Route};
pub use router::Router;
pub use template::{Converter, PathTemplate};
pub use tree::{RouteId, RouterId, RouterNode, RouterTree};
