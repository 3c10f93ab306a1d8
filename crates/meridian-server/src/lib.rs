//! # Meridian Server
//!
//! Binds a Meridian router tree to HTTP.
//!
//! - [`App`] - The application root: routes, child routers, inherited
//!   services and error handlers, error kinds and the default presentation
//!   mode
//! - [`Dispatcher`] - The frozen application; matches paths with `matchit`,
//!   runs the route pipeline and translates what escapes it
//! - [`Server`] - hyper HTTP/1 accept loop with request timeouts and
//!   graceful shutdown
//!
//! ## Boundary translation
//!
//! | Outcome | Response |
//! |---------|----------|
//! | encoded reply | 200 JSON, or the attached response verbatim |
//! | `ApiError` | its status, `{"error", "statusCode", "message"}` |
//! | immediate-response signal | the attached reply, encoded |
//! | no matching path | 404 `route.notfound` |
//! | path matches other methods | 405 `method.notallowed` with `Allow` |
//! | anything else | 500 `internal_error`, logged |

#![doc(html_root_url = "https://docs.rs/meridian-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod dispatcher;
mod error;
mod route_table;
mod server;
pub mod shutdown;
pub mod translate;

pub use app::App;
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use dispatcher::Dispatcher;
pub use error::ServerError;
pub use route_table::{RouteLookup, RouteTable};
pub use server::Server;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
pub use translate::{HttpResponse, ResponseBody};
