//! # Meridian
//!
//! Declarative request dispatch for JSON APIs.
//!
//! - Router trees whose services (before/after hooks) and error handlers are
//!   inherited by every route below them
//! - Path parameters resolved into domain objects by fetch rules against
//!   tables
//! - First-match error handlers keyed on an extensible kind hierarchy
//! - Presentation-mode encoding and a pagination envelope
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meridian::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), meridian::Error> {
//!     let config = ConfigLoader::new().with_optional_file("meridian.toml")?.load()?;
//!     let users = MemoryStore::new().database("app").create_table::<User>("users", "id");
//!
//!     let app = App::from_config(&config).route(
//!         Route::get("/users/{id}", handler_fn(&["id"], |_ctx, mut args| {
//!             Box::pin(async move { Ok(Reply::object(args.take::<User>("id")?)) })
//!         }))
//!         .fetch("id", FetchDescriptor::one(&users)),
//!     );
//!
//!     meridian::run(app, &config).await
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! match path → resolve arguments → before hooks (route → router → root)
//!            → handler → after hooks → encode
//!                 ↘ error → first matching error handler → translate
//! ```

#![doc(html_root_url = "https://docs.rs/meridian/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use meridian_config as config;
pub use meridian_core as core;
pub use meridian_middleware as middleware;
pub use meridian_router as router;
pub use meridian_server as server;
pub use meridian_store as store;
pub use meridian_telemetry as telemetry;

use meridian_config::{ConfigError, MeridianConfig};
use meridian_core::SetupError;
use meridian_server::{App, Server, ServerError};
use meridian_telemetry::{LogConfig, TelemetryError};
use thiserror::Error;

/// Errors that stop an application from starting or serving.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The application is misconfigured.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The server failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Installs logging, builds `app` and serves it until SIGTERM or SIGINT.
///
/// # Errors
///
/// Fails on an invalid logging directive, an invalid application, or a
/// bind failure.
pub async fn run(app: App, config: &MeridianConfig) -> Result<(), Error> {
    meridian_telemetry::init_logging(&LogConfig::from(&config.logging))?;
    let dispatcher = app.build()?;
    Server::from_config(dispatcher, config).run().await?;
    Ok(())
}

/// Common imports.
///
/// ```rust,ignore
/// use meridian::prelude::*;
/// ```
pub mod prelude {
    pub use meridian_config::{ConfigLoader, MeridianConfig};
    pub use meridian_core::{
        handler_fn, ApiError, ApiObject, Arguments, Context, DispatchError, DispatchResult,
        ErrorKind, Handler, RawResponse, Reply,
    };
    pub use meridian_middleware::{ErrorHandler, Service};
    pub use meridian_router::{FetchDescriptor, Route, Router};
    pub use meridian_server::{App, Dispatcher, Server, ServerConfig, ShutdownSignal};
    pub use meridian_store::{Database, MemoryStore, Query, Record, Table};
    pub use meridian_telemetry::{init_logging, LogConfig};
}
