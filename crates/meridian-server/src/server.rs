//! The hyper HTTP/1 server.
//!
//! Each accepted connection runs on its own task. Every request body is
//! buffered and dispatched under the configured request timeout; a slow
//! body gives 408 and a slow route 504. On shutdown the accept loop stops
//! and live connections get the shutdown timeout to drain.
//!
//! ```rust,ignore
//! use meridian_server::{App, Server, ServerConfig};
//!
//! let dispatcher = App::new().nest(api_router()).build()?;
//! Server::new(dispatcher, ServerConfig::default()).run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use meridian_config::MeridianConfig;
use meridian_core::ApiError;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::translate::{api_error_response, HttpResponse};

/// Serves a [`Dispatcher`] over HTTP/1.
#[derive(Debug, Clone)]
pub struct Server {
    dispatcher: Dispatcher,
    config: ServerConfig,
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: ServerConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Creates a server from the `server` section of an application config.
    #[must_use]
    pub fn from_config(dispatcher: Dispatcher, config: &MeridianConfig) -> Self {
        Self::new(dispatcher, ServerConfig::from(&config.server))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                reason: e.to_string(),
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Runs on an already bound listener until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let token = tracker.acquire();
                        let server = self.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.serve_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(remote = %remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting");
                    break;
                }
            }
        }

        let timeout = self.config.shutdown_timeout();
        tracing::info!(
            connections = tracker.active_connections(),
            timeout = ?timeout,
            "draining connections"
        );
        if tokio::time::timeout(timeout, tracker.wait_idle()).await.is_err() {
            tracing::warn!(
                connections = tracker.active_connections(),
                "shutdown timeout reached with live connections"
            );
        }
        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        &self,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = self.clone();
        let service = service_fn(move |req: Request<Incoming>| {
            let server = server.clone();
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        let conn = http1::Builder::new()
            .keep_alive(self.config.keep_alive())
            .serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(remote = %remote_addr, "finishing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> HttpResponse {
        let timeout = self.config.request_timeout();
        let (parts, body) = req.into_parts();

        let body: Bytes = match tokio::time::timeout(timeout, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read request body");
                return api_error_response(&ApiError::bad_request(
                    "request.body",
                    format!("failed to read request body: {e}"),
                ));
            }
            Err(_) => {
                tracing::warn!(path = %parts.uri.path(), "request body timed out");
                return api_error_response(&ApiError::new(
                    "request.timeout",
                    StatusCode::REQUEST_TIMEOUT,
                ));
            }
        };

        let method = parts.method.clone();
        let path = parts.uri.path().to_string();
        let request = Request::from_parts(parts, body);
        match tokio::time::timeout(timeout, self.dispatcher.handle(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(http.method = %method, path = %path, "request timed out");
                api_error_response(&ApiError::new(
                    "request.timeout",
                    StatusCode::GATEWAY_TIMEOUT,
                ))
            }
        }
    }
}
