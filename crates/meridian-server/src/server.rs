//! HTTP/1.1 server.
//!
//! The server accepts TCP connections, serves each on its own task with
//! hyper, and hands every request to a [`Dispatcher`]. On shutdown it stops
//! accepting, asks open connections to finish their current request, and
//! waits for them up to the configured timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use meridian_server::{RouteDefinition, Router, Server};
//! use meridian_core::{handler_fn, HandlerError, RequestContext};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Router::new()
//!         .route(RouteDefinition::get(
//!             "/",
//!             handler_fn(|_ctx: RequestContext| async move {
//!                 Ok::<_, HandlerError>(json!({ "message": "Hello World" }))
//!             }),
//!         ))
//!         .compile()?;
//!
//!     Server::builder()
//!         .http_addr("127.0.0.1:8080")
//!         .dispatcher(dispatcher)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use meridian_middleware::MiddlewareChain;
use meridian_router::RouteTable;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not `ip:port`.
    #[error("invalid bind address '{addr}'")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Serves a [`Dispatcher`] over HTTP/1.1.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl Server {
    /// Creates a server.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }

    /// Creates a builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Binds and serves until Ctrl+C or `SIGTERM`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds and serves until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// is triggered, then drains open connections.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, routes = self.dispatcher.route_count(), "server listening"),
            Err(err) => tracing::warn!(error = %err, "listener address unavailable"),
        }

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                biased;

                () = shutdown.triggered() => break,

                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let token = tracker.acquire();
                        let dispatcher = self.dispatcher.clone();
                        let shutdown = shutdown.clone();
                        let keep_alive = self.config.keep_alive();

                        tokio::spawn(async move {
                            serve_connection(stream, remote_addr, dispatcher, keep_alive, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "failed to accept connection");
                    }
                },
            }
        }

        drop(listener);
        drain(&tracker, self.config.shutdown_timeout()).await;
        tracing::info!("server stopped");
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    dispatcher: Dispatcher,
    keep_alive: bool,
    shutdown: ShutdownSignal,
) {
    let service = service_fn(move |request: Request<Incoming>| {
        let dispatcher = dispatcher.clone();
        async move { Ok::<_, Infallible>(dispatcher.handle(request).await) }
    });

    let conn = http1::Builder::new()
        .keep_alive(keep_alive)
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut closing = false;
    let result = loop {
        tokio::select! {
            result = conn.as_mut() => break result,
            () = shutdown.triggered(), if !closing => {
                tracing::debug!(%remote_addr, "closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
        }
    };

    if let Err(err) = result {
        tracing::debug!(%remote_addr, error = %err, "connection ended with error");
    }
}

async fn drain(tracker: &ConnectionTracker, timeout: Duration) {
    let open = tracker.active_connections();
    if open == 0 {
        return;
    }

    tracing::info!(open, timeout_secs = timeout.as_secs(), "waiting for connections to close");
    if tokio::time::timeout(timeout, tracker.drained()).await.is_err() {
        tracing::warn!(
            open = tracker.active_connections(),
            "shutdown timeout reached with connections still open"
        );
    }
}

/// Builder for [`Server`].
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    dispatcher: Option<Dispatcher>,
}

impl ServerBuilder {
    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config = self.config.with_http_addr(addr);
        self
    }

    /// Sets the shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_shutdown_timeout(timeout);
        self
    }

    /// Enables or disables keep-alive.
    #[must_use]
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.config = self.config.with_keep_alive(enabled);
        self
    }

    /// Sets the dispatcher that handles requests.
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Builds the server. Without a dispatcher every request gets the
    /// not-found response.
    pub fn build(self) -> Server {
        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| Dispatcher::new(RouteTable::new(), MiddlewareChain::new()));
        Server::new(self.config, dispatcher)
    }
}
