//! `TrigridServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → engine.

use std::sync::Arc;

use tokio::sync::Mutex;
use trigrid_engine::Registry;
use trigrid_protocol::{Codec, JsonCodec};
use trigrid_session::Authenticator;
use trigrid_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{Config, TrigridError};

/// Shared server state passed to each connection handler task.
///
/// The registry lives behind a single `Mutex` — handlers lock it only
/// long enough to resolve or mutate the tables, never across session
/// I/O. This is the explicitly constructed, injected instance the
/// design calls for; nothing in the process reaches it except through
/// this struct.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) registry: Mutex<Registry>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Trigrid server.
///
/// # Example
///
/// ```rust,no_run
/// use trigrid::prelude::*;
///
/// # async fn run() -> Result<(), TrigridError> {
/// let server = TrigridServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(AcceptClaims)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TrigridServerBuilder {
    bind_addr: String,
}

impl TrigridServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Takes the bind address from a [`Config`].
    pub fn config(mut self, config: &Config) -> Self {
        self.bind_addr = config.socket_addr_string();
        self
    }

    /// Builds the server with the given authenticator.
    ///
    /// Uses `JsonCodec` and the WebSocket transport.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<TrigridServer<A, JsonCodec>, TrigridError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(Registry::new()),
            auth,
            codec: JsonCodec,
        });

        Ok(TrigridServer { transport, state })
    }
}

impl Default for TrigridServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Trigrid server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TrigridServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
}

impl<A, C> TrigridServer<A, C>
where
    A: Authenticator,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> TrigridServerBuilder {
        TrigridServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), TrigridError> {
        tracing::info!("Trigrid server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
