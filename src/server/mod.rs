//! SOCKS listener and connection supervision
//!
//! Accepts clients, runs one task per connection and on shutdown stops
//! accepting, then waits for in-flight sessions to finish on their own.

mod tracker;

pub use tracker::{ConnectionGuard, ConnectionTracker};

use crate::config::{Config, DialerType, ServerConfig};
#[cfg(feature = "ssh")]
use crate::dialer::SshDialer;
use crate::dialer::{DirectDialer, Dialer, Resolver, SystemResolver};
use crate::error::{OutcomeClass, SocksieError};
use crate::socks::{RelayStats, SocksHandler};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// SOCKS server over a single dialer
#[derive(Debug)]
pub struct Server<D> {
    handler: SocksHandler<D>,
    tracker: ConnectionTracker,
}

impl<D: Dialer> Server<D> {
    /// Create a server around a session handler
    pub fn new(handler: SocksHandler<D>) -> Self {
        Server {
            handler,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Connection tracker shared with the spawned sessions
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until a shutdown signal arrives
    ///
    /// An accept failure ends the server with an error. After shutdown the
    /// listener is closed and this waits for every session to complete.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<bool>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!("Failed to accept SOCKS connection: {}", e);
                            return Err(e).context("Failed to accept SOCKS connection");
                        }
                    };
                    self.spawn_session(stream, peer);
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        drop(listener);

        info!(
            "Waiting for all existing connections to finish ({} active)",
            self.tracker.active()
        );
        self.tracker.wait_idle().await;

        info!("Server stopped");
        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr) {
        let guard = self.tracker.track();
        let handler = self.handler.clone();

        debug!("Accepted connection from {}", peer);

        tokio::spawn(async move {
            let _guard = guard;
            let result = handler.handle(stream, peer).await;
            log_session(peer, result);
        });
    }
}

fn log_session(peer: SocketAddr, result: Result<RelayStats, SocksieError>) {
    match result {
        Ok(stats) => {
            info!(
                "Connection from {} closed: {} bytes sent, {} bytes received",
                peer, stats.client_to_target.bytes, stats.target_to_client.bytes
            );
            for (direction, stats) in [
                ("client->target", &stats.client_to_target),
                ("target->client", &stats.target_to_client),
            ] {
                if let Some(e) = &stats.error {
                    debug!("{} {} ended with error: {}", peer, direction, e);
                }
            }
        }
        Err(SocksieError::Handshake(e)) => match e.outcome_class() {
            OutcomeClass::Malformed => warn!("Malformed request from {}: {}", peer, e),
            OutcomeClass::Rejected => info!("Rejected request from {}: {}", peer, e),
        },
        Err(e) => warn!("Connection from {} failed: {}", peer, e),
    }
}

/// Bind the listener and serve with the given dialer
pub async fn serve<D: Dialer>(
    config: &ServerConfig,
    dialer: D,
    resolver: Arc<dyn Resolver>,
    shutdown_rx: broadcast::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind SOCKS listener on {}", config.bind_addr))?;

    info!(
        "Listening for incoming SOCKS connections on [{}]",
        listener.local_addr()?
    );

    let handler = SocksHandler::new(Arc::new(dialer), resolver)
        .with_buffer_size(config.handshake_buffer_size);

    Server::new(handler).run(listener, shutdown_rx).await
}

/// Run the server with the given configuration
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    config.validate()?;

    let resolver: Arc<dyn Resolver> = Arc::new(SystemResolver);

    match config.dialer.dialer_type {
        #[cfg(feature = "ssh")]
        DialerType::Ssh => {
            let dialer = SshDialer::connect(&config.dialer.ssh).await?;
            info!("Tunneling connections through [{}]", dialer.server());
            serve(&config.server, dialer, resolver, shutdown_rx).await
        }
        #[cfg(not(feature = "ssh"))]
        DialerType::Ssh => {
            anyhow::bail!("SSH dialer is not enabled. Recompile with --features ssh")
        }
        DialerType::Direct => {
            info!("Dialing targets directly from this host");
            let dialer = DirectDialer::from_config(&config.dialer.tcp);
            serve(&config.server, dialer, resolver, shutdown_rx).await
        }
    }
}
