//! # Socksie - SOCKS4/SOCKS5 Proxy over an SSH Tunnel
//!
//! Socksie accepts local SOCKS4 and SOCKS5 clients, negotiates the target
//! of each CONNECT request and opens the outbound connection through an
//! authenticated SSH session, so every target is reached from the SSH
//! server's side of the network.
//!
//! ## Features
//!
//! - **SOCKS4 and SOCKS5**: Version detected from the first byte of each connection
//! - **Domain Names**: SOCKS5 domain targets are resolved to IPv4 before dialing
//! - **SSH Tunnel**: One password-authenticated session shared by all connections
//! - **Direct Mode**: Optional local dialer for testing without an SSH server
//! - **Graceful Shutdown**: Stops accepting and waits for in-flight sessions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksie::config::load_config;
//! use socksie::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SOCKS Client -> Socksie -> SSH Server -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod dialer;
pub mod error;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use dialer::{Dialer, DirectDialer, Resolver, SystemResolver};
pub use error::{HandshakeError, Socks5ReplyCode, SocksieError};
pub use server::{run_server, Server};
pub use socks::SocksHandler;

/// Version of the Socksie library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
