//! Outbound dialers for Socksie
//!
//! A dialer opens the TCP connection to the target of an accepted request.
//! The production dialer tunnels it through an SSH session; the direct
//! dialer connects from the local host.

mod direct;
mod resolver;
#[cfg(feature = "ssh")]
mod ssh;

pub use direct::{DirectDialer, SocketOpts};
pub use resolver::{Resolver, SystemResolver};
#[cfg(feature = "ssh")]
pub use ssh::SshDialer;

use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use tokio::io::{AsyncRead, AsyncWrite};

/// Dialer trait for outbound TCP connections
///
/// Implementations open a connection to `target` as if it had been dialed
/// locally. `origin` is the address of the SOCKS client the connection is
/// made on behalf of; tunnels may report it to the remote side.
#[async_trait]
pub trait Dialer: Debug + Send + Sync + 'static {
    /// The stream type produced by this dialer
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a TCP connection to `target`
    async fn dial_tcp(&self, origin: SocketAddr, target: SocketAddrV4) -> io::Result<Self::Stream>;
}

#[async_trait]
impl<D: Dialer> Dialer for std::sync::Arc<D> {
    type Stream = D::Stream;

    async fn dial_tcp(&self, origin: SocketAddr, target: SocketAddrV4) -> io::Result<Self::Stream> {
        (**self).dial_tcp(origin, target).await
    }
}
