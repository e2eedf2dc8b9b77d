//! Host name resolution
//!
//! SOCKS5 clients may send a domain name instead of an address. The name is
//! resolved during the handshake, before any dial, and only IPv4 results are
//! usable.

use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

/// Resolves host names to IPv4 addresses
#[async_trait]
pub trait Resolver: Debug + Send + Sync {
    /// Resolve `host` to the first IPv4 address it maps to
    async fn resolve_ipv4(&self, host: &str) -> io::Result<Ipv4Addr>;
}

/// Resolver backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve_ipv4(&self, host: &str) -> io::Result<Ipv4Addr> {
        // ToSocketAddrs blocks, so keep it off the runtime threads
        let lookup = format!("{}:0", host);
        let addrs = tokio::task::spawn_blocking(move || {
            lookup
                .to_socket_addrs()
                .map(|addrs| addrs.collect::<Vec<_>>())
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;

        first_ipv4(addrs).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no IPv4 address found for {}", host),
            )
        })
    }
}

fn first_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr {
        SocketAddr::V4(v4) => Some(*v4.ip()),
        SocketAddr::V6(_) => None,
    })
}
