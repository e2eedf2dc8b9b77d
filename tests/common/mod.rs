//! Test utilities and mocks for Socksie
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use socksie::dialer::{Dialer, Resolver};
use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start a TCP echo server, returning its address
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => return,
            };
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    addr
}

/// A target connection handed out by [`PipeDialer`]
#[derive(Debug)]
pub struct DialedTarget {
    /// Client address passed to the dialer
    pub origin: SocketAddr,
    /// Endpoint the dialer was asked for
    pub target: SocketAddrV4,
    /// Far end of the pipe, playing the target
    pub stream: DuplexStream,
}

/// Dialer that always succeeds with an in-memory pipe
///
/// The far end of each pipe is sent over a channel so the test can act as
/// the target.
#[derive(Debug)]
pub struct PipeDialer {
    targets: mpsc::UnboundedSender<DialedTarget>,
}

impl PipeDialer {
    /// Create the dialer and the receiver of dialed targets
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DialedTarget>) {
        let (targets, rx) = mpsc::unbounded_channel();
        (PipeDialer { targets }, rx)
    }
}

#[async_trait]
impl Dialer for PipeDialer {
    type Stream = DuplexStream;

    async fn dial_tcp(&self, origin: SocketAddr, target: SocketAddrV4) -> io::Result<DuplexStream> {
        let (local, remote) = duplex(8192);
        self.targets
            .send(DialedTarget {
                origin,
                target,
                stream: remote,
            })
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "test receiver dropped"))?;
        Ok(local)
    }
}

/// Dialer that always fails with the given error kind
#[derive(Debug)]
pub struct FailingDialer(pub io::ErrorKind);

#[async_trait]
impl Dialer for FailingDialer {
    type Stream = DuplexStream;

    async fn dial_tcp(&self, _origin: SocketAddr, target: SocketAddrV4) -> io::Result<DuplexStream> {
        Err(io::Error::new(self.0, format!("dial {} failed", target)))
    }
}

/// Resolver backed by a fixed table
#[derive(Debug, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Ipv4Addr>,
    lookups: Mutex<Vec<String>>,
}

impl StaticResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host entry
    pub fn with_host(mut self, host: &str, ip: Ipv4Addr) -> Self {
        self.hosts.insert(host.to_string(), ip);
        self
    }

    /// Hosts looked up so far
    pub async fn lookups(&self) -> Vec<String> {
        self.lookups.lock().await.clone()
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve_ipv4(&self, host: &str) -> io::Result<Ipv4Addr> {
        self.lookups.lock().await.push(host.to_string());
        self.hosts.get(host).copied().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no address for {}", host))
        })
    }
}

/// Echo everything received on a dialed target until EOF
pub async fn echo_target(mut target: DuplexStream) {
    let mut buf = [0u8; 1024];
    loop {
        match target.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if target.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
        }
    }
    let _ = target.shutdown().await;
}

/// Mock SOCKS4 request data
pub mod socks4_mock {
    use socksie::socks::*;

    /// Create a SOCKS4 CONNECT request
    pub fn create_connect(ip: [u8; 4], port: u16, user_id: &[u8]) -> Vec<u8> {
        let mut request = vec![SOCKS4_VERSION, SOCKS4_CMD_CONNECT];
        request.extend_from_slice(&port.to_be_bytes());
        request.extend_from_slice(&ip);
        request.extend_from_slice(user_id);
        request.push(0);
        request
    }
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use socksie::socks::*;

    /// Create a method selection request
    pub fn create_method_request(methods: &[u8]) -> Vec<u8> {
        let mut request = vec![SOCKS5_VERSION, methods.len() as u8];
        request.extend_from_slice(methods);
        request
    }

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        create_method_request(&[SOCKS5_AUTH_METHOD_NONE])
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }
}
