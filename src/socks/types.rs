//! SOCKS type definitions
//!
//! Defines the core types shared by the SOCKS4 and SOCKS5 handshakes.

use super::consts::*;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Protocol version negotiated with a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksVersion {
    /// SOCKS4
    V4,
    /// SOCKS5
    V5,
}

impl SocksVersion {
    /// Parse the first byte of a request
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS4_VERSION => Some(SocksVersion::V4),
            SOCKS5_VERSION => Some(SocksVersion::V5),
            _ => None,
        }
    }
}

impl fmt::Display for SocksVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksVersion::V4 => write!(f, "4"),
            SocksVersion::V5 => write!(f, "5"),
        }
    }
}

/// SOCKS command types
///
/// SOCKS4 and SOCKS5 share the byte values of these commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// TCP BIND - wait for incoming connection (not implemented)
    Bind,
    /// UDP ASSOCIATE - establish UDP relay (not implemented)
    UdpAssociate,
}

impl SocksCommand {
    /// Parse a command byte into SocksCommand
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Some(SocksCommand::Connect),
            SOCKS5_CMD_TCP_BIND => Some(SocksCommand::Bind),
            SOCKS5_CMD_UDP_ASSOCIATE => Some(SocksCommand::UdpAssociate),
            _ => None,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// Target address as sent by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// IPv4 address with port
    Ipv4(SocketAddrV4),
    /// Domain name with port
    Domain(String, u16),
}

impl TargetAddr {
    /// Create a new TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ipv4(SocketAddrV4::new(ip, port))
    }

    /// Create a new TargetAddr from a domain name and port
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        TargetAddr::Domain(domain.into(), port)
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ipv4(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ipv4(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

/// A CONNECT request accepted by one of the handshakes
///
/// `destination` is always resolved; domain names are looked up during the
/// handshake so the dialer only ever sees an IPv4 endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Negotiated protocol version
    pub version: SocksVersion,
    /// Requested command (always CONNECT once accepted)
    pub command: SocksCommand,
    /// Address as the client expressed it
    pub target: TargetAddr,
    /// Resolved endpoint to dial
    pub destination: SocketAddrV4,
    /// SOCKS4 user id, empty for SOCKS5. Logged, never checked.
    pub user_id: Vec<u8>,
}

impl ProxyRequest {
    /// User id rendered for logs
    pub fn user_id_lossy(&self) -> String {
        String::from_utf8_lossy(&self.user_id).into_owned()
    }
}

/// Result of a successful handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// The accepted request
    pub request: ProxyRequest,
    /// Client bytes that arrived after the request, to be sent to the target first
    pub early_data: Vec<u8>,
}
