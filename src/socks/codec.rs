//! SOCKS address codec
//!
//! Decodes the IPv4 and domain-name address forms used in requests and
//! renders the fixed-size replies of both protocol versions.
//!
//! # Reply Formats
//!
//! ```text
//! SOCKS4: | VN=0 | CD | DSTPORT (2) | DSTIP (4) |
//! SOCKS5: | VER=5 | REP | RSV=0 | ATYP=1 | BND.ADDR (4) | BND.PORT (2) |
//! ```

use super::consts::*;
use super::types::SocksVersion;
use crate::dialer::Resolver;
use crate::error::HandshakeError;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Decode a big-endian port
pub fn decode_port(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Decode an IPv4 address and port
pub fn decode_ipv4_endpoint(ip: [u8; 4], port: [u8; 2]) -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::from(ip), decode_port(port))
}

/// Encode an endpoint as address octets followed by the big-endian port
pub fn encode_ipv4_endpoint(endpoint: SocketAddrV4) -> [u8; 6] {
    let mut out = [0u8; 6];
    out[..4].copy_from_slice(&endpoint.ip().octets());
    out[4..].copy_from_slice(&endpoint.port().to_be_bytes());
    out
}

/// Resolve a domain name and port to an IPv4 endpoint
///
/// Dotted-quad literals are decoded without consulting the resolver.
pub async fn decode_domain_endpoint(
    name: &[u8],
    port: [u8; 2],
    resolver: &dyn Resolver,
) -> Result<SocketAddrV4, HandshakeError> {
    let host = std::str::from_utf8(name).map_err(|_| HandshakeError::InvalidDomain)?;
    if host.is_empty() {
        return Err(HandshakeError::InvalidDomain);
    }
    let port = decode_port(port);

    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(SocketAddrV4::new(ip, port));
    }

    let ip = resolver
        .resolve_ipv4(host)
        .await
        .map_err(|e| HandshakeError::Resolution {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

    tracing::debug!("Resolved {} to {}", host, ip);

    Ok(SocketAddrV4::new(ip, port))
}

/// Render a SOCKS4 reply
pub fn encode_socks4_reply(status: u8, endpoint: SocketAddrV4) -> [u8; SOCKS4_REPLY_LEN] {
    let mut reply = [0u8; SOCKS4_REPLY_LEN];
    reply[0] = SOCKS4_REPLY_VERSION;
    reply[1] = status;
    reply[2..4].copy_from_slice(&endpoint.port().to_be_bytes());
    reply[4..].copy_from_slice(&endpoint.ip().octets());
    reply
}

/// Render a SOCKS5 reply with an IPv4 bound address
pub fn encode_socks5_reply(status: u8, endpoint: SocketAddrV4) -> [u8; SOCKS5_REPLY_LEN] {
    let mut reply = [0u8; SOCKS5_REPLY_LEN];
    reply[0] = SOCKS5_VERSION;
    reply[1] = status;
    reply[2] = SOCKS5_RESERVED;
    reply[3] = SOCKS5_ADDR_TYPE_IPV4;
    reply[4..].copy_from_slice(&encode_ipv4_endpoint(endpoint));
    reply
}

/// Render the reply frame of the given protocol version
pub fn encode_reply(version: SocksVersion, status: u8, endpoint: SocketAddrV4) -> Vec<u8> {
    match version {
        SocksVersion::V4 => encode_socks4_reply(status, endpoint).to_vec(),
        SocksVersion::V5 => encode_socks5_reply(status, endpoint).to_vec(),
    }
}
