//! SOCKS module for Socksie
//!
//! This module implements the SOCKS4 and SOCKS5 server side: version
//! detection, the per-version handshakes, reply encoding and the relay that
//! follows a successful CONNECT.

mod auth;
mod codec;
mod consts;
mod handler;
mod tcp_relay;
mod types;
mod v4;
mod v5;

pub use auth::{negotiate, select_auth_method, AuthMethod};
pub use codec::{
    decode_domain_endpoint, decode_ipv4_endpoint, decode_port, encode_ipv4_endpoint, encode_reply,
    encode_socks4_reply, encode_socks5_reply,
};
pub use consts::*;
pub use handler::SocksHandler;
pub use tcp_relay::{relay_tcp, DirectionStats, RelayStats};
pub use types::{Negotiated, ProxyRequest, SocksCommand, SocksVersion, TargetAddr};

/// SOCKS4 request parsing and replies
pub mod socks4 {
    pub use super::v4::{handshake, parse_request, send_reply};
}

/// SOCKS5 request parsing and replies
pub mod socks5 {
    pub use super::auth::parse_methods;
    pub use super::v5::{handshake, parse_request, send_reply};
}
