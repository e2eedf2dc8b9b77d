//! SOCKS5 handshake
//!
//! Two phases: method selection (see [`super::auth`]) and the request.
//!
//! # SOCKS5 Request Format
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```
//!
//! Each phase must arrive in a single read of at most the handshake buffer
//! size. Bytes following the method selection in the same read are taken as
//! the start of the request.

use super::auth;
use super::codec::{decode_domain_endpoint, decode_ipv4_endpoint, decode_port, encode_socks5_reply};
use super::consts::*;
use super::types::{Negotiated, ProxyRequest, SocksCommand, SocksVersion, TargetAddr};
use crate::dialer::Resolver;
use crate::error::{HandshakeError, Socks5ReplyCode, SocksieError};
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Parse a SOCKS5 request, resolving domain names
///
/// Returns the request and the number of bytes it occupied in `buf`.
pub async fn parse_request(
    buf: &[u8],
    resolver: &dyn Resolver,
) -> Result<(ProxyRequest, usize), HandshakeError> {
    if buf.len() < 2 {
        return Err(HandshakeError::HeaderTooShort(buf.len()));
    }
    if buf[0] != SOCKS5_VERSION {
        return Err(HandshakeError::VersionMismatch(buf[0]));
    }
    if buf[1] != SOCKS5_CMD_TCP_CONNECT {
        return Err(HandshakeError::UnsupportedCommand(buf[1]));
    }
    if buf.len() < 4 {
        return Err(HandshakeError::TruncatedRequest);
    }

    // buf[2] is reserved
    let addr_type = buf[3];
    let (target, destination, consumed) = match addr_type {
        SOCKS5_ADDR_TYPE_IPV4 => {
            if buf.len() < 10 {
                return Err(HandshakeError::TruncatedRequest);
            }
            let destination =
                decode_ipv4_endpoint([buf[4], buf[5], buf[6], buf[7]], [buf[8], buf[9]]);
            (TargetAddr::Ipv4(destination), destination, 10)
        }

        SOCKS5_ADDR_TYPE_DOMAIN => {
            if buf.len() < 5 {
                return Err(HandshakeError::TruncatedRequest);
            }
            let name_end = 5 + buf[4] as usize;
            let end = name_end + 2;
            if buf.len() < end {
                return Err(HandshakeError::TruncatedRequest);
            }
            let name = &buf[5..name_end];
            let port = [buf[name_end], buf[name_end + 1]];
            let destination = decode_domain_endpoint(name, port, resolver).await?;
            let target = TargetAddr::domain(
                String::from_utf8_lossy(name).into_owned(),
                decode_port(port),
            );
            (target, destination, end)
        }

        _ => return Err(HandshakeError::UnsupportedAddressType(addr_type)),
    };

    let request = ProxyRequest {
        version: SocksVersion::V5,
        command: SocksCommand::Connect,
        target,
        destination,
        user_id: Vec::new(),
    };

    Ok((request, consumed))
}

/// Run the SOCKS5 handshake on the first buffer read from the client
///
/// Rejections that have a SOCKS5 reply code are answered before the error is
/// returned; malformed requests get no reply.
pub async fn handshake<S>(
    stream: &mut S,
    buf: &[u8],
    resolver: &dyn Resolver,
    buffer_size: usize,
) -> Result<Negotiated, SocksieError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let consumed = auth::negotiate(stream, buf).await?;

    let request_buf = if buf.len() > consumed {
        buf[consumed..].to_vec()
    } else {
        let mut fresh = vec![0u8; buffer_size];
        let n = stream.read(&mut fresh).await?;
        fresh.truncate(n);
        fresh
    };

    match parse_request(&request_buf, resolver).await {
        Ok((request, consumed)) => {
            debug!("SOCKS5 request to {} ({})", request.target, request.destination);
            Ok(Negotiated {
                request,
                early_data: request_buf[consumed..].to_vec(),
            })
        }
        Err(e) => {
            if let Some(code) = Socks5ReplyCode::for_rejection(&e) {
                warn!("SOCKS5 request rejected: {}", e);
                send_reply(stream, code, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)).await?;
            }
            Err(e.into())
        }
    }
}

/// Send a SOCKS5 reply
pub async fn send_reply<S>(
    stream: &mut S,
    code: Socks5ReplyCode,
    bind_addr: SocketAddrV4,
) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let reply = encode_socks5_reply(code.into(), bind_addr);
    stream.write_all(&reply).await?;
    stream.flush().await
}
