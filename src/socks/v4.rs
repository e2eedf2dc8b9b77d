//! SOCKS4 handshake
//!
//! # SOCKS4 Request Format
//!
//! ```text
//! +----+----+---------+--------+-------------+
//! | VN | CD | DSTPORT | DSTIP  | USERID | 0  |
//! +----+----+---------+--------+-------------+
//! | 1  | 1  |    2    |   4    |  var   | 1  |
//! +----+----+---------+--------+-------------+
//! ```
//!
//! The whole request must arrive in the first read; a request split across
//! reads is reported as malformed.

use super::codec::{decode_ipv4_endpoint, encode_socks4_reply};
use super::consts::*;
use super::types::{Negotiated, ProxyRequest, SocksCommand, SocksVersion, TargetAddr};
use crate::error::{HandshakeError, SocksieError};
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Parse a SOCKS4 CONNECT request
///
/// Returns the request and the number of bytes it occupied in `buf`.
pub fn parse_request(buf: &[u8]) -> Result<(ProxyRequest, usize), HandshakeError> {
    if buf.len() < 2 {
        return Err(HandshakeError::HeaderTooShort(buf.len()));
    }
    if buf[0] != SOCKS4_VERSION {
        return Err(HandshakeError::UnknownVersion(buf[0]));
    }
    if buf[1] != SOCKS4_CMD_CONNECT {
        return Err(HandshakeError::UnsupportedCommand(buf[1]));
    }
    if buf.len() < SOCKS4_HEADER_LEN {
        return Err(HandshakeError::TruncatedRequest);
    }

    let destination = decode_ipv4_endpoint([buf[4], buf[5], buf[6], buf[7]], [buf[2], buf[3]]);

    let user_id_len = buf[SOCKS4_HEADER_LEN..]
        .iter()
        .position(|b| *b == 0)
        .ok_or(HandshakeError::NoUserIdTerminator)?;
    let user_id = buf[SOCKS4_HEADER_LEN..SOCKS4_HEADER_LEN + user_id_len].to_vec();

    let request = ProxyRequest {
        version: SocksVersion::V4,
        command: SocksCommand::Connect,
        target: TargetAddr::Ipv4(destination),
        destination,
        user_id,
    };

    Ok((request, SOCKS4_HEADER_LEN + user_id_len + 1))
}

/// Run the SOCKS4 handshake on the first buffer read from the client
///
/// Unsupported commands are answered with a rejection reply before the error
/// is returned; malformed requests get no reply.
pub async fn handshake<S>(stream: &mut S, buf: &[u8]) -> Result<Negotiated, SocksieError>
where
    S: AsyncWrite + Unpin,
{
    match parse_request(buf) {
        Ok((request, consumed)) => {
            debug!(
                "SOCKS4 request to {}, user={}",
                request.destination,
                request.user_id_lossy()
            );
            Ok(Negotiated {
                request,
                early_data: buf[consumed..].to_vec(),
            })
        }
        Err(HandshakeError::UnsupportedCommand(cmd)) => {
            warn!(
                "SOCKS4 command {} not supported",
                SocksCommand::from_byte(cmd)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| cmd.to_string())
            );
            send_reply(stream, SOCKS4_REPLY_REJECTED).await?;
            Err(HandshakeError::UnsupportedCommand(cmd).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Send a SOCKS4 reply with a zeroed address
pub async fn send_reply<S>(stream: &mut S, status: u8) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let reply = encode_socks4_reply(status, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
    stream.write_all(&reply).await?;
    stream.flush().await
}
