//! SOCKS5 method selection
//!
//! Only the "no authentication" method is offered. Clients that do not list
//! it are told no method is acceptable and the session ends.
//!
//! ```text
//! +----+----------+----------+
//! |VER | NMETHODS | METHODS  |
//! +----+----------+----------+
//! | 1  |    1     | 1 to 255 |
//! +----+----------+----------+
//! ```

use super::consts::*;
use crate::error::{HandshakeError, SocksieError};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Authentication method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication required
    None,
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::None => SOCKS5_AUTH_METHOD_NONE,
        }
    }
}

/// Parse a method selection message
///
/// Returns the offered methods and the number of bytes the message occupied.
pub fn parse_methods(buf: &[u8]) -> Result<(&[u8], usize), HandshakeError> {
    if buf.len() < 2 {
        return Err(HandshakeError::HeaderTooShort(buf.len()));
    }
    if buf[0] != SOCKS5_VERSION {
        return Err(HandshakeError::UnknownVersion(buf[0]));
    }

    let end = 2 + buf[1] as usize;
    if buf.len() < end {
        return Err(HandshakeError::TruncatedRequest);
    }

    Ok((&buf[2..end], end))
}

/// Select the authentication method from those the client offers
pub fn select_auth_method(methods: &[u8]) -> Option<AuthMethod> {
    if methods.contains(&SOCKS5_AUTH_METHOD_NONE) {
        Some(AuthMethod::None)
    } else {
        None
    }
}

/// Answer the client's method selection
///
/// Writes `[05, 00]` when "no authentication" is offered and `[05, FF]`
/// otherwise. Returns the number of bytes of `buf` the message occupied.
pub async fn negotiate<S>(stream: &mut S, buf: &[u8]) -> Result<usize, SocksieError>
where
    S: AsyncWrite + Unpin,
{
    let (methods, consumed) = parse_methods(buf)?;
    let selected = select_auth_method(methods);

    stream
        .write_all(&[
            SOCKS5_VERSION,
            selected
                .map(|m| m.to_byte())
                .unwrap_or(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE),
        ])
        .await?;
    stream.flush().await?;

    match selected {
        Some(method) => {
            tracing::debug!("Authentication completed with method: {:?}", method);
            Ok(consumed)
        }
        None => Err(HandshakeError::NoAcceptableMethod.into()),
    }
}
