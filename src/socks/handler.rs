//! Per-connection SOCKS handler
//!
//! Reads the first buffer from an accepted client, dispatches on the
//! version byte, dials the negotiated target and hands both streams to the
//! relay.
//!
//! # Session Flow
//!
//! 1. Initial read (bounded by the handshake buffer size)
//! 2. SOCKS4 or SOCKS5 handshake
//! 3. Dial through the configured [`Dialer`]
//! 4. Success or failure reply
//! 5. Relay until both directions finish

use super::codec::encode_reply;
use super::consts::*;
use super::tcp_relay::{relay_tcp, RelayStats};
use super::types::SocksVersion;
use super::{v4, v5};
use crate::dialer::{Dialer, Resolver};
use crate::error::{HandshakeError, Socks5ReplyCode, SocksieError};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Handles SOCKS sessions using a shared dialer and resolver
#[derive(Debug)]
pub struct SocksHandler<D> {
    dialer: Arc<D>,
    resolver: Arc<dyn Resolver>,
    buffer_size: usize,
}

impl<D> Clone for SocksHandler<D> {
    fn clone(&self) -> Self {
        SocksHandler {
            dialer: self.dialer.clone(),
            resolver: self.resolver.clone(),
            buffer_size: self.buffer_size,
        }
    }
}

impl<D: Dialer> SocksHandler<D> {
    /// Create a handler with the default handshake buffer size
    pub fn new(dialer: Arc<D>, resolver: Arc<dyn Resolver>) -> Self {
        SocksHandler {
            dialer,
            resolver,
            buffer_size: DEFAULT_HANDSHAKE_BUFFER_SIZE,
        }
    }

    /// Set the maximum size of a single handshake read
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// The dialer used for outbound connections
    pub fn dialer(&self) -> &Arc<D> {
        &self.dialer
    }

    /// Serve one client connection to completion
    ///
    /// Returns the relay statistics when the session reached the relay
    /// phase. Every other exit is an error; the client stream is dropped
    /// (and so closed) on all paths.
    pub async fn handle<S>(&self, mut stream: S, peer: SocketAddr) -> Result<RelayStats, SocksieError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut buf = vec![0u8; self.buffer_size];
        let n = stream.read(&mut buf).await?;
        buf.truncate(n);

        if n < 2 {
            return Err(HandshakeError::HeaderTooShort(n).into());
        }

        let version = match SocksVersion::from_byte(buf[0]) {
            Some(version) => version,
            None => return Err(HandshakeError::UnknownVersion(buf[0]).into()),
        };

        let negotiated = match version {
            SocksVersion::V4 => v4::handshake(&mut stream, &buf).await?,
            SocksVersion::V5 => {
                v5::handshake(&mut stream, &buf, self.resolver.as_ref(), self.buffer_size).await?
            }
        };

        let destination = negotiated.request.destination;

        let mut target = match self.dialer.dial_tcp(peer, destination).await {
            Ok(target) => target,
            Err(e) => {
                warn!("SOCKS{} dial to {} failed: {}", version, destination, e);
                if let Err(write_err) = send_failure(&mut stream, version, &e).await {
                    debug!("Failed to send failure reply to {}: {}", peer, write_err);
                }
                return Err(SocksieError::Dial(e));
            }
        };

        send_success(&mut stream, version, destination).await?;

        if !negotiated.early_data.is_empty() {
            debug!(
                "Forwarding {} bytes received with the request",
                negotiated.early_data.len()
            );
            target.write_all(&negotiated.early_data).await?;
        }

        info!(
            "SOCKS{} {} tunnel established {} -> {}",
            version, negotiated.request.command, peer, negotiated.request.target
        );

        Ok(relay_tcp(stream, target).await)
    }
}

async fn send_success<S>(stream: &mut S, version: SocksVersion, destination: SocketAddrV4) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let reply = match version {
        SocksVersion::V4 => encode_reply(
            version,
            SOCKS4_REPLY_GRANTED,
            SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
        ),
        SocksVersion::V5 => encode_reply(version, Socks5ReplyCode::Succeeded.into(), destination),
    };
    stream.write_all(&reply).await?;
    stream.flush().await
}

async fn send_failure<S>(stream: &mut S, version: SocksVersion, err: &io::Error) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    match version {
        SocksVersion::V4 => v4::send_reply(stream, SOCKS4_REPLY_REJECTED).await,
        SocksVersion::V5 => {
            v5::send_reply(
                stream,
                Socks5ReplyCode::from(err),
                SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
            )
            .await
        }
    }
}
