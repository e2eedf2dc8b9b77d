//! Bidirectional TCP relay
//!
//! Copies bytes between the client and the target until both directions
//! have finished. A direction finishes when its source reaches EOF or fails;
//! the peer's write half is then shut down so the other side sees the EOF
//! while the reverse direction keeps running.

use super::consts::DEFAULT_BUFFER_SIZE;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Outcome of one copy direction
#[derive(Debug, Default)]
pub struct DirectionStats {
    /// Bytes written to the destination
    pub bytes: u64,
    /// Error that ended the direction, if it did not end on EOF
    pub error: Option<io::Error>,
}

/// Outcome of a relay session
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Client to target
    pub client_to_target: DirectionStats,
    /// Target to client
    pub target_to_client: DirectionStats,
}

impl RelayStats {
    /// Total bytes moved in both directions
    pub fn total_bytes(&self) -> u64 {
        self.client_to_target.bytes + self.target_to_client.bytes
    }
}

/// Relay data bidirectionally between two streams
///
/// Returns once both directions have completed. Both streams are dropped
/// before returning, which closes them.
pub async fn relay_tcp<A, B>(client: A, target: B) -> RelayStats
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut target_read, mut target_write) = tokio::io::split(target);

    let (client_to_target, target_to_client) = tokio::join!(
        copy_half("client->target", &mut client_read, &mut target_write),
        copy_half("target->client", &mut target_read, &mut client_write),
    );

    RelayStats {
        client_to_target,
        target_to_client,
    }
}

async fn copy_half<R, W>(direction: &str, reader: &mut R, writer: &mut W) -> DirectionStats
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = DirectionStats::default();
    let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                stats.error = Some(e);
                break;
            }
        };

        if let Err(e) = writer.write_all(&buf[..n]).await {
            stats.error = Some(e);
            break;
        }
        stats.bytes += n as u64;
    }

    // The peer may already be gone; that is not an error for this direction
    if let Err(e) = writer.shutdown().await {
        debug!("{} shutdown: {}", direction, e);
    }

    match &stats.error {
        Some(e) => debug!("{} finished after {} bytes: {}", direction, stats.bytes, e),
        None => debug!("{} finished: {} bytes", direction, stats.bytes),
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_relay_tcp_both_directions() {
        let (mut client, client_side) = duplex(1024);
        let (target_side, mut target) = duplex(1024);

        let relay = tokio::spawn(relay_tcp(client_side, target_side));

        client.write_all(b"hello from client").await.unwrap();
        let mut buf = [0u8; 17];
        target.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello from client");

        target.write_all(b"hello from target").await.unwrap();
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello from target");

        drop(client);
        drop(target);

        let stats = relay.await.unwrap();
        assert_eq!(stats.client_to_target.bytes, 17);
        assert_eq!(stats.target_to_client.bytes, 17);
        assert_eq!(stats.total_bytes(), 34);
    }

    #[tokio::test]
    async fn test_relay_waits_for_both_directions() {
        let (mut client, client_side) = duplex(1024);
        let (target_side, mut target) = duplex(1024);

        let relay = tokio::spawn(relay_tcp(client_side, target_side));

        client.write_all(b"request").await.unwrap();
        client.shutdown().await.unwrap();

        // Target sees the request followed by EOF
        let mut request = Vec::new();
        target.read_to_end(&mut request).await.unwrap();
        assert_eq!(request, b"request");

        // Client direction is done but the target is still sending
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!relay.is_finished());

        target.write_all(b"response part 1, ").await.unwrap();
        target.write_all(b"response part 2").await.unwrap();
        target.shutdown().await.unwrap();

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert_eq!(response, b"response part 1, response part 2");

        let stats = relay.await.unwrap();
        assert_eq!(stats.client_to_target.bytes, 7);
        assert_eq!(stats.target_to_client.bytes, 32);
        assert!(stats.client_to_target.error.is_none());
    }

    #[tokio::test]
    async fn test_relay_large_transfer() {
        let (mut client, client_side) = duplex(4096);
        let (target_side, mut target) = duplex(4096);

        let relay = tokio::spawn(relay_tcp(client_side, target_side));

        let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let writer = tokio::spawn(async move {
            client.write_all(&payload).await.unwrap();
            client.shutdown().await.unwrap();
            client
        });

        let mut received = Vec::new();
        target.read_to_end(&mut received).await.unwrap();
        assert_eq!(received.len(), expected.len());
        assert_eq!(received, expected);

        let client = writer.await.unwrap();
        drop(client);
        drop(target);

        let stats = relay.await.unwrap();
        assert_eq!(stats.client_to_target.bytes, expected.len() as u64);
    }

    #[tokio::test]
    async fn test_relay_empty_session() {
        let (client, client_side) = duplex(64);
        let (target_side, target) = duplex(64);

        drop(client);
        drop(target);

        let stats = relay_tcp(client_side, target_side).await;
        assert_eq!(stats.total_bytes(), 0);
    }
}
