//! SSH tunnel dialer
//!
//! Holds one authenticated SSH session for the life of the process and opens
//! a `direct-tcpip` channel per CONNECT request, so targets are reached from
//! the SSH server's side of the network.

use super::Dialer;
use crate::config::SshConfig;
use crate::error::SocksieError;
use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::keys::{HashAlg, PublicKey};
use russh::ChannelStream;
use std::fmt;
use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client-side session handler; only checks the server key
struct TunnelClient {
    expected_fingerprint: Option<String>,
}

impl client::Handler for TunnelClient {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();

        match &self.expected_fingerprint {
            Some(expected) if *expected != fingerprint => {
                warn!(
                    "SSH server key mismatch: expected {}, got {}",
                    expected, fingerprint
                );
                Ok(false)
            }
            Some(_) => Ok(true),
            None => {
                debug!("Accepting unpinned SSH server key {}", fingerprint);
                Ok(true)
            }
        }
    }
}

/// Dialer that tunnels connections through an SSH session
pub struct SshDialer {
    handle: Handle<TunnelClient>,
    server: String,
}

impl fmt::Debug for SshDialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshDialer")
            .field("server", &self.server)
            .finish()
    }
}

impl SshDialer {
    /// Connect and authenticate to the SSH server
    ///
    /// Keys held by the SSH agent are tried first, then the password.
    pub async fn connect(config: &SshConfig) -> Result<Self, SocksieError> {
        let user = config
            .user
            .clone()
            .ok_or_else(|| SocksieError::Config("SSH dialer requires a user".to_string()))?;
        if !config.has_auth_method() {
            return Err(SocksieError::Config(
                "SSH dialer needs the agent or a password".to_string(),
            ));
        }

        let server = config.server_addr();
        let handler = TunnelClient {
            expected_fingerprint: config.host_key_fingerprint.clone(),
        };
        let ssh_config = Arc::new(client::Config::default());

        let mut handle = tokio::time::timeout(
            Duration::from_secs(config.connect_timeout),
            client::connect(ssh_config, server.as_str(), handler),
        )
        .await
        .map_err(|_| SocksieError::Tunnel(format!("Connection timeout to [{}]", server)))?
        .map_err(|e| SocksieError::Tunnel(format!("Unable to connect to [{}]: {}", server, e)))?;

        let mut authenticated =
            config.use_agent && authenticate_with_agent(&mut handle, &user).await;

        if !authenticated {
            if let Some(password) = &config.password {
                let auth = handle
                    .authenticate_password(user.clone(), password.clone())
                    .await
                    .map_err(|e| {
                        SocksieError::Tunnel(format!("Password authentication failed: {}", e))
                    })?;
                authenticated = auth.success();
            }
        }

        if !authenticated {
            return Err(SocksieError::Tunnel(format!(
                "SSH authentication rejected for user {}",
                user
            )));
        }

        info!("SSH session established to [{}] as {}", server, user);

        Ok(SshDialer { handle, server })
    }

    /// Address of the SSH server this dialer tunnels through
    pub fn server(&self) -> &str {
        &self.server
    }
}

/// Offer each agent identity until the server accepts one
#[cfg(unix)]
async fn authenticate_with_agent(handle: &mut Handle<TunnelClient>, user: &str) -> bool {
    use russh::keys::agent::client::AgentClient;

    let mut agent = match AgentClient::connect_env().await {
        Ok(agent) => agent,
        Err(e) => {
            debug!("SSH agent unavailable: {}", e);
            return false;
        }
    };

    let identities = match agent.request_identities().await {
        Ok(identities) => identities,
        Err(e) => {
            warn!("Failed to list SSH agent identities: {}", e);
            return false;
        }
    };

    let hash_alg = handle.best_supported_rsa_hash().await.ok().flatten().flatten();

    for key in identities {
        let fingerprint = key.fingerprint(HashAlg::Sha256);
        match handle
            .authenticate_publickey_with(user, key, hash_alg, &mut agent)
            .await
        {
            Ok(auth) if auth.success() => {
                debug!("Authenticated with agent key {}", fingerprint);
                return true;
            }
            Ok(_) => debug!("Agent key {} rejected", fingerprint),
            Err(e) => debug!("Agent key {} failed: {}", fingerprint, e),
        }
    }

    false
}

#[cfg(not(unix))]
async fn authenticate_with_agent(_handle: &mut Handle<TunnelClient>, _user: &str) -> bool {
    false
}

#[async_trait]
impl Dialer for SshDialer {
    type Stream = Pin<Box<ChannelStream<Msg>>>;

    async fn dial_tcp(&self, origin: SocketAddr, target: SocketAddrV4) -> io::Result<Self::Stream> {
        let channel = self
            .handle
            .channel_open_direct_tcpip(
                target.ip().to_string(),
                u32::from(target.port()),
                origin.ip().to_string(),
                u32::from(origin.port()),
            )
            .await
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("Failed to open SSH channel to {}: {}", target, e),
                )
            })?;

        debug!("SSH channel opened to {} for {}", target, origin);

        Ok(Box::pin(channel.into_stream()))
    }
}
