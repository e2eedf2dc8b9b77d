//! Server configuration types
//!
//! Defines the root configuration and the SOCKS listener settings.

use super::{DialerConfig, DialerType};
use crate::error::SocksieError;
use crate::socks::{DEFAULT_HANDSHAKE_BUFFER_SIZE, SOCKS5_REPLY_LEN};
use serde::{Deserialize, Serialize};

/// Default listen address
fn default_bind_addr() -> String {
    "0.0.0.0:1080".to_string()
}

fn default_handshake_buffer_size() -> usize {
    DEFAULT_HANDSHAKE_BUFFER_SIZE
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// SOCKS listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound dialer configuration
    #[serde(default)]
    pub dialer: DialerConfig,
}

/// SOCKS listener configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to accept SOCKS clients on (e.g., "0.0.0.0:1080")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Maximum size of a single handshake read
    #[serde(default = "default_handshake_buffer_size")]
    pub handshake_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            handshake_buffer_size: default_handshake_buffer_size(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SocksieError> {
        // Must at least hold an IPv4 SOCKS5 request
        if self.server.handshake_buffer_size < SOCKS5_REPLY_LEN {
            return Err(SocksieError::Config(format!(
                "handshake_buffer_size must be at least {} bytes",
                SOCKS5_REPLY_LEN
            )));
        }

        if self.dialer.dialer_type == DialerType::Ssh {
            let ssh = &self.dialer.ssh;
            if ssh.user.is_none() {
                return Err(SocksieError::Config("SSH dialer requires a user".to_string()));
            }
            if !ssh.has_auth_method() {
                return Err(SocksieError::Config(
                    "SSH dialer needs the agent or a password".to_string(),
                ));
            }
        }

        Ok(())
    }
}
