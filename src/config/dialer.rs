//! Dialer configuration types
//!
//! Defines how outbound connections are opened (SSH tunnel or direct TCP).

use serde::{Deserialize, Serialize};

/// Dialer type enumeration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialerType {
    /// Dial through an authenticated SSH session
    #[default]
    #[serde(rename = "ssh")]
    Ssh,
    /// Dial directly from the local host
    #[serde(rename = "direct")]
    Direct,
}

/// Main dialer configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DialerConfig {
    /// Dialer type
    #[serde(rename = "type", default)]
    pub dialer_type: DialerType,

    /// TCP options for direct dials
    #[serde(default)]
    pub tcp: TcpConfig,

    /// SSH tunnel configuration
    #[serde(default)]
    pub ssh: SshConfig,
}

/// Default keepalive seconds
fn default_keepalive_secs() -> u64 {
    20
}

/// Default keepalive interval
fn default_keepalive_interval() -> u64 {
    8
}

/// Default connect timeout in seconds
fn default_connect_timeout() -> u64 {
    10
}

fn default_nodelay() -> bool {
    true
}

/// TCP options for direct dials
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive timeout in seconds
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// TCP keepalive interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

fn default_ssh_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_use_agent() -> bool {
    true
}

/// SSH tunnel configuration
#[derive(Serialize, Deserialize, Clone)]
pub struct SshConfig {
    /// SSH server hostname
    #[serde(default = "default_ssh_host")]
    pub host: String,

    /// SSH server port
    #[serde(default = "default_ssh_port")]
    pub port: u16,

    /// SSH username
    #[serde(default)]
    pub user: Option<String>,

    /// SSH password, tried after the agent
    #[serde(default)]
    pub password: Option<String>,

    /// Try keys from the agent at `SSH_AUTH_SOCK` first
    #[serde(default = "default_use_agent")]
    pub use_agent: bool,

    /// Expected server key fingerprint (e.g. "SHA256:..."); any key is accepted when unset
    #[serde(default)]
    pub host_key_fingerprint: Option<String>,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        SshConfig {
            host: default_ssh_host(),
            port: default_ssh_port(),
            user: None,
            password: None,
            use_agent: default_use_agent(),
            host_key_fingerprint: None,
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl SshConfig {
    /// `host:port` of the SSH server
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether at least one authentication method is enabled
    pub fn has_auth_method(&self) -> bool {
        self.use_agent || self.password.is_some()
    }
}

// Keep the password out of logs
impl std::fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("use_agent", &self.use_agent)
            .field("host_key_fingerprint", &self.host_key_fingerprint)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialer_type_default() {
        assert_eq!(DialerType::default(), DialerType::Ssh);
    }

    #[test]
    fn test_tcp_config_default() {
        let config = TcpConfig::default();
        assert!(config.nodelay);
        assert_eq!(config.keepalive_secs, 20);
        assert_eq!(config.keepalive_interval, 8);
        assert_eq!(config.connect_timeout, 10);
    }

    #[test]
    fn test_ssh_config_default() {
        let config = SshConfig::default();
        assert_eq!(config.server_addr(), "127.0.0.1:22");
        assert!(config.user.is_none());
        assert!(config.use_agent);
        assert!(config.has_auth_method());
        assert!(config.host_key_fingerprint.is_none());
    }

    #[test]
    fn test_ssh_config_auth_methods() {
        let config = SshConfig {
            use_agent: false,
            ..Default::default()
        };
        assert!(!config.has_auth_method());

        let config = SshConfig {
            use_agent: false,
            password: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(config.has_auth_method());
    }

    #[test]
    fn test_ssh_config_debug_redacts_password() {
        let config = SshConfig {
            user: Some("dfc".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("<redacted>"));
        assert!(!debug_str.contains("hunter2"));
    }
}
