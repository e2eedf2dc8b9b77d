//! Socksie - SOCKS4/SOCKS5 proxy over an SSH tunnel
//!
//! This is the main entry point for the Socksie application.

use anyhow::Result;
use clap::Parser;
use socksie::config::{load_config, Config, DialerType};
use socksie::server::run_server;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Socksie - SOCKS4/SOCKS5 proxy that dials targets through an SSH tunnel
#[derive(Parser, Debug)]
#[command(name = "socksie")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on for SOCKS clients
    #[arg(long)]
    listen: Option<String>,

    /// Port to listen on for SOCKS clients
    #[arg(short, long)]
    port: Option<u16>,

    /// SSH server hostname
    #[arg(long)]
    ssh_host: Option<String>,

    /// SSH server port
    #[arg(long)]
    ssh_port: Option<u16>,

    /// SSH username (defaults to $USER when the config file sets none)
    #[arg(long)]
    ssh_user: Option<String>,

    /// SSH password
    #[arg(long, env = "SOCKSIE_SSH_PASSWORD", hide_env_values = true)]
    ssh_password: Option<String>,

    /// Dial targets directly instead of through SSH
    #[arg(long)]
    direct: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(listen) = &self.listen {
            config.server.bind_addr = listen.clone();
        }
        if let Some(port) = self.port {
            config.server.bind_addr = with_port(&config.server.bind_addr, port);
        }
        if let Some(host) = &self.ssh_host {
            config.dialer.ssh.host = host.clone();
        }
        if let Some(port) = self.ssh_port {
            config.dialer.ssh.port = port;
        }
        if self.ssh_user.is_some() {
            config.dialer.ssh.user = self.ssh_user.clone();
        }
        if config.dialer.ssh.user.is_none() {
            config.dialer.ssh.user = std::env::var("USER").ok();
        }
        if self.ssh_password.is_some() {
            config.dialer.ssh.password = self.ssh_password.clone();
        }
        if self.direct {
            config.dialer.dialer_type = DialerType::Direct;
        }
    }
}

/// Replace the port of a `host:port` listen address
fn with_port(bind_addr: &str, port: u16) -> String {
    let host = match bind_addr.rsplit_once(':') {
        Some((host, _)) => host,
        None => bind_addr,
    };
    format!("{}:{}", host, port)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    // Load configuration
    let mut config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!("Configuration loaded from: {:?}", path);
            config
        }
        None => Config::default(),
    };
    args.apply(&mut config);

    info!("Socksie v{}", socksie::VERSION);
    match config.dialer.dialer_type {
        DialerType::Ssh => info!("SSH server: {}", config.dialer.ssh.server_addr()),
        DialerType::Direct => warn!("Direct mode: targets are dialed from this host"),
    }

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx_clone.send(true);
    });

    // Run the server
    run_server(config, shutdown_rx).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("Failed to setup SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    // On Windows, only handle Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C, shutting down...");
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_port() {
        assert_eq!(with_port("0.0.0.0:1080", 9050), "0.0.0.0:9050");
        assert_eq!(with_port("localhost", 1081), "localhost:1081");
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "socksie",
            "--listen",
            "127.0.0.1:1080",
            "--port",
            "9050",
            "--ssh-host",
            "bastion",
            "--ssh-user",
            "dfc",
            "--ssh-password",
            "secret",
            "--direct",
        ]);

        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.server.bind_addr, "127.0.0.1:9050");
        assert_eq!(config.dialer.ssh.host, "bastion");
        assert_eq!(config.dialer.ssh.user.as_deref(), Some("dfc"));
        assert_eq!(config.dialer.ssh.password.as_deref(), Some("secret"));
        assert_eq!(config.dialer.dialer_type, DialerType::Direct);
    }

    #[test]
    fn test_ssh_user_flag_overrides_file() {
        let mut config = Config::default();
        config.dialer.ssh.user = Some("alice".to_string());

        Args::parse_from(["socksie"]).apply(&mut config);
        assert_eq!(config.dialer.ssh.user.as_deref(), Some("alice"));

        Args::parse_from(["socksie", "--ssh-user", "bob"]).apply(&mut config);
        assert_eq!(config.dialer.ssh.user.as_deref(), Some("bob"));
    }
}
