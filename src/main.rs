//! Message Center notification log server
//!
//! A single-process server that keeps the message center state (grouped,
//! deduplicated notifications with read/unread tracking and panel
//! visibility) and exposes it over JSON-RPC 2.0 via WebSocket. Every state
//! change is pushed to all connected clients.
//!
//! Usage:
//!   message-center                         # Default port 7171
//!   message-center --port 0                # OS-assigned port
//!   message-center --config mc.jsonc       # Load settings from a JSONC file
//!   message-center --log-file              # Log to ~/.message-center/logs/server.log

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mc_server::MessageCenterServer;
use mc_services::MessageCenterService;
use mc_transport::TransportServer;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Overrides, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "message-center", version, about = "Message Center notification server")]
struct Cli {
    /// Port to listen on (0 for OS-assigned) [default: 7171]
    #[arg(long)]
    port: Option<u16>,

    /// Hostname to bind to [default: 127.0.0.1]
    #[arg(long)]
    hostname: Option<String>,

    /// Maximum concurrent connections [default: 32]
    #[arg(long)]
    max_connections: Option<usize>,

    /// Allow cross-origin browser clients
    #[arg(long)]
    cors: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// JSONC config file; flags given on the command line take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to a file (defaults to ~/.message-center/logs/server.log if no path given)
    #[arg(long, default_missing_value = "DEFAULT", num_args = 0..=1)]
    log_file: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            hostname: self.hostname.clone(),
            max_connections: self.max_connections,
            enable_cors: self.cors,
        }
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let Some(ref log_file_arg) = cli.log_file else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(());
    };

    let log_path = if log_file_arg == "DEFAULT" {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".message-center/logs/server.log")
    } else {
        PathBuf::from(log_file_arg)
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    eprintln!("Logging to {}", log_path.display());
    Ok(())
}

/// Resolves on Ctrl+C, or when stdin closes (the parent process is gone).
async fn shutdown_signal() {
    let stdin_closed = Arc::new(tokio::sync::Notify::new());
    {
        let notify = stdin_closed.clone();
        std::thread::spawn(move || {
            use std::io::Read;
            let mut buf = [0u8; 1];
            loop {
                match std::io::stdin().read(&mut buf) {
                    Ok(0) | Err(_) => {
                        notify.notify_one();
                        return;
                    }
                    Ok(_) => continue,
                }
            }
        });
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = stdin_closed.notified() => {
            eprintln!("stdin closed, shutting down");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = ServerConfig::load(cli.config.as_deref())?.with_overrides(cli.overrides());

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Message Center Server                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    if let Some(ref path) = cli.config {
        println!("  Config:     {}", path.display());
    }
    println!("  Port:       {}", config.port);
    println!("  Binding:    {}", config.hostname);
    println!("  CORS:       {}", if config.enable_cors { "enabled" } else { "disabled" });
    println!();

    // Shared notification channel: services publish, every connection receives
    let (notification_tx, _) = broadcast::channel::<String>(1024);

    let mut server = MessageCenterServer::new();
    server.set_notification_sender(notification_tx.clone());

    let message_center = MessageCenterService::new();
    if let Some(notify) = server.notifier() {
        message_center.set_notify_sender(notify);
    }
    server.register_service(message_center);

    server
        .initialize()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize server: {e}"))?;

    let server = Arc::new(server);
    let mut transport =
        TransportServer::start_with_sender(config.transport(cli.verbose), server.clone(), notification_tx)
            .await
            .context("Failed to start transport")?;

    let ws_url = format!("ws://{}:{}/ws", config.hostname, transport.port());
    info!("Message center ready at {ws_url}");

    println!("────────────────────────────────────────────────────────────────");
    println!();
    println!("  Server running!");
    println!();
    println!("  WebSocket endpoint:");
    println!("    {ws_url}");
    println!();
    println!("  Health check:");
    println!("    http://{}:{}/health", config.hostname, transport.port());
    println!();
    println!("────────────────────────────────────────────────────────────────");
    println!();
    println!("  Press Ctrl+C to stop.");
    println!();

    shutdown_signal().await;

    println!();
    println!("  Shutting down...");
    transport.stop().await;

    // The transport held the other handle; shut services down if we are the last owner
    match Arc::try_unwrap(server) {
        Ok(mut server) => server.shutdown().await,
        Err(server) => warn!(
            handles = Arc::strong_count(&server),
            "Server still referenced after transport stop; skipping service shutdown"
        ),
    }

    println!("  Server stopped.");
    Ok(())
}
