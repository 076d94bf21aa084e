//! Worklink RPC Server - JSON-RPC backend for the marketplace frontend.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the worklink
//! library for the web frontend.

mod handlers;
mod server;
mod wrapper;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "worklink-rpc")]
#[command(about = "JSON-RPC server for the Worklink marketplace")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Data directory (defaults to ./worklink-data)
    #[arg(long)]
    data_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Worklink RPC Server");

    let data_root = args.data_root.unwrap_or_else(|| {
        std::env::current_dir()
            .map(|d| d.join(worklink::config::PathsConfig::DATA_DIR_NAME))
            .unwrap_or_else(|_| PathBuf::from(worklink::config::PathsConfig::DATA_DIR_NAME))
    });
    info!("Data root: {}", data_root.display());

    let api = worklink::WorklinkApi::open(&data_root)?;

    // Seed the first admin from the environment on a fresh deployment.
    match (
        std::env::var("WORKLINK_ADMIN_EMAIL"),
        std::env::var("WORKLINK_ADMIN_PASSWORD"),
    ) {
        (Ok(email), Ok(password)) => {
            match api.bootstrap_admin("Administrator", &email, &password) {
                Ok(Some(user)) => info!("Created initial admin {}", user.email),
                Ok(None) => {}
                Err(e) => warn!("Admin bootstrap failed: {}", e),
            }
        }
        _ => {}
    }

    let addr = server::start_server(api, &args.host, args.port).await?;

    // Print port for the frontend supervisor to read (intentional stdout)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
