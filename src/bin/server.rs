//! katredis Server Binary
//!
//! Starts the TCP server for katredis.

use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use katredis::network::Server;
use katredis::{Config, Engine};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing_subscriber::{fmt, EnvFilter};

/// katredis Server
#[derive(Parser, Debug)]
#[command(name = "katredis-server")]
#[command(about = "RESP protocol server")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0")]
    listen: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 6379, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Maximum aggregate nesting depth accepted from clients
    #[arg(long, default_value = "128")]
    max_depth: usize,

    /// Maximum frame size in bytes
    #[arg(long, default_value = "536870912")]
    max_frame_size: usize,

    /// Idle read timeout in milliseconds (0 = wait forever)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Only speak RESP2 types plus Boolean, Double and Null
    #[arg(long)]
    no_extended_types: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,katredis=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let listen_addr = std::net::SocketAddr::new(args.listen, args.port).to_string();

    tracing::info!("katredis Server v{}", katredis::VERSION);
    tracing::info!("Listen address: {}", listen_addr);

    // Build config from args
    let config = Config::builder()
        .listen_addr(listen_addr)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .max_depth(args.max_depth)
        .max_frame_size(args.max_frame_size)
        .extended_types(!args.no_extended_types)
        .build();

    let engine = Arc::new(Engine::new(config.clone()));

    let mut server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // SIGINT / SIGTERM flip the server's shutdown flag
    let shutdown = server.shutdown_handle();
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&shutdown)) {
            tracing::warn!("Cannot install handler for signal {}: {}", signal, e);
        }
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
