use clap::Parser;
use env_logger::Env;
use log::info;
use server::config::{ServerConfig, DEFAULT_TICK_RATE};
use server::network::Server;
use shared::{DEFAULT_PORT, MAX_IDENTS};
use std::io;
use std::net::ToSocketAddrs;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address or hostname to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value_t = DEFAULT_TICK_RATE)]
    tick_rate: u32,
    /// Maximum number of connected players
    #[clap(short, long, default_value_t = MAX_IDENTS)]
    capacity: usize,
}

/// Main-method of the application.
/// Parses command-line arguments, binds the server socket and ticks until Ctrl+C.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let bind = (args.host.as_str(), args.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("Could not resolve {}:{}", args.host, args.port),
            )
        })?;

    let config = ServerConfig {
        bind,
        tick_rate: args.tick_rate,
        capacity: args.capacity,
    };

    info!(
        "Starting server on {} at {}Hz (capacity {})",
        config.bind, config.tick_rate, config.capacity
    );

    let mut server = Server::bind(config)?;
    server.run().await?;

    info!("Server stopped");
    Ok(())
}
