//! reverb: an HTTP/1.1 echo server
//!
//! Each connection carries exactly one request. The server assembles it
//! incrementally from the socket (headers end at the first blank line, the
//! body length comes from Content-Length), answers with a text/plain echo
//! of the body, and closes the connection.
//!
//! Features:
//! - Request framing tolerant of arbitrary chunk boundaries
//! - One task per connection with a bounded connection count
//! - Per-message size cap and read timeout
//! - Configuration via CLI arguments or TOML file

mod config;
mod protocol;
mod server;

use config::Config;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        backlog = config.backlog,
        max_message_size = config.max_message_size,
        read_timeout_secs = config.read_timeout_secs,
        "Starting reverb server"
    );

    Server::new(config).run().await
}
