//! TCP server for handling echo connections.
//!
//! Accepts connections, assembles one HTTP request per connection via the
//! framer, writes back the echo response, and closes. The read loop is
//! generic over the stream so framing can be exercised against scripted
//! byte sequences without opening sockets.

use crate::config::Config;
use crate::protocol::framer::{FrameResult, Framer};
use crate::protocol::request::Request;
use crate::protocol::responder;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Maximum number of concurrent connections
const MAX_CONNECTIONS: usize = 10000;

/// Read buffer size
const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Per-connection limits resolved from config.
#[derive(Debug, Clone, Copy)]
struct Limits {
    max_message_size: usize,
    read_timeout: Option<Duration>,
}

/// Server instance
pub struct Server {
    config: Config,
    connection_limit: Arc<Semaphore>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Server {
            config,
            connection_limit: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        }
    }

    /// Start the server and begin accepting connections
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = self.bind()?;
        self.serve(listener).await
    }

    /// Build the listener. Goes through socket2 because tokio's bind does
    /// not expose the listen backlog.
    fn bind(&self) -> std::io::Result<TcpListener> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(self.config.backlog)?;
        socket.set_nonblocking(true)?;

        TcpListener::from_std(socket.into())
    }

    /// Accept connections until the process is externally terminated.
    async fn serve(&self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let address = listener.local_addr()?;
        info!(address = %address, "Server listening");

        let limits = Limits {
            max_message_size: self.config.max_message_size,
            read_timeout: self.config.read_timeout(),
        };

        loop {
            // Wait for a connection slot
            let permit = self.connection_limit.clone().acquire_owned().await?;

            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "New connection");

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, limits).await {
                            debug!(error = %e, "Connection error");
                        }
                        drop(permit);
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Handle a single client connection: frame one request, echo it, close.
async fn handle_connection(mut stream: TcpStream, limits: Limits) -> std::io::Result<()> {
    let request = match read_request(&mut stream, limits).await? {
        Some(request) => request,
        // The stream ended before the header section completed; there is
        // nothing to echo.
        None => {
            debug!("Connection closed before a request was framed");
            return Ok(());
        }
    };

    debug!(
        method = %request.line.method,
        path = %request.line.path,
        version = %request.line.version,
        body_len = request.body.len(),
        "Request framed"
    );

    let response = responder::render(&request);
    stream.write_all(&response).await?;
    stream.shutdown().await?;

    Ok(())
}

/// Drive the framer with successive reads until a full request arrives.
///
/// End-of-stream or a read timeout before completion salvages whatever the
/// framer captured: a request with a clipped body if the headers completed,
/// `None` otherwise. An oversized message also yields `None`.
async fn read_request<R>(reader: &mut R, limits: Limits) -> std::io::Result<Option<Request>>
where
    R: AsyncRead + Unpin,
{
    let mut framer = Framer::new(limits.max_message_size);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = match limits.read_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, reader.read(&mut chunk)).await {
                Ok(result) => result?,
                Err(_) => {
                    debug!("Read timed out");
                    return Ok(framer.take_partial());
                }
            },
            None => reader.read(&mut chunk).await?,
        };

        if n == 0 {
            // EOF before the message completed
            return Ok(framer.take_partial());
        }

        match framer.feed(&chunk[..n]) {
            Ok(FrameResult::Complete(request)) => return Ok(Some(request)),
            Ok(FrameResult::NeedData) => {}
            Err(e) => {
                warn!(error = %e, "Dropping connection");
                return Ok(None);
            }
        }
    }
}
