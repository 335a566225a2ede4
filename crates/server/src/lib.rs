//! Concurrent syslog receiver.
//!
//! Accepts syslog messages over UDP, unix datagram sockets, TCP and
//! TCP+TLS, splits the byte stream into records according to the
//! configured [`Format`], parses each record with the
//! [`siphon-parser`](siphon_parser) family and delivers the resulting
//! [`LogParts`] to an application-supplied [`Handler`].
//!
//! # Design
//!
//! - **One task per loop** — one accept task per stream listener, one
//!   scan task per accepted connection, one receive task per datagram
//!   socket and a single shared parser task draining a bounded
//!   datagram queue.
//! - **Bounded buffers** — datagram reads go through a shared pool of
//!   900 KiB buffers, matched by the kernel receive buffer size;
//!   stream scanners cap frames at the same size.
//! - **Lossy error stream** — asynchronous errors are surfaced on a
//!   channel with non-blocking sends, so a slow consumer can never
//!   stall a worker.
//!
//! # Example
//!
//! ```no_run
//! use siphon_server::{Format, LogParts, ParseError, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new();
//!     server.set_format(Format::Automatic);
//!     server.set_handler(|parts: LogParts, _len: usize, _err: Option<ParseError>| {
//!         println!("{} {}: {}", parts.hostname, parts.tag, parts.content);
//!     });
//!     server.listen_udp("0.0.0.0:514").await?;
//!     server.listen_tcp("0.0.0.0:514").await?;
//!     server.boot()?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

mod error;
mod format;
mod handler;
mod metrics;
mod pool;
mod server;
mod tls;

pub use error::ServerError;
pub use format::Format;
pub use handler::Handler;
pub use metrics::{ServerMetrics, ServerMetricsSnapshot};
pub use server::Server;
pub use tls::{TlsPeerNameFn, default_tls_peer_name};

// Re-exported so applications can build TLS configs and inspect
// records without naming the underlying crates.
pub use siphon_parser::{LogParts, ParseError, Priority};
pub use tokio_rustls::rustls;

/// Read buffer size for stream scanners, datagram reads and the
/// kernel receive buffer: 900 KiB.
pub(crate) const READ_BUFFER_SIZE: usize = 900 * 1024;
