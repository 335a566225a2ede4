//! The concurrent receiver: transport binding, accept/receive loops,
//! framing, parsing, record assembly and shutdown.
//!
//! One accept task per stream listener spawns one scan task per
//! accepted connection; each datagram socket runs one receive task
//! feeding a single shared parser task through a bounded queue.
//! Shutdown is cooperative: a cancellation token sampled at the top of
//! every loop, with `wait` draining the task tracker.

use std::io;
use std::net::SocketAddr;
#[cfg(unix)]
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use chrono::Utc;
use futures_util::StreamExt;
use socket2::SockRef;
use tokio::io::AsyncRead;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
#[cfg(unix)]
use tokio::net::UnixDatagram;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_util::codec::Decoder;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use siphon_parser::LogParts;

use crate::READ_BUFFER_SIZE;
use crate::error::ServerError;
use crate::format::{Format, FrameDecoder, OctetCounting};
use crate::handler::Handler;
use crate::metrics::{ServerMetrics, ServerMetricsSnapshot};
use crate::pool::BufferPool;
use crate::tls::{TlsPeerNameFn, default_tls_peer_name};

// =============================================================================
// Constants
// =============================================================================

/// Default capacity of the internal datagram queue. Producers block
/// when it fills, pushing back onto the kernel socket buffer.
const DEFAULT_DATAGRAM_QUEUE_SIZE: usize = 10;

/// Capacity of the error stream. Sends never block; errors past this
/// backlog are dropped.
const ERROR_CHANNEL_SIZE: usize = 64;

/// Pause after a transient datagram read error, to avoid a busy loop
/// while an interface is down.
const TRANSIENT_READ_DELAY: Duration = Duration::from_millis(10);

// =============================================================================
// Server
// =============================================================================

/// The syslog receiver.
///
/// Configure a [`Format`] and a [`Handler`], bind one or more
/// transports, then [`boot`](Server::boot). [`kill`](Server::kill)
/// closes the transports and signals every worker;
/// [`wait`](Server::wait) blocks until they have all drained.
pub struct Server {
    format: Option<Format>,
    handler: Option<Arc<dyn Handler>>,
    read_timeout: Option<Duration>,
    peer_name_fn: Arc<TlsPeerNameFn>,
    datagram_queue_size: usize,
    listeners: Vec<StreamListener>,
    packet_conns: Vec<PacketConn>,
    error_tx: mpsc::Sender<ServerError>,
    error_rx: Option<mpsc::Receiver<ServerError>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    pool: Arc<BufferPool>,
    metrics: Arc<ServerMetrics>,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    pub fn new() -> Self {
        let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_SIZE);
        Self {
            format: None,
            handler: None,
            read_timeout: None,
            peer_name_fn: Arc::new(default_tls_peer_name),
            datagram_queue_size: DEFAULT_DATAGRAM_QUEUE_SIZE,
            listeners: Vec::new(),
            packet_conns: Vec::new(),
            error_tx,
            error_rx: Some(error_rx),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            pool: Arc::new(BufferPool::new(READ_BUFFER_SIZE)),
            metrics: Arc::new(ServerMetrics::new()),
        }
    }

    /// Set the wire format. Required before [`boot`](Server::boot).
    pub fn set_format(&mut self, format: Format) {
        self.format = Some(format);
    }

    /// Set the record handler. Required before [`boot`](Server::boot).
    pub fn set_handler(&mut self, handler: impl Handler + 'static) {
        self.handler = Some(Arc::new(handler));
    }

    /// Per-read timeout for stream connections. `None` disables.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout.filter(|t| !t.is_zero());
    }

    /// Replace the TLS peer-name extractor. The default takes the
    /// subject common name of the first peer certificate and rejects
    /// connections without one.
    pub fn set_tls_peer_name_fn(
        &mut self,
        peer_name_fn: impl Fn(&tokio_rustls::rustls::ServerConnection) -> Option<String>
        + Send
        + Sync
        + 'static,
    ) {
        self.peer_name_fn = Arc::new(peer_name_fn);
    }

    /// Capacity of the internal datagram queue (default 10).
    pub fn set_datagram_queue_size(&mut self, size: usize) {
        self.datagram_queue_size = size.max(1);
    }

    /// Take the error stream. Asynchronous errors are sent without
    /// blocking; when the consumer falls behind, errors are dropped.
    pub fn errors(&mut self) -> Option<mpsc::Receiver<ServerError>> {
        self.error_rx.take()
    }

    /// Snapshot of the receiver counters.
    pub fn metrics(&self) -> ServerMetricsSnapshot {
        self.metrics.snapshot()
    }

    // =========================================================================
    // Transport binding
    // =========================================================================

    /// Bind a UDP socket. May be called multiple times.
    pub async fn listen_udp(&mut self, addr: &str) -> Result<(), ServerError> {
        let socket = UdpSocket::bind(addr).await.map_err(|source| ServerError::Bind {
            address: addr.to_string(),
            source,
        })?;
        self.grow_kernel_read_buffer(SockRef::from(&socket));
        tracing::info!(address = %addr, "listening on udp");
        self.packet_conns.push(PacketConn::Udp(socket));
        Ok(())
    }

    /// Bind a unix datagram socket. May be called multiple times.
    #[cfg(unix)]
    pub fn listen_unixgram(&mut self, path: impl AsRef<Path>) -> Result<(), ServerError> {
        let path = path.as_ref();
        let socket = UnixDatagram::bind(path).map_err(|source| ServerError::Bind {
            address: path.display().to_string(),
            source,
        })?;
        self.grow_kernel_read_buffer(SockRef::from(&socket));
        tracing::info!(path = %path.display(), "listening on unix datagram socket");
        self.packet_conns.push(PacketConn::Unix(socket));
        Ok(())
    }

    /// Bind a plain TCP listener. May be called multiple times.
    pub async fn listen_tcp(&mut self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            address: addr.to_string(),
            source,
        })?;
        tracing::info!(address = %addr, "listening on tcp");
        self.listeners.push(StreamListener {
            listener,
            tls: None,
        });
        Ok(())
    }

    /// Bind a TCP listener that performs a TLS handshake on every
    /// accepted connection. May be called multiple times.
    pub async fn listen_tcp_tls(
        &mut self,
        addr: &str,
        tls_config: Arc<ServerConfig>,
    ) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            address: addr.to_string(),
            source,
        })?;
        tracing::info!(address = %addr, "listening on tcp+tls");
        self.listeners.push(StreamListener {
            listener,
            tls: Some(TlsAcceptor::from(tls_config)),
        });
        Ok(())
    }

    /// Local addresses of the bound TCP listeners, in bind order.
    /// Useful after binding to port 0.
    pub fn tcp_local_addrs(&self) -> Vec<SocketAddr> {
        self.listeners
            .iter()
            .filter_map(|entry| entry.listener.local_addr().ok())
            .collect()
    }

    /// Local addresses of the bound UDP sockets, in bind order.
    pub fn udp_local_addrs(&self) -> Vec<SocketAddr> {
        self.packet_conns
            .iter()
            .filter_map(|conn| match conn {
                PacketConn::Udp(socket) => socket.local_addr().ok(),
                #[cfg(unix)]
                PacketConn::Unix(_) => None,
            })
            .collect()
    }

    /// The kernel buffer absorbs datagram bursts while the bounded
    /// internal queue applies backpressure. Failure is surfaced but
    /// not fatal.
    fn grow_kernel_read_buffer(&self, socket: SockRef<'_>) {
        if let Err(err) = socket.set_recv_buffer_size(READ_BUFFER_SIZE) {
            tracing::warn!(error = %err, "failed to set SO_RCVBUF");
            let _ = self.error_tx.try_send(ServerError::Io(err));
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start serving. Fails if no format or no handler is configured.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn boot(&mut self) -> Result<(), ServerError> {
        let format = self.format.ok_or(ServerError::MissingFormat)?;
        let handler = self.handler.clone().ok_or(ServerError::MissingHandler)?;

        let shared = Arc::new(Shared {
            format,
            handler,
            read_timeout: self.read_timeout,
            error_tx: self.error_tx.clone(),
            metrics: Arc::clone(&self.metrics),
            cancel: self.cancel.clone(),
        });

        for entry in self.listeners.drain(..) {
            let accept_loop = AcceptLoop {
                listener: entry.listener,
                tls: entry.tls,
                peer_name_fn: Arc::clone(&self.peer_name_fn),
                shared: Arc::clone(&shared),
                tracker: self.tracker.clone(),
            };
            self.tracker.spawn(accept_loop.run());
        }

        if !self.packet_conns.is_empty() {
            let (queue_tx, queue_rx) = mpsc::channel(self.datagram_queue_size);

            let parser = DatagramParser {
                queue: queue_rx,
                pool: Arc::clone(&self.pool),
                shared: Arc::clone(&shared),
            };
            self.tracker.spawn(parser.run());

            for conn in self.packet_conns.drain(..) {
                let receiver = DatagramReceiver {
                    conn,
                    pool: Arc::clone(&self.pool),
                    queue: queue_tx.clone(),
                    shared: Arc::clone(&shared),
                };
                self.tracker.spawn(receiver.run());
            }
        }

        self.tracker.close();
        tracing::info!(format = ?format, "syslog server booted");
        Ok(())
    }

    /// Close all transports and signal shutdown.
    pub fn kill(&self) {
        tracing::info!("syslog server shutting down");
        self.cancel.cancel();
    }

    /// Block until every worker task has exited. Call after
    /// [`boot`](Server::boot).
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }
}

// =============================================================================
// Shared worker state
// =============================================================================

/// Configuration and channels shared by every worker task.
struct Shared {
    format: Format,
    handler: Arc<dyn Handler>,
    read_timeout: Option<Duration>,
    error_tx: mpsc::Sender<ServerError>,
    metrics: Arc<ServerMetrics>,
    cancel: CancellationToken,
}

impl Shared {
    /// Non-blocking error surfacing; a slow or absent consumer loses
    /// errors rather than stalling a worker.
    fn surface(&self, err: ServerError) {
        self.metrics.transport_error();
        let _ = self.error_tx.try_send(err);
    }
}

struct StreamListener {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
}

// =============================================================================
// Stream transports
// =============================================================================

struct AcceptLoop {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    peer_name_fn: Arc<TlsPeerNameFn>,
    shared: Arc<Shared>,
    tracker: TaskTracker,
}

impl AcceptLoop {
    async fn run(self) {
        loop {
            let accepted = tokio::select! {
                biased;
                _ = self.shared.cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer_addr)) => {
                    let connection = Connection {
                        stream,
                        peer_addr,
                        tls: self.tls.clone(),
                        peer_name_fn: Arc::clone(&self.peer_name_fn),
                        shared: Arc::clone(&self.shared),
                    };
                    self.tracker.spawn(connection.run());
                }
                Err(err) => {
                    if self.shared.cancel.is_cancelled() {
                        break;
                    }
                    self.shared.surface(ServerError::Io(err));
                }
            }
        }
    }
}

struct Connection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    tls: Option<TlsAcceptor>,
    peer_name_fn: Arc<TlsPeerNameFn>,
    shared: Arc<Shared>,
}

impl Connection {
    async fn run(self) {
        let client = self.peer_addr.to_string();
        match self.tls {
            None => scan_stream(self.stream, client, String::new(), &self.shared).await,
            Some(acceptor) => {
                // handshake up front so the peer name is known before
                // the first record
                let stream = match acceptor.accept(self.stream).await {
                    Ok(stream) => stream,
                    Err(err) => {
                        self.shared.surface(ServerError::TlsHandshake(err));
                        return;
                    }
                };
                let Some(tls_peer) = (self.peer_name_fn)(stream.get_ref().1) else {
                    tracing::debug!(client = %client, "TLS peer rejected, closing");
                    return;
                };
                scan_stream(stream, client, tls_peer, &self.shared).await;
            }
        }
    }
}

async fn scan_stream<S>(stream: S, client: String, tls_peer: String, shared: &Shared)
where
    S: AsyncRead + Unpin,
{
    shared.metrics.connection_opened();
    tracing::debug!(client = %client, "connection open");

    let mut framed =
        FramedRead::with_capacity(stream, shared.format.stream_decoder(), READ_BUFFER_SIZE);

    loop {
        let next = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            next = next_frame(&mut framed, shared.read_timeout) => next,
        };
        match next {
            Some(Ok(frame)) => parse_and_handle(&frame, &client, &tls_peer, shared),
            Some(Err(err)) => {
                shared.surface(err);
                break;
            }
            None => break,
        }
    }

    shared.metrics.connection_closed();
    tracing::debug!(client = %client, "connection closed");
}

/// One framed read, bounded by the configured read timeout. A timeout
/// closes the connection like any other read failure.
async fn next_frame<S>(
    framed: &mut FramedRead<S, FrameDecoder>,
    read_timeout: Option<Duration>,
) -> Option<Result<BytesMut, ServerError>>
where
    S: AsyncRead + Unpin,
{
    match read_timeout {
        Some(timeout) => match tokio::time::timeout(timeout, framed.next()).await {
            Ok(next) => next,
            Err(_) => Some(Err(ServerError::ReadTimeout)),
        },
        None => framed.next().await,
    }
}

// =============================================================================
// Datagram transports
// =============================================================================

enum PacketConn {
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixDatagram),
}

impl PacketConn {
    async fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, String)> {
        match self {
            PacketConn::Udp(socket) => socket
                .recv_from(buf)
                .await
                .map(|(len, addr)| (len, addr.to_string())),
            #[cfg(unix)]
            PacketConn::Unix(socket) => socket.recv_from(buf).await.map(|(len, addr)| {
                let client = addr
                    .as_pathname()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                (len, client)
            }),
        }
    }
}

/// A received datagram travelling through the internal queue. The
/// buffer is pool-owned and returned by the parser task.
struct Datagram {
    buf: Vec<u8>,
    len: usize,
    client: String,
}

struct DatagramReceiver {
    conn: PacketConn,
    pool: Arc<BufferPool>,
    queue: mpsc::Sender<Datagram>,
    shared: Arc<Shared>,
}

impl DatagramReceiver {
    async fn run(self) {
        loop {
            let mut buf = self.pool.acquire();
            let received = tokio::select! {
                biased;
                _ = self.shared.cancel.cancelled() => None,
                received = self.conn.recv(&mut buf) => Some(received),
            };
            let Some(received) = received else {
                self.pool.release(buf);
                break;
            };

            match received {
                Ok((len, client)) => {
                    let len = trim_trailing_control(&buf[..len]);
                    if len == 0 {
                        self.pool.release(buf);
                        continue;
                    }
                    self.shared.metrics.datagram_received();

                    match self.queue.send(Datagram { buf, len, client }).await {
                        Ok(()) => {}
                        Err(send_err) => {
                            // parser task is gone; shutting down
                            self.pool.release(send_err.0.buf);
                            break;
                        }
                    }
                }
                Err(err) => {
                    self.pool.release(buf);
                    let transient = matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    );
                    self.shared.surface(ServerError::Io(err));
                    if !transient {
                        break;
                    }
                    tokio::time::sleep(TRANSIENT_READ_DELAY).await;
                }
            }
        }
    }
}

/// Single parser task draining the datagram queue. Exits when every
/// receive loop has dropped its sender.
struct DatagramParser {
    queue: mpsc::Receiver<Datagram>,
    pool: Arc<BufferPool>,
    shared: Arc<Shared>,
}

impl DatagramParser {
    async fn run(mut self) {
        while let Some(datagram) = self.queue.recv().await {
            let payload = &datagram.buf[..datagram.len];
            if self.shared.format.uses_octet_counting() {
                // only the first frame of a datagram is taken;
                // malformed or incomplete frames are dropped
                if let Some(frame) = first_octet_frame(payload) {
                    parse_and_handle(&frame, &datagram.client, "", &self.shared);
                }
            } else {
                parse_and_handle(payload, &datagram.client, "", &self.shared);
            }
            self.pool.release(datagram.buf);
        }
    }
}

fn first_octet_frame(payload: &[u8]) -> Option<BytesMut> {
    let mut decoder = OctetCounting::new(READ_BUFFER_SIZE);
    let mut src = BytesMut::from(payload);
    decoder.decode_eof(&mut src).ok().flatten()
}

/// Strip trailing control bytes (NULs, newlines and friends) from a
/// datagram payload, returning the remaining length.
fn trim_trailing_control(data: &[u8]) -> usize {
    let mut len = data.len();
    while len > 0 && data[len - 1] < 32 {
        len -= 1;
    }
    len
}

// =============================================================================
// Record assembly
// =============================================================================

/// Parse one record, fill the receiver-owned fields and invoke the
/// handler. Parse errors go to both the handler and the error stream.
fn parse_and_handle(line: &[u8], client: &str, tls_peer: &str, shared: &Shared) {
    let (mut parts, err) = shared.format.parse(line);
    assemble(&mut parts, shared.format, client, tls_peer);

    if let Some(parse_err) = &err {
        shared.metrics.parse_error();
        let _ = shared.error_tx.try_send(ServerError::Parse(parse_err.clone()));
    }
    shared.metrics.message_received(line.len() as u64);

    shared.handler.handle(parts, line.len(), err);
}

fn assemble(parts: &mut LogParts, format: Format, client: &str, tls_peer: &str) {
    if parts.timestamp.is_none() {
        parts.timestamp = Some(Utc::now());
    }
    parts.client = client.to_owned();

    // RFC 3164 senders frequently omit the hostname; fall back to the
    // client address, truncated at the port separator.
    if parts.hostname.is_empty() && matches!(format, Format::Rfc3164 | Format::Automatic) {
        parts.hostname = match client.find(':') {
            Some(colon) if colon > 1 => client[..colon].to_string(),
            _ => client.to_string(),
        };
    }
    parts.tls_peer = tls_peer.to_owned();
}

#[cfg(test)]
#[path = "server_test.rs"]
mod server_test;
