//! Receiver metrics: lock-free counters updated from the worker tasks
//! plus a consistent-enough snapshot for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by all receiver workers.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Currently open stream connections.
    pub connections_active: AtomicU64,

    /// Total stream connections accepted.
    pub connections_total: AtomicU64,

    /// Records handed to the handler.
    pub messages_received: AtomicU64,

    /// Payload bytes handed to the handler.
    pub bytes_received: AtomicU64,

    /// Datagrams enqueued for parsing.
    pub datagrams_received: AtomicU64,

    /// Records delivered together with a parse error.
    pub parse_errors: AtomicU64,

    /// Transport-level errors surfaced on the error stream.
    pub transport_errors: AtomicU64,
}

impl ServerMetrics {
    pub const fn new() -> Self {
        Self {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            datagrams_received: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn message_received(&self, bytes: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn datagram_received(&self) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of all counters.
    pub fn snapshot(&self) -> ServerMetricsSnapshot {
        ServerMetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`ServerMetrics`].
#[derive(Debug, Clone, Copy)]
pub struct ServerMetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub messages_received: u64,
    pub bytes_received: u64,
    pub datagrams_received: u64,
    pub parse_errors: u64,
    pub transport_errors: u64,
}
