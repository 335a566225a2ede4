//! Pooled read buffers for datagram sockets.

use parking_lot::Mutex;

/// Free-list of fixed-size read buffers shared by the datagram
/// receive loops.
///
/// A buffer travels with its payload through the internal queue to the
/// parser task and must be returned exactly once, after the handler
/// callback has run. Buffers are never handed across the handler
/// boundary.
pub(crate) struct BufferPool {
    buf_size: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub(crate) fn new(buf_size: usize) -> Self {
        Self {
            buf_size,
            free: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn acquire(&self) -> Vec<u8> {
        self.free
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0; self.buf_size])
    }

    pub(crate) fn release(&self, buf: Vec<u8>) {
        debug_assert_eq!(buf.len(), self.buf_size);
        self.free.lock().push(buf);
    }
}
