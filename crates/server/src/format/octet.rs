//! RFC 6587 octet-counted framing.
//!
//! Each frame is a decimal ASCII length, one space, then exactly that
//! many payload bytes — no inter-frame delimiter. A sender that
//! declares a length shorter than what it wrote leaves bytes behind
//! that cannot start a valid frame, so the following decode fails.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::ServerError;

/// Longest accepted count field. Ten digits already describe frames
/// far past the scanner buffer.
const MAX_COUNT_DIGITS: usize = 10;

#[derive(Debug)]
pub(crate) struct OctetCounting {
    max_length: usize,
}

impl OctetCounting {
    pub(crate) fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Decoder for OctetCounting {
    type Item = BytesMut;
    type Error = ServerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, ServerError> {
        for i in 0..src.len() {
            let b = src[i];
            if b == b' ' {
                if i == 0 {
                    return Err(ServerError::InvalidOctetCount);
                }
                let count: usize = std::str::from_utf8(&src[..i])
                    .ok()
                    .and_then(|digits| digits.parse().ok())
                    .ok_or(ServerError::InvalidOctetCount)?;
                if count > self.max_length {
                    return Err(ServerError::FrameTooLong {
                        limit: self.max_length,
                    });
                }

                let end = i + 1 + count;
                if src.len() < end {
                    src.reserve(end - src.len());
                    return Ok(None);
                }
                let frame = src.split_to(end).split_off(i + 1);
                return Ok(Some(frame));
            }
            if !b.is_ascii_digit() || i >= MAX_COUNT_DIGITS {
                return Err(ServerError::InvalidOctetCount);
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, ServerError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(ServerError::TruncatedFrame),
        }
    }
}

#[cfg(test)]
#[path = "octet_test.rs"]
mod octet_test;
