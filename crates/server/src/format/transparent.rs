//! Transparent (newline-delimited) framing, RFC 6587 section 3.4.2.
//!
//! The default split for stream transports: one record per line, LF or
//! CRLF terminator stripped, the final unterminated line emitted at
//! end of stream.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::ServerError;

#[derive(Debug)]
pub(crate) struct Transparent {
    max_length: usize,
}

impl Transparent {
    pub(crate) fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

fn strip_cr(line: &mut BytesMut) {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
}

impl Decoder for Transparent {
    type Item = BytesMut;
    type Error = ServerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, ServerError> {
        match src.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let mut line = src.split_to(pos + 1);
                line.truncate(pos);
                strip_cr(&mut line);
                Ok(Some(line))
            }
            None if src.len() > self.max_length => Err(ServerError::FrameTooLong {
                limit: self.max_length,
            }),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, ServerError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let mut line = src.split_off(0);
        strip_cr(&mut line);
        Ok(Some(line))
    }
}

#[cfg(test)]
#[path = "transparent_test.rs"]
mod transparent_test;
