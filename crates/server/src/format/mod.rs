//! Wire formats: framing selection and per-record parser dispatch.

mod octet;
mod transparent;

use bytes::BytesMut;
use siphon_parser::{LogParts, ParseError, rfc3164, rfc5424};
use tokio_util::codec::Decoder;

use crate::READ_BUFFER_SIZE;
use crate::error::ServerError;

pub(crate) use octet::OctetCounting;
pub(crate) use transparent::Transparent;

/// Wire format served by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// BSD syslog, including the vendor dialects, over transparent
    /// (newline) framing.
    Rfc3164,
    /// IETF syslog over transparent framing.
    Rfc5424,
    /// Octet-counted framing on stream transports; records are parsed
    /// as RFC 5424.
    Rfc6587,
    /// Per-record detection of RFC 3164 vs RFC 5424, over transparent
    /// framing.
    Automatic,
}

impl Format {
    pub(crate) fn stream_decoder(&self) -> FrameDecoder {
        match self {
            Format::Rfc6587 => FrameDecoder::OctetCounting(OctetCounting::new(READ_BUFFER_SIZE)),
            _ => FrameDecoder::Transparent(Transparent::new(READ_BUFFER_SIZE)),
        }
    }

    /// Only octet counting reframes datagrams; everything else parses
    /// a datagram whole.
    pub(crate) fn uses_octet_counting(&self) -> bool {
        matches!(self, Format::Rfc6587)
    }

    /// Parse one record, returning the best-effort record and the
    /// first error encountered.
    pub fn parse(&self, line: &[u8]) -> (LogParts, Option<ParseError>) {
        match self {
            Format::Rfc3164 => rfc3164::parse(line),
            Format::Rfc5424 | Format::Rfc6587 => rfc5424::parse(line),
            Format::Automatic => {
                if looks_like_rfc5424(line) {
                    rfc5424::parse(line)
                } else {
                    rfc3164::parse(line)
                }
            }
        }
    }
}

/// Peek past `<PRI>`: a digit run (the VERSION field) followed by a
/// space marks RFC 5424.
fn looks_like_rfc5424(line: &[u8]) -> bool {
    if line.first() != Some(&b'<') {
        return false;
    }
    let mut i = 1;
    while i <= 3 && line.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == 1 || line.get(i) != Some(&b'>') {
        return false;
    }

    let version_start = i + 1;
    let mut j = version_start;
    while j - version_start < 3 && line.get(j).is_some_and(u8::is_ascii_digit) {
        j += 1;
    }
    j > version_start && line.get(j) == Some(&b' ')
}

/// The framer driving a stream connection, chosen per [`Format`].
#[derive(Debug)]
pub(crate) enum FrameDecoder {
    OctetCounting(OctetCounting),
    Transparent(Transparent),
}

impl Decoder for FrameDecoder {
    type Item = BytesMut;
    type Error = ServerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, ServerError> {
        match self {
            FrameDecoder::OctetCounting(decoder) => decoder.decode(src),
            FrameDecoder::Transparent(decoder) => decoder.decode(src),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, ServerError> {
        match self {
            FrameDecoder::OctetCounting(decoder) => decoder.decode_eof(src),
            FrameDecoder::Transparent(decoder) => decoder.decode_eof(src),
        }
    }
}

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;
