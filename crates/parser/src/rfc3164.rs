//! RFC 3164 (BSD syslog) parser with vendor-dialect dispatch.
//!
//! BSD syslog is a convention more than a grammar: real senders omit
//! the priority, the hostname or the whole header, and several vendors
//! ship their own layouts behind a standard-looking `<PRI>`. The
//! parser first tries the canonical header; when no known timestamp
//! layout matches it sniffs the buffer for vendor sentinels and hands
//! off to a dialect header parser:
//!
//! - `time="..."` — SonicWall/SonicOS (`fw=` carries the hostname)
//! - `eventtime=...` — FortiOS (nanoseconds since epoch)
//! - `<PRI>:` — Cisco ASA classic
//! - `<PRI>YYYY-MM-DDTHH:MM:SSZ` — Cisco ASA with an RFC 5424 stamp
//!
//! Dialect records keep the whole line as content and never carry a
//! tag. Messages with no recognisable header at all still parse: the
//! priority (or its RFC 3164 section 4.3.3 default) plus the current
//! instant and the full line as content.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::bytes::Regex;

use crate::error::ParseError;
use crate::message::LogParts;
use crate::pri::Priority;
use crate::scan;
use crate::timestamp;

static CISCO_ASA_CLASSIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\d+>:(?:(\w{3} \d{2} \d{2}:\d{2}:\d{2}(?: [A-Z]+)?) )?").unwrap()
});

static CISCO_ASA_SENTINEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<\d+>:").unwrap());

static CISCO_ASA_RFC5424_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\d+>(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z)").unwrap()
});

static SONICWALL_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"time="([^"]+)""#).unwrap());

static SONICWALL_FW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"fw=([0-9.]+)").unwrap());

static FORTIOS_EVENTTIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"eventtime=(\d+)").unwrap());

/// Vendor dialects recognised while sniffing a timestamp that matched
/// no canonical layout. Internal control flow, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    SonicWall,
    FortiOs,
    CiscoAsaClassic,
    CiscoAsaRfc5424,
}

enum HeaderFail {
    Dialect(Dialect),
    Unknown,
}

/// Parse one RFC 3164 record, returning the best-effort record
/// together with the first error encountered.
pub fn parse(buf: &[u8]) -> (LogParts, Option<ParseError>) {
    let mut parser = Parser::new(buf);
    let err = parser.parse().err();
    (parser.into_parts(), err)
}

/// Cursor-based RFC 3164 parser over a single message buffer.
pub struct Parser<'a> {
    buf: &'a [u8],
    cursor: usize,
    priority: Priority,
    timestamp: DateTime<Utc>,
    hostname: String,
    tag: String,
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            cursor: 0,
            priority: Priority::DEFAULT,
            timestamp: Utc::now(),
            hostname: String::new(),
            tag: String::new(),
        }
    }

    /// Parse the buffer. The record from [`into_parts`](Self::into_parts)
    /// is best-effort even when an error is returned.
    pub fn parse(&mut self) -> Result<(), ParseError> {
        self.timestamp = Utc::now();

        let pri = match scan::parse_priority(self.buf, &mut self.cursor) {
            Ok(pri) => pri,
            Err(_) => {
                // RFC 3164 section 4.3.3: no valid PRI, the whole line
                // is content under the default priority.
                self.priority = Priority::DEFAULT;
                self.cursor = 0;
                return Ok(());
            }
        };
        self.priority = pri;
        let after_pri = self.cursor;

        match self.parse_header() {
            Ok(()) => {
                self.cursor = (self.cursor + 1).min(self.buf.len());
                self.tag = self.parse_tag();
                Ok(())
            }
            Err(HeaderFail::Dialect(dialect)) => {
                let result = self.parse_dialect_header(dialect);
                if result.is_err() {
                    self.cursor = after_pri;
                }
                result
            }
            Err(HeaderFail::Unknown) => {
                self.cursor = after_pri;
                self.timestamp = Utc::now();
                Err(ParseError::TimestampUnknownFormat)
            }
        }
    }

    /// Consume the parser, yielding the record. `content` is always
    /// the full original line.
    pub fn into_parts(self) -> LogParts {
        LogParts {
            priority: self.priority.raw,
            facility: self.priority.facility,
            severity: self.priority.severity,
            version: None,
            timestamp: Some(self.timestamp),
            hostname: self.hostname,
            tag: self.tag,
            content: String::from_utf8_lossy(self.buf).into_owned(),
            ..Default::default()
        }
    }

    fn parse_header(&mut self) -> Result<(), HeaderFail> {
        let ts = self.parse_canonical_timestamp()?;
        self.timestamp = ts;
        self.hostname = self.parse_hostname();
        Ok(())
    }

    /// Try the two canonical layouts, RFC 3339 first when the byte at
    /// the cursor is a digit (a BSD stamp starts with a month name).
    /// On failure, sniff vendor sentinels over the whole buffer.
    fn parse_canonical_timestamp(&mut self) -> Result<DateTime<Utc>, HeaderFail> {
        type Scan = fn(&[u8], &mut usize) -> Result<DateTime<Utc>, ParseError>;

        let digit_first = self
            .buf
            .get(self.cursor)
            .is_some_and(|b| b.is_ascii_digit());
        let attempts: [Scan; 2] = if digit_first {
            [timestamp::parse_rfc3339_window, timestamp::parse_bsd_stamp]
        } else {
            [timestamp::parse_bsd_stamp, timestamp::parse_rfc3339_window]
        };

        for attempt in attempts {
            let mut cursor = self.cursor;
            if let Ok(ts) = attempt(self.buf, &mut cursor) {
                if self.buf.get(cursor) == Some(&b' ') {
                    cursor += 1;
                }
                self.cursor = cursor;
                return Ok(timestamp::fix_year(ts));
            }
        }

        // No layout matched: park the cursor at the width of a BSD
        // stamp (clamped to the buffer) and sniff.
        self.cursor = timestamp::BSD_STAMP_LEN.min(self.buf.len());
        if self.buf.get(self.cursor) == Some(&b' ') {
            self.cursor += 1;
        }

        Err(HeaderFail::Dialect(self.sniff_dialect().ok_or(HeaderFail::Unknown)?))
    }

    fn sniff_dialect(&self) -> Option<Dialect> {
        if SONICWALL_TIME_RE.is_match(self.buf) {
            Some(Dialect::SonicWall)
        } else if FORTIOS_EVENTTIME_RE.is_match(self.buf) {
            Some(Dialect::FortiOs)
        } else if CISCO_ASA_SENTINEL_RE.is_match(self.buf) {
            Some(Dialect::CiscoAsaClassic)
        } else if CISCO_ASA_RFC5424_RE.is_match(self.buf) {
            Some(Dialect::CiscoAsaRfc5424)
        } else {
            None
        }
    }

    /// Dialect records keep the whole line as content; only the
    /// timestamp (and for SonicWall the firewall address) is lifted
    /// out of the body.
    fn parse_dialect_header(&mut self, dialect: Dialect) -> Result<(), ParseError> {
        match dialect {
            Dialect::SonicWall => self.parse_sonicwall_header(),
            Dialect::FortiOs => self.parse_fortios_header(),
            Dialect::CiscoAsaClassic => self.parse_cisco_asa_classic_header(),
            Dialect::CiscoAsaRfc5424 => self.parse_cisco_asa_rfc5424_header(),
        }
    }

    fn parse_sonicwall_header(&mut self) -> Result<(), ParseError> {
        let stamp = SONICWALL_TIME_RE
            .captures(self.buf)
            .and_then(|c| c.get(1))
            .ok_or(ParseError::SonicWallTimestamp)?;
        let stamp = String::from_utf8_lossy(stamp.as_bytes());
        let ts = timestamp::parse_stamp(
            &stamp,
            "%Y-%m-%d %H:%M:%S",
            ParseError::SonicWallTimestamp,
        )?;

        let hostname = SONICWALL_FW_RE
            .captures(self.buf)
            .and_then(|c| c.get(1))
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
            .unwrap_or_default();

        self.timestamp = timestamp::fix_year(ts);
        self.hostname = hostname;
        Ok(())
    }

    fn parse_fortios_header(&mut self) -> Result<(), ParseError> {
        let eventtime = FORTIOS_EVENTTIME_RE
            .captures(self.buf)
            .and_then(|c| c.get(1))
            .ok_or(ParseError::FortiOsEventTime)?;
        let nanos: i64 = std::str::from_utf8(eventtime.as_bytes())
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(ParseError::FortiOsEventTime)?;

        let (secs, subsec) = (nanos / 1_000_000_000, (nanos % 1_000_000_000) as u32);
        self.timestamp =
            DateTime::from_timestamp(secs, subsec).ok_or(ParseError::FortiOsEventTime)?;
        self.hostname.clear();
        Ok(())
    }

    fn parse_cisco_asa_classic_header(&mut self) -> Result<(), ParseError> {
        let stamp = CISCO_ASA_CLASSIC_RE
            .captures(self.buf)
            .and_then(|c| c.get(1));
        let Some(stamp) = stamp else {
            // `<PRI>:` straight into the message body
            self.timestamp = Utc::now();
            self.hostname.clear();
            return Ok(());
        };

        let stamp = String::from_utf8_lossy(stamp.as_bytes());
        let ts = timestamp::parse_stamp(&stamp, "%b %d %H:%M:%S", ParseError::CiscoAsaTimestamp)?;
        self.timestamp = timestamp::fix_year(ts);
        self.hostname.clear();
        Ok(())
    }

    fn parse_cisco_asa_rfc5424_header(&mut self) -> Result<(), ParseError> {
        let stamp = CISCO_ASA_RFC5424_RE
            .captures(self.buf)
            .and_then(|c| c.get(1))
            .ok_or(ParseError::CiscoAsaTimestamp)?;
        let stamp = String::from_utf8_lossy(stamp.as_bytes());
        let ts = DateTime::parse_from_rfc3339(&stamp).map_err(|_| ParseError::CiscoAsaTimestamp)?;
        self.timestamp = ts.with_timezone(&Utc);
        self.hostname.clear();
        Ok(())
    }

    /// A hostname ending in `:` is not a hostname — it is the tag of a
    /// GNU-libc sender that omitted the field. Substitute the local
    /// machine's hostname and back the cursor up so tag parsing sees
    /// the token again.
    fn parse_hostname(&mut self) -> String {
        let start = self.cursor;
        let hostname = scan::parse_hostname(self.buf, &mut self.cursor);
        if hostname.ends_with(':') {
            self.cursor = start.saturating_sub(1);
            return ::hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        hostname
    }

    /// TAG ends at `[`, `:` or a space; a PID in brackets is not
    /// retained. An empty tag is legal.
    fn parse_tag(&mut self) -> String {
        let from = self.cursor;
        let mut tag_end: Option<usize> = None;

        loop {
            if self.cursor >= self.buf.len() {
                // no boundary found, rewind for content
                self.cursor = from;
                return String::new();
            }
            let b = self.buf[self.cursor];
            if b == b'[' && tag_end.is_none() {
                tag_end = Some(self.cursor);
            }
            if b == b':' || b == b' ' {
                let end = tag_end.unwrap_or(self.cursor);
                self.cursor += 1;
                if self.buf.get(self.cursor) == Some(&b' ') {
                    self.cursor += 1;
                }
                return String::from_utf8_lossy(&self.buf[from..end]).into_owned();
            }
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
#[path = "rfc3164_test.rs"]
mod rfc3164_test;
