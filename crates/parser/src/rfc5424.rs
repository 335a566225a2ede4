//! RFC 5424 (IETF syslog) parser.
//!
//! Follows the RFC grammar with two deviations seen in production:
//!
//! - **Cisco Meraki** devices put a Unix epoch (seconds, with a long
//!   fraction) where TIMESTAMP belongs. Recognised by a run of ten or
//!   more digits; structured data is not attempted for such messages.
//! - **Cisco ASA** firewalls omit VERSION entirely and send
//!   `<PRI>YYYY-MM-DDTHH:MM:SSZ ...`. Recognised whenever header
//!   parsing fails and the buffer matches that shape; the record gets
//!   version 1 and no structured data.
//!
//! PROCID and MSGID failures are swallowed: the header keeps the
//! fields parsed so far and the message is accepted. The `message`
//! field is always the full original line.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SubsecRound, TimeZone, Utc};
use regex::bytes::Regex;

use crate::error::ParseError;
use crate::message::LogParts;
use crate::pri::Priority;
use crate::scan::{self, is_digit};
use crate::timestamp;

const MAX_HOSTNAME_LEN: usize = 255;
const MAX_APP_NAME_LEN: usize = 48;
const MAX_PROC_ID_LEN: usize = 128;
const MAX_MSG_ID_LEN: usize = 32;

static CISCO_ASA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\d+>(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z)").unwrap()
});

/// Parse one RFC 5424 record, returning the best-effort record
/// together with the first error encountered.
pub fn parse(buf: &[u8]) -> (LogParts, Option<ParseError>) {
    let mut parser = Parser::new(buf);
    let err = parser.parse().err();
    (parser.into_parts(), err)
}

/// Cursor-based RFC 5424 parser over a single message buffer.
pub struct Parser<'a> {
    buf: &'a [u8],
    cursor: usize,
    priority: Priority,
    version: u16,
    timestamp: DateTime<Utc>,
    hostname: String,
    app_name: String,
    proc_id: String,
    msg_id: String,
    structured_data: String,
    is_unix_timestamp: bool,
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            cursor: 0,
            priority: Priority::new(0),
            version: 0,
            timestamp: Utc::now().trunc_subsecs(0),
            hostname: String::new(),
            app_name: String::new(),
            proc_id: String::new(),
            msg_id: String::new(),
            structured_data: String::new(),
            is_unix_timestamp: false,
        }
    }

    /// Parse the buffer. The record from [`into_parts`](Self::into_parts)
    /// is best-effort even when an error is returned.
    pub fn parse(&mut self) -> Result<(), ParseError> {
        self.timestamp = Utc::now().trunc_subsecs(0);

        if let Err(err) = self.parse_header() {
            // Cisco ASA sends RFC5424-style lines without a VERSION
            // field; accept them whenever the header would not parse.
            if let Some(ts) = self.cisco_asa_timestamp() {
                self.timestamp = ts;
                self.version = 1;
                self.structured_data = "-".into();
                return Ok(());
            }
            return Err(err);
        }

        if self.is_unix_timestamp {
            // Unix timestamp means a Cisco Meraki device; their
            // payloads do not carry parseable structured data.
            self.structured_data = "-".into();
            return Ok(());
        }

        self.structured_data = self.parse_structured_data()?;
        self.advance();
        Ok(())
    }

    /// Consume the parser, yielding the record. `message` is always
    /// the full original line.
    pub fn into_parts(self) -> LogParts {
        LogParts {
            priority: self.priority.raw,
            facility: self.priority.facility,
            severity: self.priority.severity,
            version: Some(self.version),
            timestamp: Some(self.timestamp),
            hostname: self.hostname,
            app_name: self.app_name,
            proc_id: self.proc_id,
            msg_id: self.msg_id,
            structured_data: self.structured_data,
            message: String::from_utf8_lossy(self.buf).into_owned(),
            ..Default::default()
        }
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buf.len());
    }

    // HEADER = PRI VERSION SP TIMESTAMP SP HOSTNAME SP APP-NAME SP
    //          PROCID SP MSGID
    fn parse_header(&mut self) -> Result<(), ParseError> {
        self.priority = scan::parse_priority(self.buf, &mut self.cursor)?;
        self.version = scan::parse_version(self.buf, &mut self.cursor)?;
        self.advance();

        self.timestamp = self.parse_timestamp()?;
        self.advance();

        let hostname = scan::parse_up_to_len(
            self.buf,
            &mut self.cursor,
            MAX_HOSTNAME_LEN,
            ParseError::InvalidHostname,
        )?;
        self.hostname = scan::nil_to_empty(hostname);
        self.advance();

        let app_name = scan::parse_up_to_len(
            self.buf,
            &mut self.cursor,
            MAX_APP_NAME_LEN,
            ParseError::InvalidAppName,
        )?;
        self.app_name = scan::nil_to_empty(app_name);
        self.advance();

        // PROCID and MSGID failures leave a partial header and do not
        // fail the message.
        let Ok(proc_id) = scan::parse_up_to_len(
            self.buf,
            &mut self.cursor,
            MAX_PROC_ID_LEN,
            ParseError::InvalidProcId,
        ) else {
            return Ok(());
        };
        self.proc_id = scan::nil_to_empty(proc_id);
        self.advance();

        let Ok(msg_id) = scan::parse_up_to_len(
            self.buf,
            &mut self.cursor,
            MAX_MSG_ID_LEN,
            ParseError::InvalidMsgId,
        ) else {
            return Ok(());
        };
        self.msg_id = scan::nil_to_empty(msg_id);
        self.advance();

        Ok(())
    }

    // TIMESTAMP = NILVALUE / FULL-DATE "T" FULL-TIME, with the Meraki
    // Unix-epoch form tried in between.
    fn parse_timestamp(&mut self) -> Result<DateTime<Utc>, ParseError> {
        match self.buf.get(self.cursor) {
            None => Err(ParseError::TimeFormatInvalid),
            Some(b'-') => {
                self.cursor += 1;
                Ok(Utc::now())
            }
            Some(_) if timestamp::is_unix_timestamp(self.buf, self.cursor) => {
                self.is_unix_timestamp = true;
                timestamp::parse_unix_timestamp(self.buf, &mut self.cursor)
            }
            Some(_) => self.parse_canonical_timestamp(),
        }
    }

    fn parse_canonical_timestamp(&mut self) -> Result<DateTime<Utc>, ParseError> {
        let (year, month, day) = self.parse_full_date()?;
        if self.buf.get(self.cursor) != Some(&b'T') {
            return Err(ParseError::TimeFormatInvalid);
        }
        self.cursor += 1;
        let (hour, minute, second, nanos) = self.parse_partial_time()?;
        let offset = self.parse_time_offset()?;

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ParseError::DayInvalid)?;
        let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
            .ok_or(ParseError::SecondInvalid)?;
        offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|ts| ts.with_timezone(&Utc))
            .ok_or(ParseError::TimeZoneInvalid)
    }

    // FULL-DATE = DATE-FULLYEAR "-" DATE-MONTH "-" DATE-MDAY
    //
    // The day is range-checked only; calendar validity (leap years,
    // month lengths) is not enforced beyond what date construction
    // requires.
    fn parse_full_date(&mut self) -> Result<(i32, u32, u32), ParseError> {
        let year = self.parse_year()?;
        if self.buf.get(self.cursor) != Some(&b'-') {
            return Err(ParseError::TimestampUnknownFormat);
        }
        self.cursor += 1;
        let month = scan::parse_2digits(self.buf, &mut self.cursor, 1, 12, ParseError::MonthInvalid)?;
        if self.buf.get(self.cursor) != Some(&b'-') {
            return Err(ParseError::TimestampUnknownFormat);
        }
        self.cursor += 1;
        let day = scan::parse_2digits(self.buf, &mut self.cursor, 1, 31, ParseError::DayInvalid)?;
        Ok((year, month, day))
    }

    // DATE-FULLYEAR = 4DIGIT
    fn parse_year(&mut self) -> Result<i32, ParseError> {
        if self.cursor + 4 > self.buf.len() {
            return Err(ParseError::YearInvalid);
        }
        let mut year = 0i32;
        for &b in &self.buf[self.cursor..self.cursor + 4] {
            if !is_digit(b) {
                return Err(ParseError::YearInvalid);
            }
            year = year * 10 + i32::from(b - b'0');
        }
        self.cursor += 4;
        Ok(year)
    }

    // PARTIAL-TIME = TIME-HOUR ":" TIME-MINUTE ":" TIME-SECOND
    //                [TIME-SECFRAC]
    fn parse_partial_time(&mut self) -> Result<(u32, u32, u32, u32), ParseError> {
        let (hour, minute) = self.parse_hour_minute()?;
        if self.buf.get(self.cursor) != Some(&b':') {
            return Err(ParseError::TimeFormatInvalid);
        }
        self.cursor += 1;
        let second =
            scan::parse_2digits(self.buf, &mut self.cursor, 0, 59, ParseError::SecondInvalid)?;

        let mut nanos = 0;
        if self.buf.get(self.cursor) == Some(&b'.') {
            self.cursor += 1;
            // a bare dot with no digits is tolerated; the fraction is
            // simply zero
            if let Ok(frac) = self.parse_sec_frac() {
                nanos = frac;
            }
        }
        Ok((hour, minute, second, nanos))
    }

    // TIME-SECFRAC = "." 1*6DIGIT
    fn parse_sec_frac(&mut self) -> Result<u32, ParseError> {
        let from = self.cursor;
        let mut to = from;
        while to < self.buf.len() && to - from < 6 && is_digit(self.buf[to]) {
            to += 1;
        }
        if to == from {
            return Err(ParseError::SecFracInvalid);
        }
        self.cursor = to;
        Ok(timestamp::frac_to_nanos(&self.buf[from..to]))
    }

    // TIME-OFFSET = "Z" / ("+" / "-") TIME-HOUR ":" TIME-MINUTE
    fn parse_time_offset(&mut self) -> Result<FixedOffset, ParseError> {
        if self.cursor >= self.buf.len() || self.buf[self.cursor] == b'Z' {
            self.advance();
            return FixedOffset::east_opt(0).ok_or(ParseError::TimeZoneInvalid);
        }

        let sign: i32 = match self.buf[self.cursor] {
            b'+' => 1,
            b'-' => -1,
            _ => return Err(ParseError::TimeZoneInvalid),
        };
        self.cursor += 1;
        let (hours, minutes) = self.parse_hour_minute()?;
        FixedOffset::east_opt(sign * (hours as i32 * 3600 + minutes as i32 * 60))
            .ok_or(ParseError::TimeZoneInvalid)
    }

    fn parse_hour_minute(&mut self) -> Result<(u32, u32), ParseError> {
        let hour = scan::parse_2digits(self.buf, &mut self.cursor, 0, 23, ParseError::HourInvalid)?;
        if self.buf.get(self.cursor) != Some(&b':') {
            return Err(ParseError::TimeFormatInvalid);
        }
        self.cursor += 1;
        let minute =
            scan::parse_2digits(self.buf, &mut self.cursor, 0, 59, ParseError::MinuteInvalid)?;
        Ok((hour, minute))
    }

    // STRUCTURED-DATA = NILVALUE / 1*SD-ELEMENT
    //
    // Elements are captured verbatim, brackets included: everything up
    // to a `]` that is the last byte or is followed by a space.
    fn parse_structured_data(&mut self) -> Result<String, ParseError> {
        match self.buf.get(self.cursor) {
            None => return Ok("-".into()),
            Some(b'-') => {
                self.cursor += 1;
                return Ok("-".into());
            }
            Some(b'[') => {}
            Some(_) => return Err(ParseError::NoStructuredData),
        }

        let from = self.cursor;
        let mut to = from;
        while to < self.buf.len() {
            if self.buf[to] == b']' {
                let next = to + 1;
                if next == self.buf.len() || self.buf[next] == b' ' {
                    self.cursor = next;
                    return Ok(String::from_utf8_lossy(&self.buf[from..next]).into_owned());
                }
            }
            to += 1;
        }
        Err(ParseError::UnterminatedStructuredData)
    }

    fn cisco_asa_timestamp(&self) -> Option<DateTime<Utc>> {
        let stamp = CISCO_ASA_RE.captures(self.buf)?.get(1)?;
        let stamp = std::str::from_utf8(stamp.as_bytes()).ok()?;
        DateTime::parse_from_rfc3339(stamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[cfg(test)]
#[path = "rfc5424_test.rs"]
mod rfc5424_test;
