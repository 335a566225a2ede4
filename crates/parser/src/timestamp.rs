//! Timestamp scanners shared across the parsers: the BSD stamp, the
//! fixed-width RFC 3339 layout, vendor stamps with trailing zone
//! abbreviations, and the Unix-epoch form emitted by Cisco Meraki.

use chrono::format::{Parsed, StrftimeItems, parse};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::ParseError;
use crate::scan::is_digit;

/// Length of the BSD stamp layout `Mmm DD HH:MM:SS`.
pub(crate) const BSD_STAMP_LEN: usize = 15;

/// Length of an RFC 3339 timestamp with a numeric offset,
/// `YYYY-MM-DDTHH:MM:SS+HH:MM`.
const RFC3339_LEN: usize = 25;

const MONTHS: [&[u8; 3]; 12] = [
    b"Jan", b"Feb", b"Mar", b"Apr", b"May", b"Jun", b"Jul", b"Aug", b"Sep", b"Oct", b"Nov", b"Dec",
];

fn two_digits(a: u8, b: u8) -> Result<u32, ParseError> {
    if !is_digit(a) || !is_digit(b) {
        return Err(ParseError::TimestampUnknownFormat);
    }
    Ok(u32::from(a - b'0') * 10 + u32::from(b - b'0'))
}

/// Scan a BSD stamp (`Oct 11 22:14:15`, day space- or zero-padded) in
/// a fixed 15-byte window. The stamp carries no year; the result has
/// year zero and must go through [`fix_year`].
pub(crate) fn parse_bsd_stamp(buf: &[u8], cursor: &mut usize) -> Result<DateTime<Utc>, ParseError> {
    let start = *cursor;
    if start + BSD_STAMP_LEN > buf.len() {
        return Err(ParseError::TimestampUnknownFormat);
    }
    let s = &buf[start..start + BSD_STAMP_LEN];

    let month = MONTHS
        .iter()
        .position(|m| m.as_slice() == &s[0..3])
        .map(|i| i as u32 + 1)
        .ok_or(ParseError::TimestampUnknownFormat)?;
    if s[3] != b' ' {
        return Err(ParseError::TimestampUnknownFormat);
    }
    let day = match (s[4], s[5]) {
        (b' ', units) if is_digit(units) => u32::from(units - b'0'),
        (tens, units) => two_digits(tens, units)?,
    };
    if s[6] != b' ' || s[9] != b':' || s[12] != b':' {
        return Err(ParseError::TimestampUnknownFormat);
    }
    let hour = two_digits(s[7], s[8])?;
    let minute = two_digits(s[10], s[11])?;
    let second = two_digits(s[13], s[14])?;

    let date = NaiveDate::from_ymd_opt(0, month, day).ok_or(ParseError::TimestampUnknownFormat)?;
    let time =
        NaiveTime::from_hms_opt(hour, minute, second).ok_or(ParseError::TimestampUnknownFormat)?;

    *cursor = start + BSD_STAMP_LEN;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Scan an RFC 3339 timestamp with a numeric offset in a fixed 25-byte
/// window.
pub(crate) fn parse_rfc3339_window(
    buf: &[u8],
    cursor: &mut usize,
) -> Result<DateTime<Utc>, ParseError> {
    let start = *cursor;
    if start + RFC3339_LEN > buf.len() {
        return Err(ParseError::TimestampUnknownFormat);
    }
    let s = std::str::from_utf8(&buf[start..start + RFC3339_LEN])
        .map_err(|_| ParseError::TimestampUnknownFormat)?;
    let ts = DateTime::parse_from_rfc3339(s).map_err(|_| ParseError::TimestampUnknownFormat)?;
    *cursor = start + RFC3339_LEN;
    Ok(ts.with_timezone(&Utc))
}

/// Parse a vendor stamp against a strftime layout, tolerating a
/// trailing zone abbreviation (` UTC`, ` EDT`), which is ignored: the
/// stamp is taken as UTC. Layouts without a year yield year zero for
/// [`fix_year`].
pub(crate) fn parse_stamp(s: &str, fmt: &str, err: ParseError) -> Result<DateTime<Utc>, ParseError> {
    let s = strip_zone_suffix(s.trim());
    let mut parsed = Parsed::new();
    parse(&mut parsed, s, StrftimeItems::new(fmt)).map_err(|_| err.clone())?;
    let naive = match parsed.to_naive_datetime_with_offset(0) {
        Ok(naive) => naive,
        Err(_) => {
            parsed.set_year(0).map_err(|_| err.clone())?;
            parsed
                .to_naive_datetime_with_offset(0)
                .map_err(|_| err.clone())?
        }
    };
    Ok(Utc.from_utc_datetime(&naive))
}

fn strip_zone_suffix(s: &str) -> &str {
    if let Some(pos) = s.rfind(' ') {
        let tail = &s[pos + 1..];
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_uppercase()) {
            return &s[..pos];
        }
    }
    s
}

/// A stamp without a year parses as year zero; substitute the current
/// year verbatim.
pub(crate) fn fix_year(ts: DateTime<Utc>) -> DateTime<Utc> {
    if ts.year() == 0 {
        ts.with_year(Utc::now().year()).unwrap_or(ts)
    } else {
        ts
    }
}

/// True when the buffer at the cursor holds at least ten consecutive
/// decimal digits terminated by `.`, a non-digit or end of buffer —
/// the Unix-epoch timestamps emitted by Cisco Meraki devices.
pub(crate) fn is_unix_timestamp(buf: &[u8], cursor: usize) -> bool {
    let mut digits = 0;
    for &b in &buf[cursor.min(buf.len())..] {
        if b == b'.' {
            return digits >= 10;
        }
        if !is_digit(b) {
            break;
        }
        digits += 1;
    }
    digits >= 10
}

/// Parse seconds-since-epoch with an optional fraction of any length.
pub(crate) fn parse_unix_timestamp(
    buf: &[u8],
    cursor: &mut usize,
) -> Result<DateTime<Utc>, ParseError> {
    let start = *cursor;
    let mut end = start;
    while end < buf.len() && is_digit(buf[end]) {
        end += 1;
    }
    let secs: i64 = std::str::from_utf8(&buf[start..end])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ParseError::TimeFormatInvalid)?;

    let mut nanos = 0;
    if buf.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < buf.len() && is_digit(buf[frac_end]) {
            frac_end += 1;
        }
        nanos = frac_to_nanos(&buf[frac_start..frac_end]);
        end = frac_end;
    }

    *cursor = end;
    DateTime::from_timestamp(secs, nanos).ok_or(ParseError::TimeFormatInvalid)
}

/// Interpret `digits` as the fractional part `0.<digits>` of a second,
/// in nanoseconds. Digits past the ninth carry no weight.
pub(crate) fn frac_to_nanos(digits: &[u8]) -> u32 {
    let mut nanos: u32 = 0;
    let mut scale: u32 = 100_000_000;
    for &b in digits.iter().take(9) {
        nanos += u32::from(b - b'0') * scale;
        scale /= 10;
    }
    nanos
}

#[cfg(test)]
#[path = "timestamp_test.rs"]
mod timestamp_test;
