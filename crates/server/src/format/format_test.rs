//! Tests for format detection and parser dispatch.

use crate::format::{Format, looks_like_rfc5424};

#[test]
fn detects_version_field_as_rfc5424() {
    assert!(looks_like_rfc5424(
        b"<34>1 2018-01-12T22:14:15Z host app proc msg - hi"
    ));
    assert!(looks_like_rfc5424(b"<134>1 1701233380.285170542 host x"));
    assert!(looks_like_rfc5424(b"<1>999 - - - - - -"));
}

#[test]
fn bsd_shapes_fall_back_to_rfc3164() {
    // month name after the priority
    assert!(!looks_like_rfc5424(b"<34>Oct 11 22:14:15 host su: hello"));
    // Cisco ASA RFC5424-style stamp: digits but no space after them
    assert!(!looks_like_rfc5424(b"<166>2018-06-27T12:17:46Z asa : x"));
    // classic ASA
    assert!(!looks_like_rfc5424(b"<34>:Apr 04 19:28:05 EDT: %ASA: x"));
    // no priority at all
    assert!(!looks_like_rfc5424(b"Oct 11 22:14:15 host su: hello"));
}

#[test]
fn automatic_dispatches_per_record() {
    let (parts, err) = Format::Automatic.parse(b"<34>1 2018-01-12T22:14:15Z host app proc msg - hi");
    assert_eq!(err, None);
    assert_eq!(parts.version, Some(1));
    assert_eq!(parts.app_name, "app");

    let (parts, err) = Format::Automatic.parse(b"<34>Oct 11 22:14:15 mymachine su: hello");
    assert_eq!(err, None);
    assert_eq!(parts.version, None);
    assert_eq!(parts.tag, "su");
    assert_eq!(parts.hostname, "mymachine");
}

#[test]
fn rfc6587_records_parse_as_rfc5424() {
    let (parts, err) = Format::Rfc6587.parse(b"<34>1 2018-01-12T22:14:15Z host app proc msg - hi");
    assert_eq!(err, None);
    assert_eq!(parts.version, Some(1));
}

#[test]
fn framing_selection() {
    assert!(Format::Rfc6587.uses_octet_counting());
    assert!(!Format::Rfc3164.uses_octet_counting());
    assert!(!Format::Rfc5424.uses_octet_counting());
    assert!(!Format::Automatic.uses_octet_counting());
}
