//! Tests for the RFC 5424 parser, including the Cisco Meraki and
//! Cisco ASA deviations.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::ParseError;
use crate::rfc5424::parse;

#[test]
fn canonical_message() {
    let buf = b"<34>1 2018-01-12T22:14:15+00:00 mymachine app proc msg - hello";
    let (parts, err) = parse(buf);

    assert_eq!(err, None);
    assert_eq!(parts.priority, 34);
    assert_eq!(parts.facility, 4);
    assert_eq!(parts.severity, 2);
    assert_eq!(parts.version, Some(1));
    assert_eq!(
        parts.timestamp,
        Some(Utc.with_ymd_and_hms(2018, 1, 12, 22, 14, 15).unwrap())
    );
    assert_eq!(parts.hostname, "mymachine");
    assert_eq!(parts.app_name, "app");
    assert_eq!(parts.proc_id, "proc");
    assert_eq!(parts.msg_id, "msg");
    assert_eq!(parts.structured_data, "-");
    assert_eq!(parts.message, String::from_utf8_lossy(buf));
    assert_eq!(parts.tag, "");
    assert_eq!(parts.content, "");
}

#[test]
fn string_fields_round_trip_byte_exact() {
    let buf = b"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog 111 ID47 [exampleSDID@32473 iut=\"3\" eventSource=\"Application\" eventID=\"1011\"] BOMAn application event log entry";
    let (parts, err) = parse(buf);

    assert_eq!(err, None);
    assert_eq!(parts.hostname, "mymachine.example.com");
    assert_eq!(parts.app_name, "evntslog");
    assert_eq!(parts.proc_id, "111");
    assert_eq!(parts.msg_id, "ID47");
    assert_eq!(
        parts.structured_data,
        "[exampleSDID@32473 iut=\"3\" eventSource=\"Application\" eventID=\"1011\"]"
    );
    let want = Utc.with_ymd_and_hms(2003, 10, 11, 22, 14, 15).unwrap()
        + chrono::Duration::milliseconds(3);
    assert_eq!(parts.timestamp, Some(want));
}

#[test]
fn meraki_unix_timestamp() {
    let buf = b"<134>1 1701233380.285170542 gateway urls src=192.168.128.2:55694 dst=142.250.72.14:443 mac=F4:D4:88:6A:AF:5D request: UNKNOWN https://play.google.com/...";
    let (parts, err) = parse(buf);

    assert_eq!(err, None);
    assert_eq!(parts.version, Some(1));
    assert_eq!(
        parts.timestamp,
        Some(DateTime::from_timestamp(1_701_233_380, 285_170_542).unwrap())
    );
    assert_eq!(parts.hostname, "gateway");
    // structured data is never attempted for Meraki payloads
    assert_eq!(parts.structured_data, "-");
}

#[test]
fn meraki_unix_timestamp_without_fraction_at_end_of_buffer() {
    let (parts, err) = parse(b"<134>1 1701233380");
    // header truncates right after the timestamp
    assert_eq!(err, Some(ParseError::InvalidHostname));
    assert_eq!(
        parts.timestamp,
        Some(DateTime::from_timestamp(1_701_233_380, 0).unwrap())
    );
}

#[test]
fn cisco_asa_without_version_field() {
    let buf = b"<166>2018-06-27T12:17:46Z asa : %ASA-6-110002: Failed to locate egress interface for protocol from src interface :src IP/src port to dest IP/dest port";
    let (parts, err) = parse(buf);

    assert_eq!(err, None);
    assert_eq!(parts.priority, 166);
    assert_eq!(parts.facility, 20);
    assert_eq!(parts.severity, 6);
    assert_eq!(parts.version, Some(1));
    assert_eq!(
        parts.timestamp,
        Some(Utc.with_ymd_and_hms(2018, 6, 27, 12, 17, 46).unwrap())
    );
    assert_eq!(parts.structured_data, "-");
    assert_eq!(parts.message, String::from_utf8_lossy(buf));
}

#[test]
fn nilvalue_fields_map_to_empty_strings() {
    let (parts, err) = parse(b"<1>1 - - - - - -");
    assert_eq!(err, None);
    assert_eq!(parts.version, Some(1));
    assert_eq!(parts.hostname, "");
    assert_eq!(parts.app_name, "");
    assert_eq!(parts.proc_id, "");
    assert_eq!(parts.msg_id, "");
    // the nil timestamp defaults to the current instant
    let ts = parts.timestamp.unwrap();
    assert!((Utc::now() - ts).num_seconds().abs() < 5);
    assert_eq!(parts.structured_data, "-");
}

#[test]
fn multiple_sd_elements_are_captured_verbatim() {
    let buf = b"<165>1 2003-10-11T22:14:15.003Z host evntslog - ID47 [exampleSDID@32473 iut=\"3\"][examplePriority@32473 class=\"high\"] body";
    let (parts, err) = parse(buf);

    assert_eq!(err, None);
    assert_eq!(
        parts.structured_data,
        "[exampleSDID@32473 iut=\"3\"][examplePriority@32473 class=\"high\"]"
    );
}

#[test]
fn sd_element_at_end_of_buffer() {
    let (parts, err) = parse(b"<165>1 2003-10-11T22:14:15.003Z host evntslog - ID47 [only@1 k=\"v\"]");
    assert_eq!(err, None);
    assert_eq!(parts.structured_data, "[only@1 k=\"v\"]");
}

#[test]
fn unterminated_sd_is_an_error() {
    let buf = b"<165>1 2003-10-11T22:14:15.003Z host evntslog - ID47 [unclosed k=\"v\"";
    let (parts, err) = parse(buf);

    assert_eq!(err, Some(ParseError::UnterminatedStructuredData));
    assert_eq!(parts.hostname, "host");
}

#[test]
fn missing_sd_bracket_is_an_error() {
    let (_, err) = parse(b"<165>1 2003-10-11T22:14:15.003Z host evntslog - ID47 nobracket");
    assert_eq!(err, Some(ParseError::NoStructuredData));
}

// PROC-ID and MSG-ID failures are swallowed and the message accepted
// with a partial header. Existing consumers rely on truncated headers
// still being delivered, so the tolerance is load-bearing.
#[test]
fn truncation_at_proc_id_is_swallowed() {
    let (parts, err) = parse(b"<34>1 2018-01-12T22:14:15Z host app 1234");
    assert_eq!(err, None);
    assert_eq!(parts.hostname, "host");
    assert_eq!(parts.app_name, "app");
    assert_eq!(parts.proc_id, "");
    assert_eq!(parts.msg_id, "");
    assert_eq!(parts.structured_data, "-");
}

#[test]
fn truncation_at_msg_id_is_swallowed() {
    let (parts, err) = parse(b"<34>1 2018-01-12T22:14:15Z host app 1234 ID17");
    assert_eq!(err, None);
    assert_eq!(parts.proc_id, "1234");
    assert_eq!(parts.msg_id, "");
    assert_eq!(parts.structured_data, "-");
}

#[test]
fn priority_out_of_range() {
    let (parts, err) = parse(b"<4096>1 - - - - - -");
    assert_eq!(err, Some(ParseError::PriorityOutOfRange));
    assert_eq!(parts.message, "<4096>1 - - - - - -");
}

#[test]
fn missing_version_is_an_error() {
    let (_, err) = parse(b"<34>x 2018-01-12T22:14:15Z host app proc msg - hi");
    assert_eq!(err, Some(ParseError::VersionInvalid));
}

#[test]
fn bsd_messages_do_not_parse_as_rfc5424() {
    let (_, err) = parse(b"<134>Feb 18 20:53:31 haproxy[376]: I am a message");
    assert!(err.is_some());
}

#[test]
fn numeric_offsets_normalise_to_utc() {
    let (east, _) = parse(b"<1>1 2019-01-20T00:46:39+05:45 host app proc msg - x");
    let (west, _) = parse(b"<1>1 2019-01-19T11:01:39-08:00 host app proc msg - x");
    assert_eq!(east.timestamp, west.timestamp);
    assert_eq!(
        east.timestamp,
        Some(Utc.with_ymd_and_hms(2019, 1, 19, 19, 1, 39).unwrap())
    );
}

#[test]
fn fractional_seconds_become_nanoseconds() {
    let (parts, err) = parse(b"<1>1 1985-04-12T23:20:50.52Z host app proc msg - x");
    assert_eq!(err, None);
    let want = Utc.with_ymd_and_hms(1985, 4, 12, 23, 20, 50).unwrap()
        + chrono::Duration::milliseconds(520);
    assert_eq!(parts.timestamp, Some(want));
}

#[test]
fn bad_timezone_sign_is_an_error() {
    let (_, err) = parse(b"<1>1 2015-01-01T00:00:00*00:00 host app proc msg - x");
    assert_eq!(err, Some(ParseError::TimeZoneInvalid));
}

#[test]
fn invalid_month_is_an_error() {
    let (_, err) = parse(b"<1>1 2015-13-01T00:00:00Z host app proc msg - x");
    assert_eq!(err, Some(ParseError::MonthInvalid));
}
