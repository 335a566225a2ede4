//! Tests for the primitive scanners.

use crate::error::ParseError;
use crate::scan::{nil_to_empty, parse_2digits, parse_hostname, parse_priority, parse_up_to_len, parse_version};

#[test]
fn priority_valid() {
    let mut cursor = 0;
    let pri = parse_priority(b"<34>rest", &mut cursor).unwrap();
    assert_eq!(pri.raw, 34);
    assert_eq!(pri.facility, 4);
    assert_eq!(pri.severity, 2);
    assert_eq!(cursor, 4);
}

#[test]
fn priority_upper_bound() {
    let mut cursor = 0;
    assert_eq!(parse_priority(b"<191>", &mut cursor).unwrap().raw, 191);

    let mut cursor = 0;
    assert_eq!(
        parse_priority(b"<192>", &mut cursor),
        Err(ParseError::PriorityOutOfRange)
    );
}

#[test]
fn priority_malformed() {
    let mut cursor = 0;
    assert_eq!(
        parse_priority(b"no angle bracket", &mut cursor),
        Err(ParseError::PriorityNoStart)
    );

    let mut cursor = 0;
    assert_eq!(
        parse_priority(b"<>", &mut cursor),
        Err(ParseError::PriorityEmpty)
    );

    let mut cursor = 0;
    assert_eq!(
        parse_priority(b"<1x>", &mut cursor),
        Err(ParseError::PriorityNonDigit)
    );

    let mut cursor = 0;
    assert_eq!(
        parse_priority(b"<34", &mut cursor),
        Err(ParseError::PriorityEmpty)
    );

    let mut cursor = 0;
    assert_eq!(
        parse_priority(b"", &mut cursor),
        Err(ParseError::PriorityEmpty)
    );

    let mut cursor = 0;
    assert_eq!(
        parse_priority(b"<1000>", &mut cursor),
        Err(ParseError::PriorityOutOfRange)
    );
}

#[test]
fn version_valid() {
    let mut cursor = 0;
    assert_eq!(parse_version(b"1 ", &mut cursor).unwrap(), 1);
    assert_eq!(cursor, 1);

    let mut cursor = 0;
    assert_eq!(parse_version(b"999 ", &mut cursor).unwrap(), 999);
    assert_eq!(cursor, 3);
}

#[test]
fn version_invalid() {
    for input in [&b"0 "[..], b"x 1", b"12", b"1234 ", b""] {
        let mut cursor = 0;
        assert_eq!(
            parse_version(input, &mut cursor),
            Err(ParseError::VersionInvalid),
            "input {:?}",
            String::from_utf8_lossy(input)
        );
    }
}

#[test]
fn two_digits_bounds() {
    let mut cursor = 0;
    assert_eq!(
        parse_2digits(b"07", &mut cursor, 1, 12, ParseError::MonthInvalid).unwrap(),
        7
    );
    assert_eq!(cursor, 2);

    let mut cursor = 0;
    assert_eq!(
        parse_2digits(b"13", &mut cursor, 1, 12, ParseError::MonthInvalid),
        Err(ParseError::MonthInvalid)
    );

    let mut cursor = 0;
    assert_eq!(
        parse_2digits(b"7x", &mut cursor, 1, 12, ParseError::MonthInvalid),
        Err(ParseError::MonthInvalid)
    );

    let mut cursor = 0;
    assert_eq!(
        parse_2digits(b"7", &mut cursor, 1, 12, ParseError::MonthInvalid),
        Err(ParseError::MonthInvalid)
    );
}

#[test]
fn hostname_stops_at_space() {
    let mut cursor = 0;
    assert_eq!(parse_hostname(b"mymachine the rest", &mut cursor), "mymachine");
    assert_eq!(cursor, 9);

    let mut cursor = 0;
    assert_eq!(parse_hostname(b"lonehost", &mut cursor), "lonehost");
    assert_eq!(cursor, 8);
}

#[test]
fn up_to_len_accepts_exact_maximum() {
    let mut cursor = 0;
    let value = parse_up_to_len(b"abcd rest", &mut cursor, 4, ParseError::InvalidAppName).unwrap();
    assert_eq!(value, "abcd");
    assert_eq!(cursor, 4);
}

#[test]
fn up_to_len_clamps_cursor_on_overflow() {
    let mut cursor = 0;
    assert_eq!(
        parse_up_to_len(b"abcdefgh", &mut cursor, 4, ParseError::InvalidAppName),
        Err(ParseError::InvalidAppName)
    );
    assert_eq!(cursor, 4);
}

#[test]
fn up_to_len_fails_without_terminator() {
    let mut cursor = 0;
    assert_eq!(
        parse_up_to_len(b"abc", &mut cursor, 48, ParseError::InvalidAppName),
        Err(ParseError::InvalidAppName)
    );
}

#[test]
fn nilvalue_maps_to_empty() {
    assert_eq!(nil_to_empty("-".into()), "");
    assert_eq!(nil_to_empty("-x".into()), "-x");
    assert_eq!(nil_to_empty("app".into()), "app");
}
