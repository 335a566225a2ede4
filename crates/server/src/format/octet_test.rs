//! Tests for the RFC 6587 octet-counted framer.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::READ_BUFFER_SIZE;
use crate::error::ServerError;
use crate::format::OctetCounting;

fn decoder() -> OctetCounting {
    OctetCounting::new(READ_BUFFER_SIZE)
}

#[test]
fn single_frame() {
    let mut src = BytesMut::from(&b"10 I am test."[..]);
    let mut decoder = decoder();

    let frame = decoder.decode_eof(&mut src).unwrap().unwrap();
    assert_eq!(&frame[..], b"I am test.");
    assert!(decoder.decode_eof(&mut src).unwrap().is_none());
}

#[test]
fn multiple_frames_back_to_back() {
    let messages: [&[u8]; 3] = [b"I am test.", b"I am test 2.", b"hahahahah"];
    let mut src = BytesMut::new();
    for msg in messages {
        src.extend_from_slice(format!("{} ", msg.len()).as_bytes());
        src.extend_from_slice(msg);
    }

    let mut decoder = decoder();
    for msg in messages {
        let frame = decoder.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(&frame[..], msg);
    }
    assert!(decoder.decode_eof(&mut src).unwrap().is_none());
}

#[test]
fn short_count_emits_declared_length_then_fails() {
    // nine declared bytes followed by what the sender thought was the
    // next frame
    let mut src = BytesMut::from(&b"9 I am test.2 ab"[..]);
    let mut decoder = decoder();

    let frame = decoder.decode(&mut src).unwrap().unwrap();
    assert_eq!(&frame[..], b"I am test");

    // leftover ".2 ab" cannot start a frame
    assert!(matches!(
        decoder.decode(&mut src),
        Err(ServerError::InvalidOctetCount)
    ));
}

#[test]
fn partial_frame_requests_more_input() {
    let mut decoder = decoder();

    let mut src = BytesMut::from(&b"12 hello"[..]);
    assert!(decoder.decode(&mut src).unwrap().is_none());

    src.extend_from_slice(b" world!");
    let frame = decoder.decode(&mut src).unwrap().unwrap();
    assert_eq!(&frame[..], b"hello world!");
}

#[test]
fn partial_count_field_requests_more_input() {
    let mut decoder = decoder();

    let mut src = BytesMut::from(&b"1"[..]);
    assert!(decoder.decode(&mut src).unwrap().is_none());

    src.extend_from_slice(b"0 I am test.");
    let frame = decoder.decode(&mut src).unwrap().unwrap();
    assert_eq!(&frame[..], b"I am test.");
}

#[test]
fn eof_mid_frame_is_an_error() {
    let mut src = BytesMut::from(&b"100 only a few bytes"[..]);
    let mut decoder = decoder();

    assert!(matches!(
        decoder.decode_eof(&mut src),
        Err(ServerError::TruncatedFrame)
    ));
}

#[test]
fn non_digit_count_is_an_error() {
    let mut src = BytesMut::from(&b"1x0 nope"[..]);
    let mut decoder = decoder();

    assert!(matches!(
        decoder.decode(&mut src),
        Err(ServerError::InvalidOctetCount)
    ));
}

#[test]
fn leading_space_is_an_error() {
    let mut src = BytesMut::from(&b" 5 abcde"[..]);
    let mut decoder = decoder();

    assert!(matches!(
        decoder.decode(&mut src),
        Err(ServerError::InvalidOctetCount)
    ));
}

#[test]
fn oversized_count_field_is_an_error() {
    let mut src = BytesMut::from(&b"99999999999999999999 x"[..]);
    let mut decoder = decoder();

    assert!(matches!(
        decoder.decode(&mut src),
        Err(ServerError::InvalidOctetCount)
    ));
}

#[test]
fn count_past_frame_cap_is_an_error() {
    let mut src = BytesMut::from(&b"999999999 x"[..]);
    let mut decoder = decoder();

    assert!(matches!(
        decoder.decode(&mut src),
        Err(ServerError::FrameTooLong { .. })
    ));
}

#[test]
fn zero_length_frame() {
    let mut src = BytesMut::from(&b"0 5 hello"[..]);
    let mut decoder = decoder();

    let frame = decoder.decode(&mut src).unwrap().unwrap();
    assert!(frame.is_empty());
    let frame = decoder.decode(&mut src).unwrap().unwrap();
    assert_eq!(&frame[..], b"hello");
}
