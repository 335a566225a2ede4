//! Syslog message parsing.
//!
//! Parsers for the two wire grammars found in the wild, plus the vendor
//! dialects that silently violate them:
//!
//! - **RFC 3164** (BSD syslog) — legacy format, still emitted by most
//!   network equipment. Recognises Cisco ASA (classic and
//!   RFC5424-timestamped), SonicWall/SonicOS and FortiOS dialects.
//! - **RFC 5424** (IETF syslog) — structured format, including the
//!   Cisco Meraki Unix-epoch timestamp and Cisco ASA deviations.
//!
//! Both parsers are tolerant: a malformed message still produces a
//! best-effort [`LogParts`] record, with the first error reported
//! alongside so callers can decide what to do with it.
//!
//! # Example
//!
//! ```
//! let (parts, err) = siphon_parser::rfc5424::parse(
//!     b"<34>1 2018-01-12T22:14:15+00:00 mymachine app proc msg - hello",
//! );
//! assert!(err.is_none());
//! assert_eq!(parts.facility, 4);
//! assert_eq!(parts.severity, 2);
//! assert_eq!(parts.hostname, "mymachine");
//! ```

mod error;
mod message;
mod pri;
mod scan;
mod timestamp;

pub mod rfc3164;
pub mod rfc5424;

pub use error::ParseError;
pub use message::LogParts;
pub use pri::Priority;
