use chrono::{DateTime, Utc};

/// The structured record handed to the application handler.
///
/// Every parse produces one `LogParts`, even for malformed input — the
/// fields are best-effort and the parse error travels separately.
/// String fields are empty when the message did not carry them
/// (RFC 5424 NILVALUE included), with one exception: `structured_data`
/// keeps the literal `-`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogParts {
    /// Raw `<PRI>` value.
    pub priority: u8,
    /// `priority / 8`.
    pub facility: u8,
    /// `priority % 8`.
    pub severity: u8,

    /// RFC 5424 protocol version; `None` for RFC 3164 messages.
    pub version: Option<u16>,

    /// Message timestamp, UTC-normalised. `None` only before record
    /// assembly; the receiver substitutes the current instant.
    pub timestamp: Option<DateTime<Utc>>,

    /// Hostname from the header, or empty.
    pub hostname: String,

    /// RFC 5424 APP-NAME.
    pub app_name: String,
    /// RFC 5424 PROCID.
    pub proc_id: String,
    /// RFC 5424 MSGID.
    pub msg_id: String,
    /// RFC 5424 STRUCTURED-DATA: `-` or one or more bracketed
    /// SD-ELEMENTs, verbatim.
    pub structured_data: String,
    /// RFC 5424 message body. For compatibility with existing
    /// consumers this is the full original line, not the tail after
    /// the structured data.
    pub message: String,

    /// RFC 3164 tag (program name).
    pub tag: String,
    /// RFC 3164 content: the full original line including `<PRI>`.
    pub content: String,

    /// Remote address, attached by the receiver.
    pub client: String,
    /// TLS peer name, attached by the receiver; empty for non-TLS
    /// transports.
    pub tls_peer: String,
}
