use thiserror::Error;

/// Errors produced while parsing a syslog record.
///
/// Values are cheap to clone so the same error can be handed to both
/// the record handler and an error channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The buffer does not start with `<`.
    #[error("priority sequence not found")]
    PriorityNoStart,

    /// `<>` with no digits, or the buffer ended inside the sequence.
    #[error("priority is empty")]
    PriorityEmpty,

    /// A non-digit byte between `<` and `>`.
    #[error("priority contains a non-digit byte")]
    PriorityNonDigit,

    /// The numeric value is outside `[0, 191]`.
    #[error("priority value out of range")]
    PriorityOutOfRange,

    /// Missing, zero, non-numeric or not followed by a space.
    #[error("version missing or malformed")]
    VersionInvalid,

    #[error("invalid year in timestamp")]
    YearInvalid,

    #[error("invalid month in timestamp")]
    MonthInvalid,

    #[error("invalid day in timestamp")]
    DayInvalid,

    #[error("invalid hour in timestamp")]
    HourInvalid,

    #[error("invalid minute in timestamp")]
    MinuteInvalid,

    #[error("invalid second in timestamp")]
    SecondInvalid,

    #[error("invalid fraction of second in timestamp")]
    SecFracInvalid,

    #[error("invalid time zone in timestamp")]
    TimeZoneInvalid,

    /// A timestamp component separator (`T`, `:`, `-`) is missing or
    /// the buffer ended mid-timestamp.
    #[error("invalid time format")]
    TimeFormatInvalid,

    /// No known timestamp layout matched.
    #[error("timestamp matches no known format")]
    TimestampUnknownFormat,

    /// Hostname missing, unterminated or longer than 255 bytes.
    #[error("invalid hostname")]
    InvalidHostname,

    /// App name missing, unterminated or longer than 48 bytes.
    #[error("invalid app name")]
    InvalidAppName,

    /// Proc id missing, unterminated or longer than 128 bytes.
    #[error("invalid proc id")]
    InvalidProcId,

    /// Msg id missing, unterminated or longer than 32 bytes.
    #[error("invalid msg id")]
    InvalidMsgId,

    /// Structured data is neither `-` nor a bracketed element.
    #[error("structured data missing opening bracket")]
    NoStructuredData,

    /// No `]` followed by end-of-buffer or a space was found.
    #[error("structured data bracket run is unterminated")]
    UnterminatedStructuredData,

    /// A Cisco ASA header was recognised but its timestamp would not
    /// parse.
    #[error("malformed Cisco ASA timestamp")]
    CiscoAsaTimestamp,

    /// A SonicWall header was recognised but its `time="..."` field
    /// would not parse.
    #[error("malformed SonicWall timestamp")]
    SonicWallTimestamp,

    /// A FortiOS header was recognised but its `eventtime=` field
    /// would not parse.
    #[error("malformed FortiOS event time")]
    FortiOsEventTime,
}
