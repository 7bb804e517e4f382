use crate::identifiers::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum KeyExchangeError {
    #[error("Stream ended before a complete record was received")]
    TruncatedStream,
    #[error("Unrecognized record type {0} is marked as critical")]
    UnsupportedCriticalRecord(u16),
    #[error("Remote did not negotiate ntske/1")]
    ProtocolNotNegotiated,
    #[error("Could not export session keys: {0}")]
    KeyExportFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Malformed record of type {record_type} with body length {body_length}")]
    MalformedRecord { record_type: u16, body_length: u16 },
    /// The server sent an Error record. Reported with its code rather than
    /// as an unsupported critical record of type 2.
    #[error("Remote: {0}")]
    Remote(ErrorCode),
    #[error("Received warning code {0} from remote")]
    UnknownWarning(u16),
    #[error("Record body of {0} bytes does not fit in a record")]
    RecordTooLong(usize),
    #[error("Invalid server name: {0}")]
    InvalidServerName(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl KeyExchangeError {
    /// Every failure while reading a record is fatal: the stream cannot be
    /// resynchronized after a partial read.
    pub(crate) fn from_read(error: std::io::Error) -> Self {
        tracing::debug!(?error, "reading record failed");
        KeyExchangeError::TruncatedStream
    }
}
