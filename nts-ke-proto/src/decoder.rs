use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::error::KeyExchangeError;
use crate::identifiers::{AeadAlgorithm, DEFAULT_NTP_PORT};
use crate::keys::SessionKey;
use crate::record::{record_type, Record, RecordHeader};

/// Everything learned from the key exchange, needed for the NTS queries that
/// follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedData {
    /// NTP server to query, the key exchange server unless it tells us otherwise
    pub server: String,
    pub port: u16,
    /// Cookies in the order they were received
    pub cookies: Vec<Vec<u8>>,
    pub algorithm: Option<AeadAlgorithm>,
    pub c2s_key: Option<SessionKey>,
    pub s2c_key: Option<SessionKey>,
}

impl NegotiatedData {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: DEFAULT_NTP_PORT,
            cookies: vec![],
            algorithm: None,
            c2s_key: None,
            s2c_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Reading,
    Done,
}

/// Reads records from the server response until the end of message record,
/// storing what they negotiate.
///
/// Unrecognized records without the critical bit are skipped. An
/// unrecognized record with the critical bit set ends decoding before its
/// body is read.
pub struct ResponseDecoder<'a> {
    data: &'a mut NegotiatedData,
    state: DecodeState,
}

impl<'a> ResponseDecoder<'a> {
    pub fn new(data: &'a mut NegotiatedData) -> Self {
        Self {
            data,
            state: DecodeState::Reading,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Reads and handles a single record.
    pub async fn step(
        &mut self,
        mut reader: impl AsyncRead + Unpin,
    ) -> Result<DecodeState, KeyExchangeError> {
        if self.state == DecodeState::Done {
            return Ok(DecodeState::Done);
        }

        let header = RecordHeader::read(&mut reader).await?;

        if header.critical && !is_recognized(header.record_type) {
            return Err(KeyExchangeError::UnsupportedCriticalRecord(
                header.record_type,
            ));
        }

        let record = Record::read_body(header, &mut reader).await?;
        self.state = self.step_with_record(header, record)?;

        Ok(self.state)
    }

    fn step_with_record(
        &mut self,
        header: RecordHeader,
        record: Record,
    ) -> Result<DecodeState, KeyExchangeError> {
        match record {
            Record::EndOfMessage => return Ok(DecodeState::Done),
            Record::NextProtocol { protocol_id } => {
                // any protocol the server picks is accepted
                debug!(?protocol_id, "server selected next protocol");
            }
            Record::AeadAlgorithm { algorithm_ids } => {
                if let Some(&algorithm) = algorithm_ids.first() {
                    self.data.algorithm = Some(algorithm);
                }
            }
            Record::NewCookie { cookie_data } => {
                self.data.cookies.push(cookie_data);
            }
            Record::Server { address, .. } => {
                self.data.server = String::from_utf8(address).map_err(|_| header.malformed())?;
                debug!(server = %self.data.server, "negotiated NTP server");
            }
            Record::Port { port, .. } => {
                self.data.port = port;
                debug!(port, "negotiated NTP port");
            }
            Record::Error { errorcode } => return Err(KeyExchangeError::Remote(errorcode)),
            Record::Warning { warningcode } => {
                // no warning codes are defined, so none can be acted upon
                let code = u16::from(warningcode);
                warn!(warningcode = code, "Received key exchange warning code");
                return Err(KeyExchangeError::UnknownWarning(code));
            }
            Record::Unknown {
                record_type,
                critical: true,
                ..
            } => return Err(KeyExchangeError::UnsupportedCriticalRecord(record_type)),
            Record::Unknown {
                record_type, data, ..
            } => {
                debug!(record_type, length = data.len(), "skipped unknown record");
            }
        }

        Ok(DecodeState::Reading)
    }

    pub async fn run(mut self, mut reader: impl AsyncRead + Unpin) -> Result<(), KeyExchangeError> {
        while self.step(&mut reader).await? != DecodeState::Done {}

        Ok(())
    }
}

fn is_recognized(code: u16) -> bool {
    matches!(code, record_type::END_OF_MESSAGE..=record_type::PORT)
}

/// Decodes a complete server response into `data`.
///
/// On error `data` may be partially updated and must not be used.
pub async fn read_negotiated_data(
    reader: impl AsyncRead + Unpin,
    data: &mut NegotiatedData,
) -> Result<(), KeyExchangeError> {
    ResponseDecoder::new(data).run(reader).await
}
