use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::KeyExchangeError;
use crate::identifiers::{AeadAlgorithm, ErrorCode, NextProtocol, WarningCode};

const CRITICAL_BIT: u16 = 0x8000;

pub(crate) mod record_type {
    pub const END_OF_MESSAGE: u16 = 0;
    pub const NEXT_PROTOCOL: u16 = 1;
    pub const ERROR: u16 = 2;
    pub const WARNING: u16 = 3;
    pub const AEAD_ALGORITHM: u16 = 4;
    pub const NEW_COOKIE: u16 = 5;
    pub const SERVER: u16 = 6;
    pub const PORT: u16 = 7;
}

/// The four bytes in front of every record: the record type with the critical
/// bit in its top position, followed by the length of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub record_type: u16,
    pub critical: bool,
    pub body_length: u16,
}

impl RecordHeader {
    pub const SIZE: usize = 4;

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut record_type = self.record_type & !CRITICAL_BIT;
        if self.critical {
            record_type |= CRITICAL_BIT;
        }

        let [t0, t1] = record_type.to_be_bytes();
        let [l0, l1] = self.body_length.to_be_bytes();
        [t0, t1, l0, l1]
    }

    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let raw_type = u16::from_be_bytes([bytes[0], bytes[1]]);

        Self {
            record_type: raw_type & !CRITICAL_BIT,
            critical: raw_type & CRITICAL_BIT != 0,
            body_length: u16::from_be_bytes([bytes[2], bytes[3]]),
        }
    }

    pub async fn read(mut reader: impl AsyncRead + Unpin) -> Result<Self, KeyExchangeError> {
        let mut bytes = [0; Self::SIZE];
        reader
            .read_exact(&mut bytes)
            .await
            .map_err(KeyExchangeError::from_read)?;

        Ok(Self::from_bytes(bytes))
    }

    pub(crate) fn malformed(&self) -> KeyExchangeError {
        KeyExchangeError::MalformedRecord {
            record_type: self.record_type,
            body_length: self.body_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Record {
    EndOfMessage,
    NextProtocol {
        protocol_id: NextProtocol,
    },
    Error {
        errorcode: ErrorCode,
    },
    Warning {
        warningcode: WarningCode,
    },
    AeadAlgorithm {
        algorithm_ids: Vec<AeadAlgorithm>,
    },
    NewCookie {
        cookie_data: Vec<u8>,
    },
    Server {
        critical: bool,
        address: Vec<u8>,
    },
    Port {
        critical: bool,
        port: u16,
    },
    Unknown {
        record_type: u16,
        critical: bool,
        data: Vec<u8>,
    },
}

impl Record {
    pub fn record_type(&self) -> u16 {
        use record_type::*;

        match self {
            Record::EndOfMessage => END_OF_MESSAGE,
            Record::NextProtocol { .. } => NEXT_PROTOCOL,
            Record::Error { .. } => ERROR,
            Record::Warning { .. } => WARNING,
            Record::AeadAlgorithm { .. } => AEAD_ALGORITHM,
            Record::NewCookie { .. } => NEW_COOKIE,
            Record::Server { .. } => SERVER,
            Record::Port { .. } => PORT,
            Record::Unknown { record_type, .. } => record_type & !CRITICAL_BIT,
        }
    }

    pub fn is_critical(&self) -> bool {
        match self {
            Record::EndOfMessage
            | Record::NextProtocol { .. }
            | Record::Error { .. }
            | Record::Warning { .. }
            | Record::AeadAlgorithm { .. } => true,
            // an implementation that does not know cookies can safely skip them
            Record::NewCookie { .. } => false,
            Record::Server { critical, .. }
            | Record::Port { critical, .. }
            | Record::Unknown { critical, .. } => *critical,
        }
    }

    fn write_payload(&self, payload: &mut Vec<u8>) {
        match self {
            Record::EndOfMessage => {}
            Record::NextProtocol { protocol_id } => {
                payload.extend_from_slice(&u16::from(*protocol_id).to_be_bytes())
            }
            Record::Error { errorcode } => {
                payload.extend_from_slice(&u16::from(*errorcode).to_be_bytes())
            }
            Record::Warning { warningcode } => {
                payload.extend_from_slice(&u16::from(*warningcode).to_be_bytes())
            }
            Record::AeadAlgorithm { algorithm_ids } => {
                for &id in algorithm_ids {
                    payload.extend_from_slice(&u16::from(id).to_be_bytes());
                }
            }
            Record::NewCookie { cookie_data } => payload.extend_from_slice(cookie_data),
            Record::Server { address, .. } => payload.extend_from_slice(address),
            Record::Port { port, .. } => payload.extend_from_slice(&port.to_be_bytes()),
            Record::Unknown { data, .. } => payload.extend_from_slice(data),
        }
    }

    /// Appends the wire form of this record to `buf`. Nothing is appended
    /// when the payload does not fit in a record.
    pub fn serialize(&self, buf: &mut Vec<u8>) -> Result<(), KeyExchangeError> {
        let mut payload = Vec::new();
        self.write_payload(&mut payload);

        let body_length = u16::try_from(payload.len())
            .map_err(|_| KeyExchangeError::RecordTooLong(payload.len()))?;

        let header = RecordHeader {
            record_type: self.record_type(),
            critical: self.is_critical(),
            body_length,
        };

        buf.extend_from_slice(&header.to_bytes());
        buf.extend_from_slice(&payload);

        Ok(())
    }

    pub async fn read(mut reader: impl AsyncRead + Unpin) -> Result<Self, KeyExchangeError> {
        let header = RecordHeader::read(&mut reader).await?;
        Self::read_body(header, reader).await
    }

    /// Reads exactly `header.body_length` bytes and interprets them according
    /// to the record type in `header`.
    pub async fn read_body(
        header: RecordHeader,
        mut reader: impl AsyncRead + Unpin,
    ) -> Result<Self, KeyExchangeError> {
        let mut body = vec![0; header.body_length.into()];
        reader
            .read_exact(&mut body)
            .await
            .map_err(KeyExchangeError::from_read)?;

        Self::from_body(header, body)
    }

    fn from_body(header: RecordHeader, body: Vec<u8>) -> Result<Self, KeyExchangeError> {
        use record_type::*;

        let record = match header.record_type {
            END_OF_MESSAGE => Record::EndOfMessage,
            NEXT_PROTOCOL => Record::NextProtocol {
                protocol_id: single_u16(&header, &body)?.into(),
            },
            ERROR => Record::Error {
                errorcode: single_u16(&header, &body)?.into(),
            },
            WARNING => Record::Warning {
                warningcode: single_u16(&header, &body)?.into(),
            },
            AEAD_ALGORITHM => {
                let chunks = body.chunks_exact(2);
                if !chunks.remainder().is_empty() {
                    return Err(header.malformed());
                }

                Record::AeadAlgorithm {
                    algorithm_ids: chunks
                        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]).into())
                        .collect(),
                }
            }
            NEW_COOKIE => Record::NewCookie { cookie_data: body },
            SERVER => Record::Server {
                critical: header.critical,
                address: body,
            },
            PORT => Record::Port {
                critical: header.critical,
                port: single_u16(&header, &body)?,
            },
            record_type => Record::Unknown {
                record_type,
                critical: header.critical,
                data: body,
            },
        };

        Ok(record)
    }
}

fn single_u16(header: &RecordHeader, body: &[u8]) -> Result<u16, KeyExchangeError> {
    match *body {
        [high, low] => Ok(u16::from_be_bytes([high, low])),
        _ => Err(header.malformed()),
    }
}
