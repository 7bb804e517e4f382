use crate::error::KeyExchangeError;
use crate::identifiers::{AeadAlgorithm, NextProtocol};
use crate::record::Record;

/// A series of records to be sent to the peer in a single write.
///
/// Records are packed in the order they were added. Callers are responsible
/// for finishing the message with [`Record::EndOfMessage`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeMessage {
    records: Vec<Record>,
}

impl ExchangeMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The request a client sends: NTPv4 with AES-SIV-CMAC-256.
    pub fn client_request() -> Self {
        let mut message = Self::new();
        message.add_record(Record::NextProtocol {
            protocol_id: NextProtocol::NTPv4,
        });
        message.add_record(Record::AeadAlgorithm {
            algorithm_ids: vec![AeadAlgorithm::AeadAesSivCmac256],
        });
        message.add_record(Record::EndOfMessage);
        message
    }

    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn pack(&self) -> Result<Vec<u8>, KeyExchangeError> {
        let mut buf = Vec::with_capacity(1024);
        for record in &self.records {
            record.serialize(&mut buf)?;
        }

        Ok(buf)
    }
}

impl FromIterator<Record> for ExchangeMessage {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
