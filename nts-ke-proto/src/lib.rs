//! Protocol core of Network Time Security key establishment (RFC 8915).
//!
//! This crate encodes and decodes key exchange records, runs the client side
//! of the exchange over an established [`SecureChannel`], and derives the
//! session keys. Setting up the TLS connection is left to the caller.

#![forbid(unsafe_code)]

mod channel;
mod decoder;
mod error;
mod identifiers;
mod keys;
mod message;
mod record;
mod session;

pub use channel::{KeyingMaterialExporter, SecureChannel};
pub use decoder::{read_negotiated_data, DecodeState, NegotiatedData, ResponseDecoder};
pub use error::KeyExchangeError;
pub use identifiers::{
    AeadAlgorithm, ErrorCode, NextProtocol, WarningCode, DEFAULT_KE_PORT, DEFAULT_NTP_PORT,
    NTS_KE_ALPN,
};
pub use keys::{export_session_keys, SessionKey, EXPORTER_LABEL};
pub use message::ExchangeMessage;
pub use record::{Record, RecordHeader};
pub use session::{ensure_negotiated, exchange};
