//! The small part of a TLS connection that the key exchange relies on.
//!
//! Keeping this narrow allows the exchange to be driven over an in-memory
//! channel in tests.

use tokio::io::{AsyncRead, AsyncWrite};

pub trait KeyingMaterialExporter {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fills `output` with keying material for the given label and context
    /// (RFC 5705).
    fn export_keying_material(
        &self,
        output: &mut [u8],
        label: &[u8],
        context: &[u8],
    ) -> Result<(), Self::Error>;
}

/// An established secure connection to the key exchange peer.
pub trait SecureChannel: AsyncRead + AsyncWrite + Unpin + KeyingMaterialExporter {
    /// The protocol agreed on through ALPN, if any.
    fn negotiated_protocol(&self) -> Option<&[u8]>;
}

impl<Data> KeyingMaterialExporter for rustls::ConnectionCommon<Data> {
    type Error = rustls::Error;

    fn export_keying_material(
        &self,
        output: &mut [u8],
        label: &[u8],
        context: &[u8],
    ) -> Result<(), rustls::Error> {
        rustls::ConnectionCommon::export_keying_material(self, output, label, Some(context))?;
        Ok(())
    }
}

impl<IO> KeyingMaterialExporter for tokio_rustls::client::TlsStream<IO> {
    type Error = rustls::Error;

    fn export_keying_material(
        &self,
        output: &mut [u8],
        label: &[u8],
        context: &[u8],
    ) -> Result<(), rustls::Error> {
        let (_, connection) = self.get_ref();
        KeyingMaterialExporter::export_keying_material(&**connection, output, label, context)
    }
}

impl<IO> KeyingMaterialExporter for tokio_rustls::server::TlsStream<IO> {
    type Error = rustls::Error;

    fn export_keying_material(
        &self,
        output: &mut [u8],
        label: &[u8],
        context: &[u8],
    ) -> Result<(), rustls::Error> {
        let (_, connection) = self.get_ref();
        KeyingMaterialExporter::export_keying_material(&**connection, output, label, context)
    }
}

impl<IO: AsyncRead + AsyncWrite + Unpin> SecureChannel for tokio_rustls::client::TlsStream<IO> {
    fn negotiated_protocol(&self) -> Option<&[u8]> {
        self.get_ref().1.alpn_protocol()
    }
}

impl<IO: AsyncRead + AsyncWrite + Unpin> SecureChannel for tokio_rustls::server::TlsStream<IO> {
    fn negotiated_protocol(&self) -> Option<&[u8]> {
        self.get_ref().1.alpn_protocol()
    }
}
