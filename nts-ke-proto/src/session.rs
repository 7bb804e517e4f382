use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::channel::SecureChannel;
use crate::decoder::{read_negotiated_data, NegotiatedData};
use crate::error::KeyExchangeError;
use crate::identifiers::NTS_KE_ALPN;
use crate::keys::export_session_keys;
use crate::message::ExchangeMessage;

/// Checks that the peer agreed to speak `ntske/1`.
pub fn ensure_negotiated(channel: &impl SecureChannel) -> Result<(), KeyExchangeError> {
    let protocol = channel.negotiated_protocol();
    if protocol == Some(NTS_KE_ALPN) {
        Ok(())
    } else {
        debug!(
            protocol = protocol.map(String::from_utf8_lossy).as_deref(),
            "peer did not negotiate ntske/1"
        );
        Err(KeyExchangeError::ProtocolNotNegotiated)
    }
}

/// Runs the client side of a key exchange over an established channel.
///
/// `data` should be seeded with the address of the peer. On success it holds
/// the negotiated parameters, the cookies and both session keys. On failure
/// its contents must not be used.
pub async fn exchange<C: SecureChannel>(
    channel: &mut C,
    data: &mut NegotiatedData,
) -> Result<(), KeyExchangeError> {
    ensure_negotiated(&*channel)?;

    let request = ExchangeMessage::client_request().pack()?;
    channel.write_all(&request).await?;
    channel.flush().await?;
    debug!(bytes = request.len(), "sent key exchange request");

    read_negotiated_data(&mut *channel, data).await?;
    debug!(cookies = data.cookies.len(), "received key exchange response");

    export_session_keys(&*channel, data)
}
