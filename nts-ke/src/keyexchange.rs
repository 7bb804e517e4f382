use std::{
    io::{BufRead, BufReader},
    net::{Ipv6Addr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use nts_ke_proto::{
    ensure_negotiated, exchange, KeyExchangeError, NegotiatedData, DEFAULT_KE_PORT, NTS_KE_ALPN,
};
use rustls::pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer, ServerName};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};
use tokio_rustls::{client, server, TlsAcceptor, TlsConnector};
use tracing::{debug, warn};

pub type ClientChannel = client::TlsStream<TcpStream>;
pub type ServerChannel = server::TlsStream<TcpStream>;

fn io_error(msg: impl Into<String>) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.into())
}

fn pem_error(error: rustls::pki_types::pem::Error) -> std::io::Error {
    match error {
        rustls::pki_types::pem::Error::Io(error) => error,
        other => io_error(other.to_string()),
    }
}

/// Splits `host`, `host:port`, `[v6]` or `[v6]:port` into its parts, using
/// the key exchange port when none is given. An IPv6 literal without
/// brackets is taken as a host without port.
pub fn split_host_port(host_port: &str) -> Result<(String, u16), KeyExchangeError> {
    let invalid = || KeyExchangeError::InvalidServerName(host_port.to_string());

    let (host, port) = if let Some(bracketed) = host_port.strip_prefix('[') {
        let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
        match after {
            "" => (host, None),
            _ => (host, Some(after.strip_prefix(':').ok_or_else(invalid)?)),
        }
    } else if host_port.parse::<Ipv6Addr>().is_ok() {
        (host_port, None)
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    if host.is_empty() {
        return Err(invalid());
    }

    let port = match port {
        Some(port) => port.parse().map_err(|_| invalid())?,
        None => DEFAULT_KE_PORT,
    };

    Ok((host.to_string(), port))
}

pub fn certificates_from_bufread(
    mut reader: impl BufRead,
) -> std::io::Result<Vec<CertificateDer<'static>>> {
    CertificateDer::pem_reader_iter(&mut reader)
        .map(|item| item.map_err(pem_error))
        .collect()
}

pub fn certificates_from_file(path: &Path) -> std::io::Result<Vec<CertificateDer<'static>>> {
    let file = std::fs::File::open(path).map_err(|e| {
        io_error(format!(
            "error reading certificate file at `{}`: {e}",
            path.display()
        ))
    })?;

    certificates_from_bufread(BufReader::new(file))
}

pub fn private_key_from_bufread(mut reader: impl BufRead) -> std::io::Result<PrivateKeyDer<'static>> {
    PrivateKeyDer::from_pem_reader(&mut reader).map_err(pem_error)
}

/// The platform's trusted roots, extended with the certificates in
/// `extra_certificate_paths`.
pub fn root_certificates(
    extra_certificate_paths: &[PathBuf],
) -> std::io::Result<rustls::RootCertStore> {
    let mut roots = rustls::RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        warn!(%error, "could not load platform root certificates");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!(added, ignored, "loaded platform root certificates");

    for path in extra_certificate_paths {
        for certificate in certificates_from_file(path)? {
            roots
                .add(certificate)
                .map_err(|e| io_error(format!("invalid certificate in {}: {e}", path.display())))?;
        }
    }

    Ok(roots)
}

pub fn client_config(roots: rustls::RootCertStore) -> Arc<rustls::ClientConfig> {
    let config =
        rustls::ClientConfig::builder_with_protocol_versions(&[&rustls::version::TLS13])
            .with_root_certificates(roots)
            .with_no_client_auth();

    Arc::new(config)
}

/// Establishes a TLS connection to a key exchange server and checks that it
/// speaks `ntske/1`.
///
/// The returned data names the connected peer and the default NTP port,
/// ready to be overwritten by the server's response.
pub async fn connect(
    host_port: &str,
    config: Arc<rustls::ClientConfig>,
    timeout: Duration,
) -> Result<(ClientChannel, NegotiatedData), KeyExchangeError> {
    let (host, port) = split_host_port(host_port)?;
    let server_name = ServerName::try_from(host.as_str())
        .map_err(|_| KeyExchangeError::InvalidServerName(host.clone()))?
        .to_owned();

    // the shared config may be used for other protocols
    let mut config = rustls::ClientConfig::clone(&config);
    config.alpn_protocols.clear();
    config.alpn_protocols.push(NTS_KE_ALPN.to_vec());
    let connector = TlsConnector::from(Arc::new(config));

    let stream = tokio::time::timeout(timeout, async {
        let socket = TcpStream::connect((host.as_str(), port)).await?;
        connector.connect(server_name, socket).await
    })
    .await
    .map_err(std::io::Error::from)??;

    ensure_negotiated(&stream)?;

    let peer = stream.get_ref().0.peer_addr()?;
    debug!(%peer, "established key exchange connection");

    Ok((stream, NegotiatedData::new(peer.ip().to_string())))
}

/// Runs a complete key exchange against `host_port`.
pub async fn key_exchange_client(
    host_port: &str,
    config: Arc<rustls::ClientConfig>,
    timeout: Duration,
) -> Result<NegotiatedData, KeyExchangeError> {
    let (mut stream, mut data) = connect(host_port, config, timeout).await?;

    exchange(&mut stream, &mut data).await?;

    if let Err(error) = stream.shutdown().await {
        debug!(?error, "closing key exchange connection failed");
    }

    Ok(data)
}

pub fn server_config(
    certificate_chain: Vec<CertificateDer<'static>>,
    private_key: PrivateKeyDer<'static>,
) -> Result<Arc<rustls::ServerConfig>, KeyExchangeError> {
    let mut config =
        rustls::ServerConfig::builder_with_protocol_versions(&[&rustls::version::TLS13])
            .with_no_client_auth()
            .with_single_cert(certificate_chain, private_key)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

    config.alpn_protocols.clear();
    config.alpn_protocols.push(NTS_KE_ALPN.to_vec());

    Ok(Arc::new(config))
}

/// Accepts the next connection on `listener` and completes the TLS handshake.
/// Clients that do not negotiate `ntske/1` are refused.
pub async fn accept(
    listener: &TcpListener,
    acceptor: &TlsAcceptor,
) -> Result<(ServerChannel, SocketAddr), KeyExchangeError> {
    let (stream, peer_address) = listener.accept().await?;
    let stream = acceptor.accept(stream).await?;

    if let Err(e) = ensure_negotiated(&stream) {
        debug!(?peer_address, "refusing client without ntske/1");
        return Err(e);
    }

    Ok((stream, peer_address))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_split_host_port() {
        let split = |s| split_host_port(s).unwrap();

        assert_eq!(split("time.example.com"), ("time.example.com".into(), 4460));
        assert_eq!(split("time.example.com:123"), ("time.example.com".into(), 123));
        assert_eq!(split("192.0.2.1"), ("192.0.2.1".into(), 4460));
        assert_eq!(split("192.0.2.1:4461"), ("192.0.2.1".into(), 4461));
        assert_eq!(split("[2001:db8::1]:4461"), ("2001:db8::1".into(), 4461));
        assert_eq!(split("[2001:db8::1]"), ("2001:db8::1".into(), 4460));
        assert_eq!(split("2001:db8::1"), ("2001:db8::1".into(), 4460));
        assert_eq!(split("::1"), ("::1".into(), 4460));
    }

    #[test]
    fn test_split_host_port_invalid() {
        for input in [
            "",
            ":4460",
            "time.example.com:",
            "time.example.com:http",
            "time.example.com:70000",
            "[2001:db8::1",
            "[2001:db8::1]4460",
            "[]:4460",
        ] {
            assert!(
                matches!(
                    split_host_port(input),
                    Err(KeyExchangeError::InvalidServerName(ref name)) if name == input
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_certificates_from_bufread() {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
        let mut pem = certified.cert.pem();
        pem.push_str(&certified.cert.pem());

        let certificates = certificates_from_bufread(Cursor::new(pem)).unwrap();
        assert_eq!(certificates.len(), 2);
        assert_eq!(certificates[0].as_ref(), certified.cert.der().as_ref());

        let certificates = certificates_from_bufread(Cursor::new("no pem here")).unwrap();
        assert!(certificates.is_empty());
    }

    #[test]
    fn test_private_key_from_bufread() {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
        let pem = certified.key_pair.serialize_pem();

        let key = private_key_from_bufread(Cursor::new(pem)).unwrap();
        assert_eq!(key.secret_der(), certified.key_pair.serialize_der().as_slice());

        assert!(private_key_from_bufread(Cursor::new(certified.cert.pem())).is_err());
    }

    #[test]
    fn test_server_config_advertises_ntske() {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
        let key = PrivateKeyDer::try_from(certified.key_pair.serialize_der()).unwrap();

        let config = server_config(vec![certified.cert.der().clone()], key).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"ntske/1".to_vec()]);
    }

    #[test]
    fn test_missing_certificate_file() {
        let result = certificates_from_file(Path::new("/nonexistent/ca.pem"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let config = client_config(rustls::RootCertStore::empty());
        let result = connect(&address.to_string(), config, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(KeyExchangeError::Io(_))));
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        // accepts the TCP connection but never answers the TLS handshake
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let config = client_config(rustls::RootCertStore::empty());
        let result = connect(&address.to_string(), config, Duration::from_millis(100)).await;
        match result {
            Err(KeyExchangeError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::TimedOut),
            other => panic!("expected timeout, got {:?}", other.map(|(_, data)| data)),
        }
    }
}
