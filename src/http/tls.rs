use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{
    ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme, SupportedCipherSuite,
};

use crate::error::{AppError, AppResult, HttpError};

const HTTP1_ALPN: &[u8] = b"http/1.1";

/// Client certificate chain and key for mutual TLS.
#[derive(Debug)]
pub struct ClientIdentity {
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

/// Everything the shared TLS client config is built from.
#[derive(Debug, Default)]
pub struct TlsSettings {
    pub identity: Option<ClientIdentity>,
    pub insecure: bool,
    pub cipher_suite: Option<SupportedCipherSuite>,
}

/// Looks up a cipher suite by name, case-insensitively. TLS 1.3 suites
/// answer to both the IANA spelling (`TLS_AES_128_GCM_SHA256`) and the
/// rustls one (`TLS13_AES_128_GCM_SHA256`).
#[must_use]
pub fn find_cipher_suite(name: &str) -> Option<SupportedCipherSuite> {
    let wanted = name.trim();
    rustls::crypto::ring::ALL_CIPHER_SUITES
        .iter()
        .copied()
        .find(|suite| {
            suite_name(*suite).eq_ignore_ascii_case(wanted)
                || rustls_suite_name(*suite).eq_ignore_ascii_case(wanted)
        })
}

/// IANA names accepted by [`find_cipher_suite`].
#[must_use]
pub fn cipher_suite_names() -> Vec<String> {
    rustls::crypto::ring::ALL_CIPHER_SUITES
        .iter()
        .map(|suite| suite_name(*suite))
        .collect()
}

fn suite_name(suite: SupportedCipherSuite) -> String {
    let name = rustls_suite_name(suite);
    match name.strip_prefix("TLS13_") {
        Some(rest) => format!("TLS_{}", rest),
        None => name,
    }
}

fn rustls_suite_name(suite: SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

/// Loads a PEM certificate chain and private key.
///
/// # Errors
///
/// Returns an error if either file cannot be read or parsed, or the
/// certificate file holds no certificates.
pub fn load_identity(cert_path: &Path, key_path: &Path) -> AppResult<ClientIdentity> {
    let certs = CertificateDer::pem_file_iter(cert_path)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|source| HttpError::ReadCert {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(AppError::http(HttpError::EmptyCert {
            path: cert_path.to_path_buf(),
        }));
    }
    let key = PrivateKeyDer::from_pem_file(key_path).map_err(|source| HttpError::ReadKey {
        path: key_path.to_path_buf(),
        source,
    })?;
    Ok(ClientIdentity { certs, key })
}

/// Builds the client config shared by every connection of a run.
///
/// # Errors
///
/// Returns an error if rustls rejects the protocol versions or the client
/// identity.
pub fn build_client_config(settings: TlsSettings) -> AppResult<Arc<ClientConfig>> {
    let mut provider = rustls::crypto::ring::default_provider();
    let versions: Vec<&'static rustls::SupportedProtocolVersion> = match settings.cipher_suite {
        Some(suite) => {
            provider.cipher_suites = vec![suite];
            vec![suite.version()]
        }
        None => rustls::DEFAULT_VERSIONS.to_vec(),
    };
    let provider = Arc::new(provider);

    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(&versions)
        .map_err(tls_error)?;

    let builder = if settings.insecure {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate::new(&provider)))
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots)
    };

    let mut config = match settings.identity {
        Some(identity) => builder
            .with_client_auth_cert(identity.certs, identity.key)
            .map_err(tls_error)?,
        None => builder.with_no_client_auth(),
    };
    config.alpn_protocols = vec![HTTP1_ALPN.to_vec()];
    Ok(Arc::new(config))
}

fn tls_error(source: rustls::Error) -> AppError {
    AppError::http(HttpError::TlsConfig { source })
}

/// Accepts any server certificate. Handshake signatures are still checked
/// so the session keys stay bound to the presented certificate.
#[derive(Debug)]
struct AcceptAnyCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl AcceptAnyCertificate {
    const fn new(provider: &CryptoProvider) -> Self {
        Self {
            algorithms: provider.signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
