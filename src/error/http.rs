use std::path::PathBuf;

use thiserror::Error;

/// Fatal, pre-run failures while loading the resources a run depends on.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to read URL file '{path}': {source}")]
    ReadUrlFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("URL file '{path}' was empty.")]
    UrlFileEmpty { path: PathBuf },
    #[error("Failed to read body file '{path}': {source}")]
    ReadBodyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read cert '{path}': {source}")]
    ReadCert {
        path: PathBuf,
        #[source]
        source: rustls::pki_types::pem::Error,
    },
    #[error("Cert file '{path}' contained no certificates.")]
    EmptyCert { path: PathBuf },
    #[error("Failed to read key '{path}': {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: rustls::pki_types::pem::Error,
    },
    #[error("Failed to build TLS config: {source}")]
    TlsConfig {
        #[source]
        source: rustls::Error,
    },
    #[error("Failed to build request for '{url}': {source}")]
    BuildRequest {
        url: String,
        #[source]
        source: http::Error,
    },
}

/// Per-request failures. These never abort a run; they are counted as
/// network failures and forwarded as error notices.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("dial {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tls handshake with {server_name}: {source}")]
    Tls {
        server_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} timed out after {timeout_ms}ms")]
    Timeout {
        stage: &'static str,
        timeout_ms: u64,
    },
    #[error("http handshake: {source}")]
    Handshake {
        #[source]
        source: hyper::Error,
    },
    #[error("request: {source}")]
    Transport {
        #[source]
        source: hyper::Error,
    },
    #[error("reading body: {source}")]
    Body {
        #[source]
        source: hyper::Error,
    },
}
