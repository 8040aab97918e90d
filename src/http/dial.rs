use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::{TlsConnector, client::TlsStream};

use crate::config::{RunConfig, Scheme, Target};
use crate::error::RequestError;
use crate::metrics::ThroughputCounters;

use super::counting::CountingStream;

type CountedTcp = CountingStream<TcpStream>;

/// An established connection to a target, plain or TLS. The byte counter
/// sits beneath TLS, so handshake and record overhead are included.
#[derive(Debug)]
pub enum TargetStream {
    Plain(CountedTcp),
    Tls(Box<TlsStream<CountedTcp>>),
}

/// Opens counted connections for a run. Cheap to clone; one per worker.
#[derive(Clone)]
pub struct Dialer {
    connector: TlsConnector,
    server_name_override: Option<ServerName<'static>>,
    throughput: Arc<ThroughputCounters>,
}

impl Dialer {
    #[must_use]
    pub fn new(config: &RunConfig, throughput: Arc<ThroughputCounters>) -> Self {
        Self {
            connector: TlsConnector::from(Arc::clone(&config.tls)),
            server_name_override: config.server_name_override.clone(),
            throughput,
        }
    }

    /// Connects to the target's own host and port, performing the TLS
    /// handshake for https targets. The certificate is checked against the
    /// override name when one is set, not the dialed host. Callers bound
    /// this with the write timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connect or TLS handshake fails.
    pub async fn connect(&self, target: &Target) -> Result<TargetStream, RequestError> {
        let tcp = TcpStream::connect((target.host(), target.port()))
            .await
            .map_err(|source| RequestError::Connect {
                addr: target.dial_addr(),
                source,
            })?;
        if let Err(err) = tcp.set_nodelay(true) {
            tracing::debug!("Failed to set TCP_NODELAY: {}", err);
        }
        let stream = CountingStream::new(tcp, Arc::clone(&self.throughput));

        match target.scheme() {
            Scheme::Http => Ok(TargetStream::Plain(stream)),
            Scheme::Https => {
                let server_name = target
                    .verification_name(self.server_name_override.as_ref())
                    .ok_or_else(|| RequestError::Tls {
                        server_name: target.host().to_owned(),
                        source: io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "host is not a valid TLS server name",
                        ),
                    })?;
                let display_name = server_name.to_str().into_owned();
                let tls = self
                    .connector
                    .connect(server_name, stream)
                    .await
                    .map_err(|source| RequestError::Tls {
                        server_name: display_name,
                        source,
                    })?;
                Ok(TargetStream::Tls(Box::new(tls)))
            }
        }
    }
}

pub(super) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl AsyncRead for TargetStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TargetStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_write_vectored(cx, bufs),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_write_vectored(cx, bufs),
        }
    }

    fn is_write_vectored(&self) -> bool {
        match self {
            TargetStream::Plain(stream) => stream.is_write_vectored(),
            TargetStream::Tls(stream) => stream.is_write_vectored(),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TargetStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            TargetStream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}
