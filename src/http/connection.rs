use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::task::JoinHandle;

use crate::config::{Scheme, Target};
use crate::error::RequestError;

use super::dial::{Dialer, duration_ms};

/// One HTTP/1.1 client connection owned by a single worker. The hyper
/// connection driver runs on its own task and is aborted with the handle.
pub struct Connection {
    sender: SendRequest<Full<Bytes>>,
    driver: JoinHandle<()>,
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Connection {
    /// Dials the target and completes the HTTP/1.1 handshake, all within the
    /// write timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if dialing or the handshake fails or times out.
    pub async fn open(
        dialer: &Dialer,
        target: &Target,
        write_timeout: Duration,
    ) -> Result<Self, RequestError> {
        let establish = async {
            let stream = dialer.connect(target).await?;
            http1::handshake(TokioIo::new(stream))
                .await
                .map_err(|source| RequestError::Handshake { source })
        };
        let (sender, conn) = tokio::time::timeout(write_timeout, establish)
            .await
            .map_err(|_elapsed| RequestError::Timeout {
                stage: "connect",
                timeout_ms: duration_ms(write_timeout),
            })??;

        let driver = tokio::spawn(async move {
            if let Err(err) = conn.await {
                tracing::debug!("Connection closed with error: {}", err);
            }
        });

        Ok(Self {
            sender,
            driver,
            scheme: target.scheme(),
            host: target.host().to_owned(),
            port: target.port(),
        })
    }

    /// Whether this connection was dialed to the same endpoint as `target`.
    #[must_use]
    pub fn serves(&self, target: &Target) -> bool {
        self.scheme == target.scheme() && self.port == target.port() && self.host == target.host()
    }

    /// Waits until the connection can take another request. Returns `false`
    /// once the peer has closed it.
    pub async fn ready(&mut self) -> bool {
        !self.driver.is_finished() && self.sender.ready().await.is_ok()
    }

    /// Sends a request and waits for the response head.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be written or no response
    /// arrives.
    pub async fn send(
        &mut self,
        request: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, RequestError> {
        self.sender
            .send_request(request)
            .await
            .map_err(|source| RequestError::Transport { source })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
