use bytes::Bytes;
use http::header::{AUTHORIZATION, CONNECTION, HOST, USER_AGENT};
use http::{HeaderValue, Request, Uri};
use http_body_util::Full;

use crate::args::DEFAULT_USER_AGENT;
use crate::config::{RunConfig, Target};
use crate::error::{AppResult, HttpError};

/// Pre-built request head for one target. Every request a worker sends is a
/// clone of it plus the shared body.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    parts: http::request::Parts,
    body: Bytes,
}

impl RequestTemplate {
    /// # Errors
    ///
    /// Returns an error if the target's path or authority is not a valid
    /// request URI or header value.
    pub fn new(config: &RunConfig, target: &Target) -> AppResult<Self> {
        let build_error = |source: http::Error| HttpError::BuildRequest {
            url: target.url().to_owned(),
            source,
        };
        let host = match config.host_header.clone() {
            Some(host) => host,
            None => HeaderValue::from_str(target.authority())
                .map_err(|err| build_error(err.into()))?,
        };
        let connection = if config.keep_alive {
            HeaderValue::from_static("keep-alive")
        } else {
            HeaderValue::from_static("close")
        };
        let uri = Uri::try_from(target.path_and_query()).map_err(|err| build_error(err.into()))?;

        let mut builder = Request::builder()
            .method(http::Method::from(config.method))
            .uri(uri)
            .header(HOST, host)
            .header(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT))
            .header(CONNECTION, connection);
        if let Some(auth) = config.auth.clone() {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let (parts, ()) = builder.body(()).map_err(build_error)?.into_parts();

        Ok(Self {
            parts,
            body: config.body.clone().unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn build(&self) -> Request<Full<Bytes>> {
        Request::from_parts(self.parts.clone(), Full::new(self.body.clone()))
    }
}

/// One template per configured target, in target order.
///
/// # Errors
///
/// Returns an error if any target cannot be turned into a request.
pub fn build_templates(config: &RunConfig) -> AppResult<Vec<RequestTemplate>> {
    config
        .targets
        .iter()
        .map(|target| RequestTemplate::new(config, target))
        .collect()
}
