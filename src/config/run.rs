use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::HeaderValue;
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use url::{Host, Url};

use crate::args::parsers::parse_url_lines;
use crate::args::{HttpMethod, TesterArgs};
use crate::error::{AppError, AppResult, HttpError, ValidationError};
use crate::http::{TlsSettings, build_client_config, find_cipher_suite, load_identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// A validated target URL, pre-split into what the dialer and the request
/// builder need.
#[derive(Debug, Clone)]
pub struct Target {
    url: String,
    scheme: Scheme,
    host: String,
    port: u16,
    authority: String,
    path_and_query: String,
    server_name: Option<ServerName<'static>>,
}

impl Target {
    /// Parses and validates a target URL. Only `http` and `https` are
    /// accepted; a missing port defaults to 80/443.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, uses another scheme, or has
    /// no host.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let url = Url::parse(raw).map_err(|source| ValidationError::InvalidUrl {
            url: raw.to_owned(),
            source,
        })?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(AppError::validation(ValidationError::UnsupportedScheme {
                    url: raw.to_owned(),
                    scheme: other.to_owned(),
                }));
            }
        };
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_owned(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => {
                return Err(AppError::validation(ValidationError::UrlMissingHost {
                    url: raw.to_owned(),
                }));
            }
        };
        let host_str = url.host_str().unwrap_or(host.as_str());
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host_str, port),
            None => host_str.to_owned(),
        };
        let port = url.port().unwrap_or_else(|| scheme.default_port());
        let path_and_query = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_owned(),
        };
        let server_name = match scheme {
            Scheme::Https => ServerName::try_from(host.clone()).ok(),
            Scheme::Http => None,
        };

        Ok(Self {
            url: raw.to_owned(),
            scheme,
            host,
            port,
            authority,
            path_and_query,
            server_name,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host without IPv6 brackets, as handed to the resolver.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` the socket connects to, bracketing IPv6 literals.
    #[must_use]
    pub fn dial_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `host[:port]` exactly as written in the URL; the default Host header.
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    #[must_use]
    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Certificate name derived from the URL host, for https targets.
    #[must_use]
    pub const fn server_name(&self) -> Option<&ServerName<'static>> {
        self.server_name.as_ref()
    }

    /// Name the server certificate is verified against: `override_name`
    /// when given, else the URL host. The dialed address is unaffected.
    #[must_use]
    pub fn verification_name(
        &self,
        override_name: Option<&ServerName<'static>>,
    ) -> Option<ServerName<'static>> {
        override_name.or(self.server_name.as_ref()).cloned()
    }
}

/// When a worker stops issuing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLimit {
    RequestsPerWorker(u64),
    Duration(Duration),
}

impl RunLimit {
    #[must_use]
    pub const fn requests_per_worker(self) -> Option<u64> {
        match self {
            RunLimit::RequestsPerWorker(requests) => Some(requests),
            RunLimit::Duration(_) => None,
        }
    }

    #[must_use]
    pub const fn duration(self) -> Option<Duration> {
        match self {
            RunLimit::RequestsPerWorker(_) => None,
            RunLimit::Duration(duration) => Some(duration),
        }
    }
}

/// Immutable run snapshot built once from the merged arguments and shared by
/// every worker.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub targets: Vec<Target>,
    pub method: HttpMethod,
    pub body: Option<Bytes>,
    pub keep_alive: bool,
    pub auth: Option<HeaderValue>,
    pub host_header: Option<HeaderValue>,
    pub server_name_override: Option<ServerName<'static>>,
    pub tls: Arc<ClientConfig>,
    pub write_timeout: Duration,
    pub read_timeout: Duration,
    pub limit: RunLimit,
    pub clients: usize,
    pub histogram_sigfig: u8,
    pub track_max_latency: bool,
    pub dump: bool,
    pub quiet_errors: bool,
    pub shutdown_grace: Duration,
}

impl RunConfig {
    /// Validates the arguments and loads every file they reference.
    ///
    /// # Errors
    ///
    /// Returns an error for conflicting or missing flags, unreadable URL,
    /// body, certificate or key files, invalid URLs or header values, and
    /// TLS setup failures.
    pub fn from_args(args: &TesterArgs) -> AppResult<Self> {
        let cipher_suite = args
            .cipher
            .as_deref()
            .map(|name| {
                find_cipher_suite(name).ok_or_else(|| {
                    AppError::validation(ValidationError::UnknownCipherSuite {
                        name: name.to_owned(),
                    })
                })
            })
            .transpose()?;
        let limit = validate_args(args)?;

        let targets = load_targets(args)?;
        let server_name_override = args
            .resolve
            .as_deref()
            .map(parse_server_name)
            .transpose()?;
        if server_name_override.is_none()
            && let Some(target) = targets
                .iter()
                .find(|target| target.scheme() == Scheme::Https && target.server_name().is_none())
        {
            return Err(AppError::validation(ValidationError::InvalidServerName {
                value: target.host().to_owned(),
            }));
        }

        let (method, body) = match args.data_file.as_deref() {
            Some(path) => {
                let data = std::fs::read(path).map_err(|source| HttpError::ReadBodyFile {
                    path: path.into(),
                    source,
                })?;
                (HttpMethod::Post, Some(Bytes::from(data)))
            }
            None => (HttpMethod::Get, None),
        };

        let auth = args
            .auth
            .as_deref()
            .map(|value| header_value("Authorization", value))
            .transpose()?;
        let host_header = args
            .host_header
            .as_deref()
            .map(|value| header_value("Host", value))
            .transpose()?;

        let identity = match (args.cert.as_deref(), args.key.as_deref()) {
            (Some(cert), Some(key)) => Some(load_identity(Path::new(cert), Path::new(key))?),
            (Some(_), None) | (None, Some(_) | None) => None,
        };
        let tls = build_client_config(TlsSettings {
            identity,
            insecure: args.insecure,
            cipher_suite,
        })?;

        Ok(Self {
            targets,
            method,
            body,
            keep_alive: args.keep_alive,
            auth,
            host_header,
            server_name_override,
            tls,
            write_timeout: Duration::from_millis(args.write_timeout_ms.get()),
            read_timeout: Duration::from_millis(args.read_timeout_ms.get()),
            limit,
            clients: args.clients.get(),
            histogram_sigfig: args.histogram_sigfig,
            track_max_latency: args.track_max_latency,
            dump: args.dump,
            quiet_errors: args.quiet_errors,
            shutdown_grace: Duration::from_millis(args.shutdown_grace_ms),
        })
    }
}

/// Checks flag combinations that do not need any file access, returning the
/// run limit they describe.
///
/// # Errors
///
/// Returns the first conflict found: missing target, `--url` with
/// `--urls-file`, `--urls-file` with `--host`/`--auth`/`--resolve`, missing
/// or doubled limit, or half a cert/key pair.
pub fn validate_args(args: &TesterArgs) -> AppResult<RunLimit> {
    match (args.url.as_ref(), args.urls_file.as_ref()) {
        (None, None) => return Err(AppError::validation(ValidationError::MissingTarget)),
        (Some(_), Some(_)) => return Err(AppError::validation(ValidationError::UrlAndUrlsFile)),
        (Some(_), None) => {}
        (None, Some(_)) => {
            let conflicts = [
                ("host", args.host_header.is_some()),
                ("auth", args.auth.is_some()),
                ("resolve", args.resolve.is_some()),
            ];
            if let Some((flag, _)) = conflicts.iter().find(|(_, set)| *set) {
                return Err(AppError::validation(ValidationError::UrlsFileConflict {
                    flag: *flag,
                }));
            }
        }
    }

    let limit = match (args.requests, args.duration) {
        (None, None) => return Err(AppError::validation(ValidationError::MissingLimit)),
        (Some(_), Some(_)) => {
            return Err(AppError::validation(ValidationError::RequestsAndDuration));
        }
        (Some(requests), None) => RunLimit::RequestsPerWorker(requests.get()),
        (None, Some(seconds)) => RunLimit::Duration(Duration::from_secs(seconds.get())),
    };

    if args.cert.is_some() != args.key.is_some() {
        return Err(AppError::validation(ValidationError::CertKeyPair));
    }

    Ok(limit)
}

fn load_targets(args: &TesterArgs) -> AppResult<Vec<Target>> {
    let raw_urls = match (args.url.as_deref(), args.urls_file.as_deref()) {
        (Some(url), _) => vec![url.to_owned()],
        (None, Some(path)) => {
            let content =
                std::fs::read_to_string(path).map_err(|source| HttpError::ReadUrlFile {
                    path: path.into(),
                    source,
                })?;
            let urls = parse_url_lines(&content);
            if urls.is_empty() {
                return Err(AppError::http(HttpError::UrlFileEmpty { path: path.into() }));
            }
            urls
        }
        (None, None) => return Err(AppError::validation(ValidationError::MissingTarget)),
    };
    raw_urls
        .iter()
        .map(String::as_str)
        .map(Target::parse)
        .collect()
}

fn parse_server_name(value: &str) -> AppResult<ServerName<'static>> {
    ServerName::try_from(value.trim().to_owned()).map_err(|_err| {
        AppError::validation(ValidationError::InvalidServerName {
            value: value.to_owned(),
        })
    })
}

fn header_value(header: &'static str, value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|source| AppError::validation(ValidationError::InvalidHeaderValue { header, source }))
}
