use clap::Parser;

use super::parsers::{parse_positive_u64, parse_positive_usize, parse_sigfig};
use super::types::{PositiveU64, PositiveUsize};

const DEFAULT_CLIENTS: &str = "100";
const DEFAULT_TIMEOUT_MS: &str = "5000";
const DEFAULT_HISTOGRAM_SIGFIG: &str = "5";
const DEFAULT_SHUTDOWN_GRACE_MS: &str = "1000";

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent HTTP load generator: drive N clients against one or more URLs for a fixed request count or a fixed duration, then report throughput and latency distribution."
)]
pub struct TesterArgs {
    /// Target URL (incompatible with --urls-file)
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// File with one target URL per line
    #[arg(long = "urls-file", short = 'f')]
    pub urls_file: Option<String>,

    /// Number of concurrent clients
    #[arg(
        long = "clients",
        short = 'c',
        alias = "concurrency",
        default_value = DEFAULT_CLIENTS,
        value_parser = parse_positive_usize
    )]
    pub clients: PositiveUsize,

    /// Number of requests per client (incompatible with --duration)
    #[arg(long = "requests", short = 'r', value_parser = parse_positive_u64)]
    pub requests: Option<PositiveU64>,

    /// Run for this many seconds (incompatible with --requests)
    #[arg(long = "duration", short = 't', value_parser = parse_positive_u64)]
    pub duration: Option<PositiveU64>,

    /// Reuse connections between requests of the same client
    #[arg(long = "keep-alive", short = 'k')]
    pub keep_alive: bool,

    /// Skip TLS certificate verification
    #[arg(long = "insecure", short = 's')]
    pub insecure: bool,

    /// PEM client certificate for mutual TLS (requires --key)
    #[arg(long = "cert", short = 'x')]
    pub cert: Option<String>,

    /// PEM private key for the client certificate (requires --cert)
    #[arg(long = "key", short = 'y')]
    pub key: Option<String>,

    /// Print every new maximum latency as it is observed
    #[arg(long = "track-max-latency", short = 'm')]
    pub track_max_latency: bool,

    /// POST the contents of this file with every request
    #[arg(long = "data-file", short = 'd')]
    pub data_file: Option<String>,

    /// Write timeout in milliseconds (dial, TLS handshake, HTTP handshake)
    #[arg(
        long = "write-timeout",
        alias = "tw",
        default_value = DEFAULT_TIMEOUT_MS,
        value_parser = parse_positive_u64
    )]
    pub write_timeout_ms: PositiveU64,

    /// Read timeout in milliseconds (request send, response head and body)
    #[arg(
        long = "read-timeout",
        alias = "tr",
        default_value = DEFAULT_TIMEOUT_MS,
        value_parser = parse_positive_u64
    )]
    pub read_timeout_ms: PositiveU64,

    /// Authorization header value (incompatible with --urls-file)
    #[arg(long = "auth")]
    pub auth: Option<String>,

    /// Host header to send, independent of the URL (incompatible with --urls-file)
    #[arg(long = "host")]
    pub host_header: Option<String>,

    /// Name to validate the server certificate against instead of the URL host (incompatible with --urls-file)
    #[arg(long = "resolve")]
    pub resolve: Option<String>,

    /// Print the first few response bodies
    #[arg(long = "dump")]
    pub dump: bool,

    /// Restrict TLS to a single cipher suite (e.g. TLS_AES_128_GCM_SHA256)
    #[arg(long = "cipher")]
    pub cipher: Option<String>,

    /// Path to a TOML or JSON config file (defaults to ./hitload.toml or ./hitload.json)
    #[arg(long = "config")]
    pub config: Option<String>,

    /// Runtime worker threads (defaults to all available cores)
    #[arg(long = "threads", env = "HITLOAD_THREADS", value_parser = parse_positive_usize)]
    pub threads: Option<PositiveUsize>,

    /// Latency histogram precision in significant figures (1-5)
    #[arg(
        long = "histogram-sigfig",
        default_value = DEFAULT_HISTOGRAM_SIGFIG,
        value_parser = parse_sigfig
    )]
    pub histogram_sigfig: u8,

    /// How long to wait for in-flight requests to wind down after a stop (ms)
    #[arg(long = "shutdown-grace", default_value = DEFAULT_SHUTDOWN_GRACE_MS)]
    pub shutdown_grace_ms: u64,

    /// Log per-request network errors at debug level instead of warn
    #[arg(long = "quiet-errors")]
    pub quiet_errors: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("hitload/", env!("CARGO_PKG_VERSION"));
