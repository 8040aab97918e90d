use serde::Deserialize;

/// On-disk configuration. Every key mirrors a long CLI flag; values given on
/// the command line take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub urls_file: Option<String>,
    #[serde(alias = "concurrency")]
    pub clients: Option<usize>,
    pub requests: Option<u64>,
    pub duration: Option<u64>,
    pub keep_alive: Option<bool>,
    pub insecure: Option<bool>,
    pub cert: Option<String>,
    pub key: Option<String>,
    pub track_max_latency: Option<bool>,
    pub data_file: Option<String>,
    pub write_timeout: Option<u64>,
    pub read_timeout: Option<u64>,
    pub auth: Option<String>,
    pub host: Option<String>,
    pub resolve: Option<String>,
    pub dump: Option<bool>,
    pub cipher: Option<String>,
    pub histogram_sigfig: Option<u8>,
    pub shutdown_grace: Option<u64>,
    pub quiet_errors: Option<bool>,
}
