use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Missing target (set --url or --urls-file).")]
    MissingTarget,
    #[error("Cannot combine --url with --urls-file.")]
    UrlAndUrlsFile,
    #[error("--urls-file cannot be combined with --{flag}.")]
    UrlsFileConflict { flag: &'static str },
    #[error("Requests or duration must be provided.")]
    MissingLimit,
    #[error("Only one should be provided: [requests|duration].")]
    RequestsAndDuration,
    #[error("Both cert and key must be specified if one is.")]
    CertKeyPair,
    #[error("Unknown cipher suite '{name}'.")]
    UnknownCipherSuite { name: String },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unable to decode scheme '{scheme}' in '{url}'. Use http or https.")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("URL '{url}' is missing a host.")]
    UrlMissingHost { url: String },
    #[error("Invalid header value for {header}: {source}")]
    InvalidHeaderValue {
        header: &'static str,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("Invalid resolve override '{value}'.")]
    InvalidServerName { value: String },
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
