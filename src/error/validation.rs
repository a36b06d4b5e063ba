use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid header name '{name}'.")]
    InvalidHeaderName { name: String },
    #[error("Invalid value for header '{name}'.")]
    InvalidHeaderValue { name: String },
    #[error("Invalid basic auth '{value}'. Expected 'user:pass'.")]
    InvalidBasicAuth { value: String },
    #[error("Invalid HTTP method '{value}'.")]
    InvalidMethod { value: String },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}'. Use http or https.")]
    UnsupportedScheme { scheme: String },
    #[error("Invalid proxy '{url}': {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported proxy scheme '{scheme}'. Use http, https or socks5.")]
    UnsupportedProxyScheme { scheme: String },
    #[error("Concurrency must be >= 1.")]
    ZeroConcurrency,
    #[error("Rate limit must be a finite, non-negative number (got {value}).")]
    InvalidQps { value: f64 },
    #[error("Number of requests ({requests}) cannot be smaller than the concurrency level ({concurrency}).")]
    RequestsBelowConcurrency { requests: usize, concurrency: usize },
    #[error("Cannot combine a request body (-d) with a body file (-D).")]
    BodyConflict,
    #[error("Failed to read body file '{path}': {source}")]
    ReadBodyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Missing URL (pass it as an argument or set it in the config).")]
    MissingUrl,
}
