use clap::Parser;

use crate::http::parse_header;
use crate::report::OutputFormat;

use super::parsers::parse_rate;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent HTTP load generator: sends a fixed number of requests from a pool of workers and prints a latency summary."
)]
pub struct TesterArgs {
    /// Target URL
    pub url: Option<String>,

    /// Number of requests to run
    #[arg(short = 'n', long = "requests", default_value_t = 200)]
    pub requests: usize,

    /// Number of workers to run concurrently. Requests must not be smaller than this
    #[arg(short = 'c', long = "concurrency", default_value_t = 50)]
    pub concurrency: usize,

    /// Rate limit in queries per second shared by all workers (0 = unlimited)
    #[arg(short = 'q', long = "qps", default_value = "0", value_parser = parse_rate)]
    pub qps: f64,

    /// Timeout for each request in seconds (0 = no timeout)
    #[arg(short = 't', long = "timeout", default_value_t = 20)]
    pub timeout: u64,

    /// HTTP method
    #[arg(short = 'm', long = "method", default_value = "GET")]
    pub method: String,

    /// Custom HTTP header in 'Key: Value' format (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// HTTP request body
    #[arg(short = 'd', long = "data")]
    pub data: Option<String>,

    /// HTTP request body read from file
    #[arg(short = 'D', long = "data-file")]
    pub data_file: Option<String>,

    /// Content-Type header
    #[arg(short = 'T', long = "content-type")]
    pub content_type: Option<String>,

    /// Basic authentication as 'user:pass'
    #[arg(short = 'a', long = "basic-auth")]
    pub basic_auth: Option<String>,

    /// Proxy address (http, https or socks5)
    #[arg(short = 'x', long = "proxy")]
    pub proxy: Option<String>,

    /// Host header override
    #[arg(long = "host")]
    pub host: Option<String>,

    /// User-Agent header. Defaults to volley/<version>
    #[arg(short = 'U', long = "user-agent")]
    pub user_agent: Option<String>,

    /// Allow HTTP/2 negotiation
    #[arg(long = "h2")]
    pub h2: bool,

    /// Disable transparent response decompression
    #[arg(long = "disable-compression")]
    pub disable_compression: bool,

    /// Open a new connection for every request
    #[arg(long = "disable-keepalive")]
    pub disable_keepalive: bool,

    /// Do not follow HTTP redirects
    #[arg(long = "disable-redirects")]
    pub disable_redirects: bool,

    /// Skip TLS certificate verification
    #[arg(long = "insecure")]
    pub insecure: bool,

    /// Report format
    #[arg(short = 'o', long = "output", value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Path to config file (TOML/JSON). Defaults to ./volley.toml or ./volley.json if present.
    #[arg(long = "config", env = "VOLLEY_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by VOLLEY_LOG/RUST_LOG)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
