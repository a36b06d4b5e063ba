use serde::Deserialize;

use crate::report::OutputFormat;

/// Values accepted in `volley.toml` / `volley.json`. Every key is optional
/// and mirrors the long name of a CLI flag.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<Vec<String>>,
    pub requests: Option<usize>,
    pub concurrency: Option<usize>,
    #[serde(alias = "rate")]
    pub qps: Option<f64>,
    /// Seconds; `0` disables the timeout.
    pub timeout: Option<u64>,
    pub data: Option<String>,
    pub data_file: Option<String>,
    pub content_type: Option<String>,
    pub basic_auth: Option<String>,
    pub proxy: Option<String>,
    pub host: Option<String>,
    pub user_agent: Option<String>,
    pub h2: Option<bool>,
    pub disable_compression: Option<bool>,
    pub disable_keepalive: Option<bool>,
    pub disable_redirects: Option<bool>,
    pub insecure: Option<bool>,
    pub output: Option<OutputFormat>,
}
