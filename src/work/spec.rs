use std::time::Duration;

use bytes::Bytes;
use reqwest::Url;

use crate::error::ValidationError;
use crate::http::RequestTemplate;
use crate::report::OutputFormat;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Everything a run needs. Built once by the caller and never mutated while
/// the run is in progress.
#[derive(Debug, Clone)]
pub struct WorkSpec {
    pub request: RequestTemplate,
    /// Sent with every request when non-empty.
    pub body: Bytes,
    /// Total number of requests (N).
    pub requests: usize,
    /// Number of concurrent workers (C). Must be at least 1.
    pub concurrency: usize,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Aggregate queries per second; `None` or `0` means unlimited.
    pub qps: Option<f64>,
    /// Prefer HTTP/2 negotiation instead of pinning HTTP/1.1.
    pub h2: bool,
    pub disable_compression: bool,
    pub disable_keepalive: bool,
    pub disable_redirects: bool,
    /// Skip TLS certificate and hostname verification.
    pub insecure: bool,
    /// Format hint for the reporter.
    pub output: OutputFormat,
    pub proxy: Option<Url>,
}

impl WorkSpec {
    #[must_use]
    pub fn new(request: RequestTemplate, requests: usize, concurrency: usize) -> Self {
        Self {
            request,
            body: Bytes::new(),
            requests,
            concurrency,
            timeout: Some(DEFAULT_TIMEOUT),
            qps: None,
            h2: false,
            disable_compression: false,
            disable_keepalive: false,
            disable_redirects: false,
            insecure: false,
            output: OutputFormat::Text,
            proxy: None,
        }
    }

    /// Checks the invariants a run relies on.
    ///
    /// # Errors
    ///
    /// Returns an error when concurrency is zero, the rate limit is negative
    /// or not finite, or the proxy scheme is unsupported.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if let Some(qps) = self.qps
            && (!qps.is_finite() || qps < 0.0)
        {
            return Err(ValidationError::InvalidQps { value: qps });
        }
        if let Some(proxy) = self.proxy.as_ref() {
            match proxy.scheme() {
                "http" | "https" | "socks5" | "socks5h" => {}
                other => {
                    return Err(ValidationError::UnsupportedProxyScheme {
                        scheme: other.to_owned(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Iterations assigned to each worker. The remainder of `N / C` is
    /// dropped, so a run issues at most `C * (N / C)` requests.
    #[must_use]
    pub fn requests_per_worker(&self) -> usize {
        self.requests.checked_div(self.concurrency).unwrap_or(0)
    }

    /// Number of results an uninterrupted run produces.
    #[must_use]
    pub fn expected_results(&self) -> usize {
        self.requests_per_worker().saturating_mul(self.concurrency)
    }

    /// The configured pacing rate, if any.
    #[must_use]
    pub fn rate_limit(&self) -> Option<f64> {
        self.qps.filter(|qps| *qps > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn spec(requests: usize, concurrency: usize) -> Result<WorkSpec, String> {
        let template = RequestTemplate::new(Method::GET, "http://localhost/")
            .map_err(|err| err.to_string())?;
        Ok(WorkSpec::new(template, requests, concurrency))
    }

    #[test]
    fn expected_results_truncates_remainder() -> Result<(), String> {
        let cases = [(10, 3, 9), (100, 10, 100), (7, 7, 7), (5, 8, 0), (0, 4, 0)];
        for (requests, concurrency, expected) in cases {
            let work = spec(requests, concurrency)?;
            if work.expected_results() != expected {
                return Err(format!(
                    "N={} C={}: expected {}, got {}",
                    requests,
                    concurrency,
                    expected,
                    work.expected_results()
                ));
            }
        }
        Ok(())
    }

    #[test]
    fn validate_rejects_zero_concurrency() -> Result<(), String> {
        let work = spec(10, 0)?;
        match work.validate() {
            Err(ValidationError::ZeroConcurrency) => Ok(()),
            other => Err(format!("Expected ZeroConcurrency, got {:?}", other)),
        }
    }

    #[test]
    fn validate_rejects_negative_qps() -> Result<(), String> {
        let mut work = spec(10, 1)?;
        work.qps = Some(-1.0);
        if work.validate().is_ok() {
            return Err("Expected negative qps to be rejected".to_owned());
        }
        work.qps = Some(f64::NAN);
        if work.validate().is_ok() {
            return Err("Expected NaN qps to be rejected".to_owned());
        }
        Ok(())
    }

    #[test]
    fn zero_qps_means_unlimited() -> Result<(), String> {
        let mut work = spec(10, 1)?;
        work.qps = Some(0.0);
        if work.rate_limit().is_some() {
            return Err("Expected qps=0 to disable pacing".to_owned());
        }
        Ok(())
    }

    #[test]
    fn validate_rejects_ftp_proxy() -> Result<(), String> {
        let mut work = spec(10, 1)?;
        work.proxy = Some(Url::parse("ftp://proxy:21").map_err(|err| err.to_string())?);
        if work.validate().is_ok() {
            return Err("Expected ftp proxy to be rejected".to_owned());
        }
        Ok(())
    }
}
