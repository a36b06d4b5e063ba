use reqwest::{Client, Proxy, redirect};
use tracing::debug;

use crate::error::HttpError;
use crate::work::WorkSpec;

/// Upper bound on idle pooled connections kept per host.
pub const MAX_IDLE_CONNS_PER_HOST: usize = 500;

/// Builds the one client shared by every worker of a run.
///
/// `reqwest::Client` keeps its pool behind an `Arc`, so clones are cheap and
/// safe to use from many tasks at once.
///
/// # Errors
///
/// Returns an error when the proxy is rejected or the TLS backend cannot be
/// initialized.
pub fn build_client(spec: &WorkSpec) -> Result<Client, HttpError> {
    let idle_per_host = spec.concurrency.min(MAX_IDLE_CONNS_PER_HOST);
    let mut builder = Client::builder().pool_max_idle_per_host(idle_per_host);

    if let Some(timeout) = spec.timeout {
        builder = builder.timeout(timeout);
    }

    if spec.disable_keepalive {
        builder = builder
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Some(std::time::Duration::from_secs(0)));
    }

    if spec.disable_compression {
        builder = builder.no_gzip();
    }

    if spec.disable_redirects {
        builder = builder.redirect(redirect::Policy::none());
    }

    if spec.insecure {
        builder = builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    if let Some(proxy_url) = spec.proxy.as_ref() {
        let proxy = Proxy::all(proxy_url.as_str()).map_err(|source| HttpError::InvalidProxy {
            url: proxy_url.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy);
    }

    if !spec.h2 {
        builder = builder.http1_only();
    }

    debug!(
        idle_per_host,
        h2 = spec.h2,
        keepalive = !spec.disable_keepalive,
        "Building shared HTTP client"
    );
    builder
        .build()
        .map_err(|source| HttpError::BuildClientFailed { source })
}
