use futures_util::StreamExt;
use reqwest::{Client, Request};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::metrics::{Phases, RequestFailure, RequestResult};
use crate::work::ResultSender;

/// Issues one request and measures it until the body is fully drained.
///
/// Never fails: transport errors are captured in the returned result.
pub async fn execute(client: &Client, request: Request, run_start: Instant) -> RequestResult {
    let start = Instant::now();
    let offset = start.saturating_duration_since(run_start);

    match client.execute(request).await {
        Ok(response) => {
            let wait = start.elapsed();
            let status = response.status().as_u16();
            let content_length = response.content_length();
            let (body_bytes, body_error) = drain_response_body(response).await;
            let duration = start.elapsed();
            let error = body_error.map(|err| {
                debug!("Failed to read response body: {}", err);
                RequestFailure::from_reqwest(&err)
            });
            RequestResult {
                error,
                status_code: Some(status),
                duration,
                content_length,
                body_bytes,
                offset,
                phases: Some(Phases {
                    wait,
                    read: duration.saturating_sub(wait),
                }),
            }
        }
        Err(err) => {
            let duration = start.elapsed();
            debug!("Request failed: {}", err);
            RequestResult {
                error: Some(RequestFailure::from_reqwest(&err)),
                status_code: None,
                duration,
                content_length: None,
                body_bytes: 0,
                offset,
                phases: None,
            }
        }
    }
}

/// Runs [`execute`] and hands the result to the reporter.
///
/// The send waits while the channel is full, which throttles the caller to
/// the reporter's pace. Returns `false` when the receiving side is gone.
pub async fn execute_and_send(
    client: &Client,
    request: Request,
    run_start: Instant,
    results: &ResultSender,
) -> bool {
    let result = execute(client, request, run_start).await;
    if results.send(result).await.is_err() {
        error!("Result channel closed while workers were still running.");
        return false;
    }
    true
}

/// Reads the body to the end so the connection returns to the pool. Returns
/// the bytes read and the error that stopped the read, if any.
async fn drain_response_body(response: reqwest::Response) -> (u64, Option<reqwest::Error>) {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                total_bytes =
                    total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
            }
            Err(err) => return (total_bytes, Some(err)),
        }
    }
    (total_bytes, None)
}
