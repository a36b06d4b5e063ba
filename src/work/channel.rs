use tokio::sync::mpsc;

use crate::metrics::RequestResult;

/// Hard ceiling on buffered results, whatever the concurrency.
pub const MAX_RESULT_BUFFER: usize = 1_000_000;
/// Buffered results allowed per worker before senders start waiting.
pub const RESULTS_PER_WORKER: usize = 1000;

pub type ResultSender = mpsc::Sender<RequestResult>;
pub type ResultReceiver = mpsc::Receiver<RequestResult>;

#[must_use]
pub fn result_capacity(concurrency: usize) -> usize {
    concurrency
        .saturating_mul(RESULTS_PER_WORKER)
        .clamp(1, MAX_RESULT_BUFFER)
}

/// Creates the bounded hand-off between executors and the reporter.
#[must_use]
pub fn result_channel(concurrency: usize) -> (ResultSender, ResultReceiver) {
    mpsc::channel(result_capacity(concurrency))
}
