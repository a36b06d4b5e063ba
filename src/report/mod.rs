//! Interface to the reporting stage and the default summary reporter.
mod histogram;
mod summary;


use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::{ReportError, RunError};
use crate::metrics::RequestResult;
use crate::work::ResultReceiver;

pub use histogram::LatencyHistogram;
pub use summary::{LatencyPercentile, Summary, SummaryReporter};

#[derive(Debug, Clone, Copy, Default, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// What a reporter receives when a run starts.
pub struct ReportContext {
    pub writer: Box<dyn Write + Send>,
    pub output: OutputFormat,
    /// Requested total (N). The run may produce fewer results.
    pub expected_total: usize,
}

/// Consumer of the result stream.
#[async_trait]
pub trait Reporter: Send + 'static {
    fn record(&mut self, result: RequestResult);

    /// Consumes results until every sender is gone and the buffer is empty.
    async fn drain(&mut self, results: &mut ResultReceiver) {
        while let Some(result) = results.recv().await {
            self.record(result);
        }
    }

    /// Called once, after draining, with the run's wall-clock duration.
    ///
    /// # Errors
    ///
    /// Returns an error when the report cannot be rendered or written.
    fn finalize(&mut self, total: Duration) -> Result<(), ReportError>;
}

/// A reporter draining on its own task. Awaiting [`ReporterHandle::wait`]
/// is the completion signal and can only happen once.
pub struct ReporterHandle<R> {
    task: JoinHandle<R>,
}

impl<R> ReporterHandle<R>
where
    R: Reporter,
{
    #[must_use]
    pub fn spawn(mut reporter: R, mut results: ResultReceiver) -> Self {
        let task = tokio::spawn(async move {
            reporter.drain(&mut results).await;
            reporter
        });
        Self { task }
    }

    /// Waits until the reporter has drained the closed channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the reporter task panicked or was cancelled.
    pub async fn wait(self) -> Result<R, RunError> {
        self.task
            .await
            .map_err(|source| RunError::ReporterFailed { source })
    }
}
