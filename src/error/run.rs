use thiserror::Error;

use crate::work::RunState;

/// Lifecycle contract breaches. These never describe a request outcome; a
/// failed request is recorded in its `RequestResult` instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Run was already started (state: {state}).")]
    AlreadyStarted { state: RunState },
    #[error("Stop requires an active run (state: {state}).")]
    NoActiveRun { state: RunState },
    #[error("Stop was already raised for this run.")]
    StopAlreadyRaised,
    #[error("Finish called before all workers terminated (state: {state}).")]
    WorkersStillRunning { state: RunState },
    #[error("Result channel was already closed.")]
    ChannelAlreadyClosed,
    #[error("Result receiver was already handed to a reporter.")]
    ReceiverTaken,
    #[error("Reporter task failed: {source}")]
    ReporterFailed {
        #[source]
        source: tokio::task::JoinError,
    },
}
