//! Run lifecycle: shared setup, the worker pool, cancellation and hand-off to
//! the reporter.
mod channel;
mod pool;
mod spec;
mod state;
mod stop;


use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, RunError};
use crate::http::{Pacer, build_client};
use crate::report::{ReportContext, Reporter, ReporterHandle, SummaryReporter};

pub use channel::{
    MAX_RESULT_BUFFER, RESULTS_PER_WORKER, ResultReceiver, ResultSender, result_capacity,
    result_channel,
};
pub use spec::{DEFAULT_TIMEOUT, WorkSpec};
pub use state::RunState;
pub use stop::StopSignal;

use pool::{PoolContext, run_workers};
use state::StateCell;

/// Structures created once per run by [`Work::init`].
struct Shared {
    /// The original sender. Dropping it, after every worker clone is gone,
    /// closes the channel.
    results_tx: Mutex<Option<ResultSender>>,
    results_rx: Mutex<Option<ResultReceiver>>,
    stop: Arc<StopSignal>,
}

/// One load-generation run against a single request template.
///
/// `run` borrows the coordinator immutably, so another task holding the same
/// `Arc<Work>` can call [`Work::stop`] while it is in progress.
pub struct Work {
    spec: Arc<WorkSpec>,
    client: Client,
    shared: OnceCell<Shared>,
    state: StateCell,
    writer: Mutex<Option<Box<dyn Write + Send>>>,
}

impl Work {
    /// Validates `spec` and builds the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when `spec` is invalid or the client cannot be
    /// built.
    pub fn new(spec: WorkSpec) -> AppResult<Self> {
        spec.validate().map_err(AppError::validation)?;
        let client = build_client(&spec).map_err(AppError::http)?;
        Ok(Self {
            spec: Arc::new(spec),
            client,
            shared: OnceCell::new(),
            state: StateCell::new(),
            writer: Mutex::new(None),
        })
    }

    /// Sets the reporter's output sink. Defaults to standard output.
    #[must_use]
    pub fn with_writer<W>(self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        *self.writer.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(writer));
        self
    }

    #[must_use]
    pub fn spec(&self) -> &WorkSpec {
        &self.spec
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state.load()
    }

    /// Creates the result channel and stop signal. Safe to call any number of
    /// times, from any number of threads; setup happens exactly once.
    pub fn init(&self) {
        self.shared();
    }

    fn shared(&self) -> &Shared {
        self.shared.get_or_init(|| {
            let (results_tx, results_rx) = result_channel(self.spec.concurrency);
            if let Err(state) = self
                .state
                .transition(RunState::Uninitialized, RunState::Initialized)
            {
                warn!("Initializing run from unexpected state {}", state);
            }
            debug!(
                capacity = result_capacity(self.spec.concurrency),
                workers = self.spec.concurrency,
                "Run initialized"
            );
            Shared {
                results_tx: Mutex::new(Some(results_tx)),
                results_rx: Mutex::new(Some(results_rx)),
                stop: Arc::new(StopSignal::new(self.spec.concurrency)),
            }
        })
    }

    /// Runs to completion with the default [`SummaryReporter`].
    ///
    /// # Errors
    ///
    /// Returns an error when the run was already started or the report
    /// cannot be written. Failed requests are never an error here.
    pub async fn run(&self) -> AppResult<SummaryReporter> {
        self.run_with(SummaryReporter::new).await
    }

    /// Issues every request, blocking until the workers have joined and the
    /// reporter has drained and finalized.
    ///
    /// # Errors
    ///
    /// Returns an error when the run was already started, the reporter task
    /// panicked, or finalization failed.
    pub async fn run_with<R, F>(&self, make_reporter: F) -> AppResult<R>
    where
        R: Reporter,
        F: FnOnce(ReportContext) -> R,
    {
        let shared = self.shared();
        self.state
            .transition(RunState::Initialized, RunState::Running)
            .map_err(|state| AppError::run(RunError::AlreadyStarted { state }))?;
        let started = Instant::now();

        let results_rx = shared
            .results_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| AppError::run(RunError::ReceiverTaken))?;
        let results_tx = shared
            .results_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| AppError::run(RunError::ChannelAlreadyClosed))?;

        let writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| Box::new(std::io::stdout()));
        let context = ReportContext {
            writer,
            output: self.spec.output,
            expected_total: self.spec.requests,
        };
        let reporting = ReporterHandle::spawn(make_reporter(context), results_rx);

        info!(
            requests = self.spec.expected_results(),
            concurrency = self.spec.concurrency,
            url = %self.spec.request.url(),
            "Starting run"
        );
        let pacer = self.spec.rate_limit().map(|qps| Arc::new(Pacer::start(qps)));
        let outcome = run_workers(PoolContext {
            client: self.client.clone(),
            spec: Arc::clone(&self.spec),
            stop: Arc::clone(&shared.stop),
            results: results_tx,
            pacer,
            run_start: started,
        })
        .await;
        debug!(
            issued = outcome.issued,
            stopped = outcome.stopped_workers,
            failed = outcome.failed_workers,
            "Workers joined"
        );

        if let Err(state) = self.state.transition(RunState::Running, RunState::Joined) {
            warn!("Run left the running state early ({})", state);
        }
        self.finish(started, reporting).await
    }

    /// Asks every worker to exit before its next request. Requests already
    /// in flight complete normally.
    ///
    /// # Errors
    ///
    /// Returns an error when no run is active or stop was already raised for
    /// this run. Once the workers have joined this is a no-op.
    pub fn stop(&self) -> Result<(), RunError> {
        match self.state.load() {
            RunState::Running => {
                let shared = self.shared();
                shared.stop.raise()?;
                info!(workers = self.spec.concurrency, "Stopping run");
                Ok(())
            }
            RunState::Joined => {
                debug!("Stop requested after workers joined; ignoring");
                Ok(())
            }
            state @ (RunState::Uninitialized | RunState::Initialized | RunState::Finished) => {
                Err(RunError::NoActiveRun { state })
            }
        }
    }

    /// Closes the result channel, waits for the reporter to drain it and
    /// finalizes the report with the total wall-clock duration.
    async fn finish<R>(&self, started: Instant, reporting: ReporterHandle<R>) -> AppResult<R>
    where
        R: Reporter,
    {
        let state = self.state.load();
        if state != RunState::Joined {
            return Err(AppError::run(RunError::WorkersStillRunning { state }));
        }
        self.close_results()?;
        let total = started.elapsed();

        let waited = reporting.wait().await;
        if let Err(state) = self.state.transition(RunState::Joined, RunState::Finished) {
            warn!("Finishing run from unexpected state {}", state);
        }
        let mut reporter = waited.map_err(AppError::run)?;
        reporter.finalize(total).map_err(AppError::report)?;
        info!(elapsed_ms = total.as_millis(), "Run finished");
        Ok(reporter)
    }

    fn close_results(&self) -> Result<(), RunError> {
        let sender = self
            .shared()
            .results_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(RunError::ChannelAlreadyClosed)?;
        drop(sender);
        Ok(())
    }
}
