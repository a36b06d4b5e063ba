use std::sync::Arc;

use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::http::{Pacer, clone_request, execute_and_send};

use super::{ResultSender, StopSignal, WorkSpec};

pub(crate) struct PoolContext {
    pub client: Client,
    pub spec: Arc<WorkSpec>,
    pub stop: Arc<StopSignal>,
    pub results: ResultSender,
    pub pacer: Option<Arc<Pacer>>,
    pub run_start: Instant,
}

struct WorkerContext {
    id: usize,
    client: Client,
    spec: Arc<WorkSpec>,
    stop: Arc<StopSignal>,
    results: ResultSender,
    pacer: Option<Arc<Pacer>>,
    run_start: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    Exhausted,
    Stopped,
    ChannelClosed,
}

#[derive(Debug, Clone, Copy)]
struct WorkerExit {
    reason: ExitReason,
    issued: usize,
}

/// Totals observed at the join barrier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolOutcome {
    pub issued: usize,
    pub stopped_workers: usize,
    pub failed_workers: usize,
}

/// Runs `C` workers of `N / C` iterations each and returns once every one
/// of them has exited.
pub(crate) async fn run_workers(ctx: PoolContext) -> PoolOutcome {
    let PoolContext {
        client,
        spec,
        stop,
        results,
        pacer,
        run_start,
    } = ctx;
    let iterations = spec.requests_per_worker();
    let mut handles = Vec::with_capacity(spec.concurrency);

    for id in 0..spec.concurrency {
        let worker = WorkerContext {
            id,
            client: client.clone(),
            spec: Arc::clone(&spec),
            stop: Arc::clone(&stop),
            results: results.clone(),
            pacer: pacer.clone(),
            run_start,
        };
        handles.push(tokio::spawn(run_worker(worker, iterations)));
    }
    drop(results);

    let mut outcome = PoolOutcome::default();
    for handle in handles {
        match handle.await {
            Ok(exit) => {
                outcome.issued = outcome.issued.saturating_add(exit.issued);
                if exit.reason == ExitReason::Stopped {
                    outcome.stopped_workers = outcome.stopped_workers.saturating_add(1);
                }
            }
            Err(err) => {
                error!("Worker task failed: {}", err);
                outcome.failed_workers = outcome.failed_workers.saturating_add(1);
            }
        }
    }
    outcome
}

async fn run_worker(worker: WorkerContext, iterations: usize) -> WorkerExit {
    let mut issued: usize = 0;
    for _ in 0..iterations {
        if worker.stop.try_consume() {
            debug!(worker = worker.id, issued, "Worker stopped");
            return WorkerExit {
                reason: ExitReason::Stopped,
                issued,
            };
        }
        if let Some(pacer) = worker.pacer.as_deref() {
            pacer.wait().await;
        }

        let request = clone_request(&worker.spec.request, &worker.spec.body);
        if !execute_and_send(&worker.client, request, worker.run_start, &worker.results).await {
            return WorkerExit {
                reason: ExitReason::ChannelClosed,
                issued,
            };
        }
        issued = issued.saturating_add(1);
    }
    debug!(worker = worker.id, issued, "Worker finished");
    WorkerExit {
        reason: ExitReason::Exhausted,
        issued,
    }
}
