use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Finest tick the pacing task runs at; faster rates release several permits
/// per tick instead.
const MIN_TICK: Duration = Duration::from_millis(1);
/// Rates slower than one request a day are paced at one a day.
const MAX_TICK: Duration = Duration::from_secs(86_400);
/// Most permits released in one tick. Far above anything a pool of workers
/// can consume, and far below `Semaphore::MAX_PERMITS`.
const MAX_PER_TICK: f64 = 1_000_000.0;

/// Splits a rate into a tick period and a (possibly fractional) number of
/// permits released per tick.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TickPlan {
    pub period: Duration,
    pub per_tick: f64,
}

impl TickPlan {
    pub(crate) fn for_rate(qps: f64) -> Self {
        let period = Duration::try_from_secs_f64(1.0 / qps)
            .unwrap_or(MAX_TICK)
            .min(MAX_TICK);
        if period >= MIN_TICK {
            return Self {
                period,
                per_tick: 1.0,
            };
        }
        Self {
            period: MIN_TICK,
            per_tick: (qps * MIN_TICK.as_secs_f64()).min(MAX_PER_TICK),
        }
    }

    /// Permits never pile up beyond one tick's worth, so a stalled worker
    /// cannot bank a burst.
    pub(crate) fn capacity(self) -> usize {
        (self.per_tick.ceil() as usize).clamp(1, Semaphore::MAX_PERMITS)
    }
}

/// Turns a fractional per-tick rate into whole permits without losing the
/// fractional part across ticks.
#[derive(Debug)]
pub(crate) struct TokenCarry {
    per_tick: f64,
    fractional: f64,
}

impl TokenCarry {
    pub(crate) const fn new(per_tick: f64) -> Self {
        Self {
            per_tick,
            fractional: 0.0,
        }
    }

    pub(crate) fn next_tokens(&mut self) -> usize {
        let total = self.per_tick + self.fractional;
        let whole = total.floor();
        self.fractional = total - whole;
        whole as usize
    }
}

/// Shared pacing signal for rate-limited runs.
///
/// One background task releases permits on a fixed tick; every worker takes
/// one permit before each request. Aggregate throughput converges to the
/// configured rate; which worker wins a given permit is up to the scheduler.
#[derive(Debug)]
pub struct Pacer {
    permits: Arc<Semaphore>,
    task: JoinHandle<()>,
}

impl Pacer {
    /// Spawns the pacing task. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn start(qps: f64) -> Self {
        let plan = TickPlan::for_rate(qps);
        let permits = Arc::new(Semaphore::new(0));
        let task = spawn_pacing_task(Arc::clone(&permits), plan);
        Self { permits, task }
    }

    /// Waits for the next pacing permit and consumes it.
    pub async fn wait(&self) {
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

impl Drop for Pacer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn spawn_pacing_task(permits: Arc<Semaphore>, plan: TickPlan) -> JoinHandle<()> {
    tokio::spawn(async move {
        let capacity = plan.capacity();
        let mut carry = TokenCarry::new(plan.per_tick);
        let mut tick = interval(plan.period);
        loop {
            tick.tick().await;
            let tokens = carry.next_tokens();
            let room = capacity.saturating_sub(permits.available_permits());
            let release = tokens.min(room);
            if release > 0 {
                permits.add_permits(release);
            }
        }
    })
}
