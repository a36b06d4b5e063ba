use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;

use crate::error::RunError;

/// Cooperative cancellation for a pool of workers.
///
/// Raising the signal releases one token per worker. A worker checks for a
/// token between requests, consumes at most one and exits; a request already
/// in flight always runs to completion.
#[derive(Debug)]
pub struct StopSignal {
    tokens: Semaphore,
    workers: usize,
    raised: AtomicBool,
}

impl StopSignal {
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            tokens: Semaphore::new(0),
            workers,
            raised: AtomicBool::new(false),
        }
    }

    /// Releases one token per worker. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::StopAlreadyRaised`] on any call after the first.
    pub fn raise(&self) -> Result<(), RunError> {
        if self.raised.swap(true, Ordering::AcqRel) {
            return Err(RunError::StopAlreadyRaised);
        }
        self.tokens.add_permits(self.workers);
        Ok(())
    }

    /// Non-blocking check; consumes a token when one is available.
    #[must_use]
    pub fn try_consume(&self) -> bool {
        match self.tokens.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_closed_or_empty) => false,
        }
    }

    /// Tokens raised but not yet consumed by a worker.
    #[must_use]
    pub fn pending_tokens(&self) -> usize {
        self.tokens.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_releases_one_token_per_worker() -> Result<(), String> {
        let stop = StopSignal::new(3);
        if stop.try_consume() {
            return Err("No token expected before raise".to_owned());
        }
        stop.raise().map_err(|err| err.to_string())?;
        let consumed = (0..5).filter(|_| stop.try_consume()).count();
        if consumed != 3 {
            return Err(format!("Expected 3 tokens, consumed {}", consumed));
        }
        Ok(())
    }

    #[test]
    fn second_raise_is_rejected() -> Result<(), String> {
        let stop = StopSignal::new(2);
        stop.raise().map_err(|err| err.to_string())?;
        match stop.raise() {
            Err(RunError::StopAlreadyRaised) => {}
            other => return Err(format!("Expected StopAlreadyRaised, got {:?}", other)),
        }
        if stop.pending_tokens() != 2 {
            return Err(format!(
                "Second raise must not add tokens, pending {}",
                stop.pending_tokens()
            ));
        }
        Ok(())
    }
}
