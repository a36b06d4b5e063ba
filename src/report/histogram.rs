use std::time::Duration;

use hdrhistogram::Histogram;

use crate::error::ReportError;

/// Latency histogram with microsecond resolution.
#[derive(Debug)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, ReportError> {
        let hist = Histogram::<u64>::new(3).map_err(|source| ReportError::Histogram { source })?;
        Ok(Self { hist })
    }

    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX).max(1);
        self.hist.saturating_record(micros);
    }

    #[must_use]
    pub fn value_at_percentile(&self, percentile: f64) -> Duration {
        if self.hist.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_micros(self.hist.value_at_quantile(percentile / 100.0))
    }
}
