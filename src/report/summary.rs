use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::error::ReportError;
use crate::metrics::{Phases, RequestResult};

use super::{LatencyHistogram, OutputFormat, ReportContext, Reporter};

/// Percentiles listed in the latency distribution.
const PERCENTILES: [u8; 7] = [10, 25, 50, 75, 90, 95, 99];
/// Per-result rows kept for CSV output.
const MAX_CSV_ROWS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatencyPercentile {
    pub percentile: u8,
    pub secs: f64,
}

/// Aggregates for one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_secs: f64,
    pub requested: usize,
    pub results: u64,
    pub successes: u64,
    pub failures: u64,
    pub slowest_secs: f64,
    pub fastest_secs: f64,
    pub average_secs: f64,
    pub average_wait_secs: f64,
    pub average_read_secs: f64,
    pub requests_per_sec: f64,
    pub total_bytes: u64,
    pub bytes_per_result: u64,
    pub latency_distribution: Vec<LatencyPercentile>,
    pub status_codes: BTreeMap<u16, u64>,
    pub errors: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy)]
struct CsvRow {
    duration: Duration,
    wait: Duration,
    read: Duration,
    status_code: Option<u16>,
    offset: Duration,
}

/// Text, JSON or CSV report of a run.
pub struct SummaryReporter {
    writer: Box<dyn Write + Send>,
    output: OutputFormat,
    expected_total: usize,
    results: u64,
    successes: u64,
    fastest: Option<Duration>,
    slowest: Duration,
    latency_sum: Duration,
    wait_sum: Duration,
    read_sum: Duration,
    phase_samples: u64,
    total_bytes: u64,
    status_codes: BTreeMap<u16, u64>,
    errors: BTreeMap<String, u64>,
    histogram: Option<LatencyHistogram>,
    rows: Vec<CsvRow>,
    summary: Option<Summary>,
}

impl SummaryReporter {
    #[must_use]
    pub fn new(context: ReportContext) -> Self {
        let histogram = match LatencyHistogram::new() {
            Ok(histogram) => Some(histogram),
            Err(err) => {
                warn!("Failed to initialize latency histogram: {}", err);
                None
            }
        };
        Self {
            writer: context.writer,
            output: context.output,
            expected_total: context.expected_total,
            results: 0,
            successes: 0,
            fastest: None,
            slowest: Duration::ZERO,
            latency_sum: Duration::ZERO,
            wait_sum: Duration::ZERO,
            read_sum: Duration::ZERO,
            phase_samples: 0,
            total_bytes: 0,
            status_codes: BTreeMap::new(),
            errors: BTreeMap::new(),
            histogram,
            rows: Vec::new(),
            summary: None,
        }
    }

    /// The summary computed by the last `finalize` call.
    #[must_use]
    pub const fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn build_summary(&self, total: Duration) -> Summary {
        let total_secs = total.as_secs_f64();
        let results = self.results as f64;
        let average = |sum: Duration, count: u64| {
            if count == 0 {
                0.0
            } else {
                sum.as_secs_f64() / count as f64
            }
        };
        let latency_distribution = self
            .histogram
            .as_ref()
            .map(|histogram| {
                PERCENTILES
                    .iter()
                    .map(|percentile| LatencyPercentile {
                        percentile: *percentile,
                        secs: histogram
                            .value_at_percentile(f64::from(*percentile))
                            .as_secs_f64(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Summary {
            total_secs,
            requested: self.expected_total,
            results: self.results,
            successes: self.successes,
            failures: self.results.saturating_sub(self.successes),
            slowest_secs: self.slowest.as_secs_f64(),
            fastest_secs: self.fastest.unwrap_or_default().as_secs_f64(),
            average_secs: average(self.latency_sum, self.results),
            average_wait_secs: average(self.wait_sum, self.phase_samples),
            average_read_secs: average(self.read_sum, self.phase_samples),
            requests_per_sec: if total_secs > 0.0 {
                results / total_secs
            } else {
                0.0
            },
            total_bytes: self.total_bytes,
            bytes_per_result: self.total_bytes.checked_div(self.results).unwrap_or(0),
            latency_distribution,
            status_codes: self.status_codes.clone(),
            errors: self.errors.clone(),
        }
    }

    fn render(&self, summary: &Summary) -> Result<String, ReportError> {
        match self.output {
            OutputFormat::Text => {
                render_text(summary).map_err(|source| ReportError::Format { source })
            }
            OutputFormat::Json => serde_json::to_string_pretty(summary)
                .map(|mut json| {
                    json.push('\n');
                    json
                })
                .map_err(|source| ReportError::Serialize { source }),
            OutputFormat::Csv => {
                render_csv(&self.rows).map_err(|source| ReportError::Format { source })
            }
        }
    }
}

#[async_trait]
impl Reporter for SummaryReporter {
    fn record(&mut self, result: RequestResult) {
        self.results = self.results.saturating_add(1);
        if result.is_success() {
            self.successes = self.successes.saturating_add(1);
        }
        self.fastest = Some(
            self.fastest
                .map_or(result.duration, |fastest| fastest.min(result.duration)),
        );
        self.slowest = self.slowest.max(result.duration);
        self.latency_sum = self.latency_sum.saturating_add(result.duration);
        self.total_bytes = self.total_bytes.saturating_add(result.body_bytes);
        if let Some(histogram) = self.histogram.as_mut() {
            histogram.record(result.duration);
        }
        if let Some(phases) = result.phases {
            self.wait_sum = self.wait_sum.saturating_add(phases.wait);
            self.read_sum = self.read_sum.saturating_add(phases.read);
            self.phase_samples = self.phase_samples.saturating_add(1);
        }
        if let Some(status) = result.status_code {
            let count = self.status_codes.entry(status).or_insert(0);
            *count = count.saturating_add(1);
        }
        if let Some(error) = result.error.as_ref() {
            let count = self.errors.entry(error.to_string()).or_insert(0);
            *count = count.saturating_add(1);
        }
        if self.output == OutputFormat::Csv && self.rows.len() < MAX_CSV_ROWS {
            let phases = result.phases.unwrap_or(Phases {
                wait: Duration::ZERO,
                read: Duration::ZERO,
            });
            self.rows.push(CsvRow {
                duration: result.duration,
                wait: phases.wait,
                read: phases.read,
                status_code: result.status_code,
                offset: result.offset,
            });
        }
    }

    fn finalize(&mut self, total: Duration) -> Result<(), ReportError> {
        let summary = self.build_summary(total);
        let rendered = self.render(&summary)?;
        self.writer
            .write_all(rendered.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|source| ReportError::Write { source })?;
        self.summary = Some(summary);
        Ok(())
    }
}

fn render_text(summary: &Summary) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "\nSummary:")?;
    writeln!(out, "  Total:\t{:.4} secs", summary.total_secs)?;
    writeln!(out, "  Slowest:\t{:.4} secs", summary.slowest_secs)?;
    writeln!(out, "  Fastest:\t{:.4} secs", summary.fastest_secs)?;
    writeln!(out, "  Average:\t{:.4} secs", summary.average_secs)?;
    writeln!(out, "  Requests/sec:\t{:.4}", summary.requests_per_sec)?;
    if summary.total_bytes > 0 {
        writeln!(out, "\n  Total data:\t{} bytes", summary.total_bytes)?;
        writeln!(
            out,
            "  Size/request:\t{} bytes",
            summary.bytes_per_result
        )?;
    }

    if !summary.latency_distribution.is_empty() && summary.results > 0 {
        writeln!(out, "\nLatency distribution:")?;
        for entry in &summary.latency_distribution {
            writeln!(
                out,
                "  {}% in {:.4} secs",
                entry.percentile, entry.secs
            )?;
        }
    }

    writeln!(out, "\nDetails (average):")?;
    writeln!(out, "  resp wait:\t{:.4} secs", summary.average_wait_secs)?;
    writeln!(out, "  resp read:\t{:.4} secs", summary.average_read_secs)?;

    if !summary.status_codes.is_empty() {
        writeln!(out, "\nStatus code distribution:")?;
        for (status, count) in &summary.status_codes {
            writeln!(out, "  [{}]\t{} responses", status, count)?;
        }
    }

    if !summary.errors.is_empty() {
        writeln!(out, "\nError distribution:")?;
        for (error, count) in &summary.errors {
            writeln!(out, "  [{}]\t{}", count, error)?;
        }
    }
    Ok(out)
}

fn render_csv(rows: &[CsvRow]) -> Result<String, fmt::Error> {
    let mut out = String::from("response-time,wait,read,status-code,offset\n");
    for row in rows {
        let status = row
            .status_code
            .map(|status| status.to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "{:.4},{:.4},{:.4},{},{:.4}",
            row.duration.as_secs_f64(),
            row.wait.as_secs_f64(),
            row.read.as_secs_f64(),
            status,
            row.offset.as_secs_f64()
        )?;
    }
    Ok(out)
}
