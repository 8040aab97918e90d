use hdrhistogram::Histogram;

use crate::error::{AppResult, MetricsError};

const LOWEST_TRACKABLE_MS: u64 = 1;
const HIGHEST_TRACKABLE_MS: u64 = 10_000;

/// Success-latency histogram, logarithmically bucketed over [1, 10000] ms.
#[derive(Debug)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a histogram with `sigfig` significant figures of precision.
    ///
    /// # Errors
    ///
    /// Returns an error if `sigfig` is outside 1..=5 or the histogram
    /// cannot be allocated.
    pub fn new(sigfig: u8) -> AppResult<Self> {
        if !(1..=5).contains(&sigfig) {
            return Err(MetricsError::InvalidSigfig { value: sigfig }.into());
        }
        let hist =
            Histogram::<u64>::new_with_bounds(LOWEST_TRACKABLE_MS, HIGHEST_TRACKABLE_MS, sigfig)
                .map_err(|source| MetricsError::CreateHistogram { source })?;
        Ok(Self { hist })
    }

    /// Record a latency in milliseconds. Sub-millisecond requests record as
    /// 0; values above the trackable range are clamped to its top.
    pub fn record(&mut self, latency_ms: u64) {
        self.hist.saturating_record(latency_ms.min(HIGHEST_TRACKABLE_MS));
    }

    #[must_use]
    pub fn summary(&self) -> LatencySummary {
        if self.hist.is_empty() {
            return LatencySummary::default();
        }
        LatencySummary {
            count: self.hist.len(),
            p2_5: self.hist.value_at_percentile(2.5),
            p50: self.hist.value_at_percentile(50.0),
            p97_5: self.hist.value_at_percentile(97.5),
            p99: self.hist.value_at_percentile(99.0),
            mean: self.hist.mean(),
            stdev: self.hist.stdev(),
            min: self.hist.min(),
            max: self.hist.max(),
        }
    }
}

/// Read-only view of the histogram taken at report time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
    pub count: u64,
    pub p2_5: u64,
    pub p50: u64,
    pub p97_5: u64,
    pub p99: u64,
    pub mean: f64,
    pub stdev: f64,
    pub min: u64,
    pub max: u64,
}
