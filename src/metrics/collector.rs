use std::fmt;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::AppResult;

use super::{DumpedBody, ErrorNotice, LatencyHistogram, OutcomeKind, OutcomeRecord};

#[derive(Debug, Clone, Copy)]
pub struct AggregatorSettings {
    pub histogram_sigfig: u8,
    pub track_max_latency: bool,
    pub quiet_errors: bool,
}

/// Receiving halves of the three worker-to-aggregator streams.
#[derive(Debug)]
pub struct AggregatorReceivers {
    pub outcomes: mpsc::Receiver<OutcomeRecord>,
    pub errors: mpsc::Receiver<ErrorNotice>,
    pub dumps: mpsc::Receiver<DumpedBody>,
}

/// Emitted whenever a successful request beats the running maximum latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxLatencyNotice {
    pub message_count: u64,
    pub latency_ms: u64,
}

impl fmt::Display for MaxLatencyNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  latency: {} (ms)",
            self.message_count, self.latency_ms
        )
    }
}

/// What the aggregator hands back once every stream has closed.
#[derive(Debug)]
pub struct AggregateReport {
    pub histogram: LatencyHistogram,
    pub success_messages: u64,
    pub error_notices: u64,
}

/// Sole owner of the histogram and the max-latency tracker.
#[derive(Debug)]
pub struct ResultAggregator {
    histogram: LatencyHistogram,
    track_max_latency: bool,
    max_latency_ms: Option<u64>,
    success_messages: u64,
    error_notices: u64,
}

impl ResultAggregator {
    /// # Errors
    ///
    /// Returns an error if the latency histogram cannot be created.
    pub fn new(settings: AggregatorSettings) -> AppResult<Self> {
        Ok(Self {
            histogram: LatencyHistogram::new(settings.histogram_sigfig)?,
            track_max_latency: settings.track_max_latency,
            max_latency_ms: None,
            success_messages: 0,
            error_notices: 0,
        })
    }

    /// Folds one outcome in. Only 2xx outcomes touch the histogram.
    pub fn record_outcome(&mut self, outcome: OutcomeRecord) -> Option<MaxLatencyNotice> {
        if outcome.kind() != OutcomeKind::Success {
            return None;
        }
        self.success_messages = self.success_messages.saturating_add(1);
        self.histogram.record(outcome.latency_ms);

        if !self.track_max_latency {
            return None;
        }
        let is_new_max = self
            .max_latency_ms
            .is_none_or(|max| outcome.latency_ms > max);
        if !is_new_max {
            return None;
        }
        self.max_latency_ms = Some(outcome.latency_ms);
        Some(MaxLatencyNotice {
            message_count: self.success_messages,
            latency_ms: outcome.latency_ms,
        })
    }

    pub const fn note_error(&mut self) {
        self.error_notices = self.error_notices.saturating_add(1);
    }

    #[must_use]
    pub fn finish(self) -> AggregateReport {
        AggregateReport {
            histogram: self.histogram,
            success_messages: self.success_messages,
            error_notices: self.error_notices,
        }
    }
}

/// Spawns the aggregator task. It runs until every sender of all three
/// streams is gone, so anything queued before the workers exit is drained.
///
/// # Errors
///
/// Returns an error if the latency histogram cannot be created.
pub fn setup_result_aggregator(
    settings: AggregatorSettings,
    receivers: AggregatorReceivers,
) -> AppResult<JoinHandle<AggregateReport>> {
    let mut aggregator = ResultAggregator::new(settings)?;
    let AggregatorReceivers {
        mut outcomes,
        mut errors,
        mut dumps,
    } = receivers;
    let quiet_errors = settings.quiet_errors;

    Ok(tokio::spawn(async move {
        let mut outcomes_open = true;
        let mut errors_open = true;
        let mut dumps_open = true;

        loop {
            tokio::select! {
                maybe_outcome = outcomes.recv(), if outcomes_open => {
                    match maybe_outcome {
                        Some(outcome) => {
                            if let Some(notice) = aggregator.record_outcome(outcome) {
                                println!("{notice}");
                            }
                        }
                        None => outcomes_open = false,
                    }
                },
                maybe_error = errors.recv(), if errors_open => {
                    match maybe_error {
                        Some(notice) => {
                            aggregator.note_error();
                            if quiet_errors {
                                tracing::debug!(worker = notice.worker_id, "Error: {}", notice.message);
                            } else {
                                tracing::warn!(worker = notice.worker_id, "Error: {}", notice.message);
                            }
                        }
                        None => errors_open = false,
                    }
                },
                maybe_dump = dumps.recv(), if dumps_open => {
                    match maybe_dump {
                        Some(dump) => println!("{}: {}", dump.slot, dump.body),
                        None => dumps_open = false,
                    }
                },
                else => break,
            }
        }

        tracing::debug!("Result aggregator drained all streams");
        aggregator.finish()
    }))
}
