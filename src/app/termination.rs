use std::fmt;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::system::shutdown_handlers::ShutdownReceiver;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    AllWorkersFinished,
    DurationElapsed,
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::AllWorkersFinished => "all clients finished their requests",
            StopReason::DurationElapsed => "run duration elapsed",
            StopReason::Interrupted => "interrupted",
        };
        f.write_str(text)
    }
}

/// Reconciles the three stop sources of a run: every worker reporting
/// completion, the duration deadline, and an operator interrupt arriving on
/// the shutdown broadcast.
#[derive(Debug)]
pub struct TerminationController {
    running: usize,
    completions: mpsc::Receiver<usize>,
    deadline: Option<Instant>,
    shutdown_rx: ShutdownReceiver,
}

impl TerminationController {
    #[must_use]
    pub const fn new(
        running: usize,
        completions: mpsc::Receiver<usize>,
        deadline: Option<Instant>,
        shutdown_rx: ShutdownReceiver,
    ) -> Self {
        Self {
            running,
            completions,
            deadline,
            shutdown_rx,
        }
    }

    /// Resolves once the run should stop.
    pub async fn wait(mut self) -> StopReason {
        if self.running == 0 {
            return StopReason::AllWorkersFinished;
        }
        let deadline = self.deadline;
        let timer = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now));
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => return StopReason::Interrupted,
                () = &mut timer, if deadline.is_some() => return StopReason::DurationElapsed,
                maybe_done = self.completions.recv() => {
                    match maybe_done {
                        Some(worker_id) => {
                            tracing::debug!("Worker {} finished its requests", worker_id);
                            self.running = self.running.saturating_sub(1);
                            if self.running == 0 {
                                return StopReason::AllWorkersFinished;
                            }
                        }
                        None => return StopReason::AllWorkersFinished,
                    }
                },
            }
        }
    }
}
