use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::AppResult;
use crate::http::{Dialer, WorkerChannels, WorkerExit, WorkerShared, build_templates, run_worker};
use crate::metrics::{
    AggregatorReceivers, AggregatorSettings, CounterSnapshot, DumpBudget, LatencySummary,
    ThroughputCounters, ThroughputSnapshot, WorkerCounterSet, setup_result_aggregator,
};
use crate::system::shutdown_handlers::ShutdownSender;

use super::termination::{StopReason, TerminationController};

/// Number of response bodies printed with `--dump`.
const DUMP_LIMIT: usize = 5;
/// Channel slots per client; absorbs bursts without unbounded growth.
const CHANNEL_SLOTS_PER_CLIENT: usize = 2;

/// Read-only snapshot handed to the report renderer.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub clients: usize,
    pub counters: CounterSnapshot,
    pub latency: LatencySummary,
    pub throughput: ThroughputSnapshot,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

/// Runs the worker pool to completion and collects the final snapshot.
///
/// Every stop path broadcasts on `shutdown_tx`, gives workers the
/// configured grace period to return, aborts the rest, and drains the
/// aggregator before counters are read.
///
/// # Errors
///
/// Returns an error if request templates or the latency histogram cannot be
/// built, or the aggregator task fails.
pub async fn run_load(config: Arc<RunConfig>, shutdown_tx: &ShutdownSender) -> AppResult<RunReport> {
    let clients = config.clients;
    let capacity = clients.saturating_mul(CHANNEL_SLOTS_PER_CLIENT).max(1);
    let (outcome_tx, outcome_rx) = mpsc::channel(capacity);
    let (error_tx, error_rx) = mpsc::channel(capacity);
    let (dump_tx, dump_rx) = mpsc::channel(capacity);
    let (completion_tx, completion_rx) = mpsc::channel(capacity);

    let aggregator = setup_result_aggregator(
        AggregatorSettings {
            histogram_sigfig: config.histogram_sigfig,
            track_max_latency: config.track_max_latency,
            quiet_errors: config.quiet_errors,
        },
        AggregatorReceivers {
            outcomes: outcome_rx,
            errors: error_rx,
            dumps: dump_rx,
        },
    )?;

    let throughput = Arc::new(ThroughputCounters::default());
    let counters = WorkerCounterSet::new(clients);
    let shared = WorkerShared {
        templates: build_templates(&config)?.into(),
        dialer: Dialer::new(&config, Arc::clone(&throughput)),
        counters: counters.clone(),
        dump_budget: config.dump.then(|| Arc::new(DumpBudget::new(DUMP_LIMIT))),
        config: Arc::clone(&config),
    };
    let channels = WorkerChannels {
        outcomes: outcome_tx,
        errors: error_tx,
        dumps: dump_tx,
        completions: completion_tx,
    };

    let controller_rx = shutdown_tx.subscribe();
    let started = Instant::now();
    let deadline = config
        .limit
        .duration()
        .and_then(|duration| started.checked_add(duration));

    println!("Dispatching {} clients", clients);
    let mut workers = JoinSet::new();
    for worker_id in 0..clients {
        workers.spawn(run_worker(
            worker_id,
            shared.clone(),
            channels.clone(),
            shutdown_tx.subscribe(),
        ));
    }
    drop(channels);
    drop(shared);
    println!("Waiting for results...");

    let stop_reason = TerminationController::new(clients, completion_rx, deadline, controller_rx)
        .wait()
        .await;
    let elapsed = started.elapsed();
    info!("Stopping: {}", stop_reason);
    if shutdown_tx.send(()).is_err() {
        debug!("No shutdown listeners left");
    }

    wind_down(&mut workers, config.shutdown_grace).await;
    let aggregate = aggregator.await?;
    debug!(
        "Aggregator processed {} successes and {} error notices",
        aggregate.success_messages, aggregate.error_notices
    );

    Ok(RunReport {
        clients,
        counters: counters.merged(),
        latency: aggregate.histogram.summary(),
        throughput: throughput.snapshot(),
        elapsed,
        stop_reason,
    })
}

async fn wind_down(workers: &mut JoinSet<WorkerExit>, grace: Duration) {
    let drained = tokio::time::timeout(grace, async {
        while let Some(result) = workers.join_next().await {
            if let Err(err) = result {
                warn!("Worker task failed: {}", err);
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!(
            "{} clients still busy after {}ms grace period; aborting them",
            workers.len(),
            grace.as_millis()
        );
        workers.abort_all();
        while workers.join_next().await.is_some() {}
    }
}
