use std::sync::Arc;

use http::HeaderMap;
use http_body_util::BodyExt;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::{RunConfig, Target};
use crate::error::RequestError;
use crate::metrics::{DumpBudget, DumpedBody, ErrorNotice, OutcomeRecord, WorkerCounterSet};
use crate::system::shutdown_handlers::ShutdownReceiver;

use super::connection::Connection;
use super::dial::{Dialer, duration_ms};
use super::request::RequestTemplate;

/// Sending halves of the worker-to-aggregator streams plus the completion
/// channel read by the termination controller.
#[derive(Debug, Clone)]
pub struct WorkerChannels {
    pub outcomes: mpsc::Sender<OutcomeRecord>,
    pub errors: mpsc::Sender<ErrorNotice>,
    pub dumps: mpsc::Sender<DumpedBody>,
    pub completions: mpsc::Sender<usize>,
}

/// State shared by every worker of a run.
#[derive(Clone)]
pub struct WorkerShared {
    pub config: Arc<RunConfig>,
    pub templates: Arc<[RequestTemplate]>,
    pub dialer: Dialer,
    pub counters: WorkerCounterSet,
    pub dump_budget: Option<Arc<DumpBudget>>,
}

#[derive(Debug)]
struct ResponseSummary {
    status: u16,
    size: u64,
    body: bytes::Bytes,
}

/// How a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Request budget used up; completion was signalled.
    Completed,
    /// Stopped by the run-wide shutdown broadcast.
    Shutdown,
    /// The aggregator went away.
    Disconnected,
}

/// Drives one simulated client: cycles over every target in order until
/// its request budget is spent or a shutdown arrives.
pub async fn run_worker(
    worker_id: usize,
    shared: WorkerShared,
    channels: WorkerChannels,
    mut shutdown_rx: ShutdownReceiver,
) -> WorkerExit {
    let Some(counters) = shared.counters.get(worker_id) else {
        tracing::error!("No counters allocated for worker {}", worker_id);
        return WorkerExit::Disconnected;
    };
    let request_limit = shared.config.limit.requests_per_worker();
    let mut connection: Option<Connection> = None;

    while request_limit.is_none_or(|limit| counters.requests_issued() < limit) {
        for (target, template) in shared.config.targets.iter().zip(shared.templates.iter()) {
            let started = Instant::now();
            let attempt = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => return WorkerExit::Shutdown,
                attempt = execute(&shared, &mut connection, target, template) => attempt,
            };
            let latency_ms = duration_ms(started.elapsed());

            let outcome = match attempt {
                Ok(response) => {
                    forward_dump(&shared, &channels, &response).await;
                    OutcomeRecord {
                        status: response.status,
                        latency_ms,
                        size: response.size,
                    }
                }
                Err(err) => {
                    let notice = ErrorNotice {
                        worker_id,
                        message: err.to_string(),
                    };
                    if channels.errors.try_send(notice).is_err() {
                        tracing::trace!("Error notice dropped for worker {}", worker_id);
                    }
                    OutcomeRecord::network_failure(latency_ms)
                }
            };

            if channels.outcomes.send(outcome).await.is_err() {
                return WorkerExit::Disconnected;
            }
            counters.record(outcome.kind());
        }
    }

    if channels.completions.send(worker_id).await.is_err() {
        tracing::debug!("Completion signal for worker {} not delivered", worker_id);
    }
    WorkerExit::Completed
}

async fn execute(
    shared: &WorkerShared,
    connection: &mut Option<Connection>,
    target: &Target,
    template: &RequestTemplate,
) -> Result<ResponseSummary, RequestError> {
    let config = &shared.config;
    let reusable = match connection.take() {
        Some(mut existing) if existing.serves(target) => {
            if existing.ready().await {
                Some(existing)
            } else {
                None
            }
        }
        Some(_) | None => None,
    };
    let mut conn = match reusable {
        Some(conn) => conn,
        None => Connection::open(&shared.dialer, target, config.write_timeout).await?,
    };

    let exchange = async {
        let response = conn.send(template.build()).await?;
        let status = response.status().as_u16();
        let header_bytes = header_size(response.headers());
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|source| RequestError::Body { source })?
            .to_bytes();
        Ok::<_, RequestError>(ResponseSummary {
            status,
            size: response_size(body.len(), header_bytes),
            body,
        })
    };
    let summary = tokio::time::timeout(config.read_timeout, exchange)
        .await
        .map_err(|_elapsed| RequestError::Timeout {
            stage: "response",
            timeout_ms: duration_ms(config.read_timeout),
        })??;

    if config.keep_alive {
        *connection = Some(conn);
    }
    Ok(summary)
}

async fn forward_dump(shared: &WorkerShared, channels: &WorkerChannels, response: &ResponseSummary) {
    let Some(budget) = shared.dump_budget.as_ref() else {
        return;
    };
    let Some(slot) = budget.take() else {
        return;
    };
    let dump = DumpedBody {
        slot,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    };
    if channels.dumps.send(dump).await.is_err() {
        tracing::debug!("Response dump {} not delivered", slot);
    }
}

/// Header bytes as counted for the response size: each name plus a
/// two-byte separator, and each of its values plus a two-byte separator.
pub(crate) fn header_size(headers: &HeaderMap) -> u64 {
    headers
        .keys()
        .map(|name| {
            let values: u64 = headers
                .get_all(name)
                .iter()
                .map(|value| to_u64(value.len()).saturating_add(2))
                .fold(0, u64::saturating_add);
            to_u64(name.as_str().len())
                .saturating_add(2)
                .saturating_add(values)
        })
        .fold(0, u64::saturating_add)
}

pub(crate) fn response_size(body_len: usize, header_bytes: u64) -> u64 {
    to_u64(body_len).saturating_add(2).saturating_add(header_bytes)
}

fn to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
