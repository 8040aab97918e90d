//! Outcome records, counters, the latency histogram, and the result aggregator.
mod collector;
mod histogram;
mod throughput;
mod types;


pub use collector::{
    AggregateReport, AggregatorReceivers, AggregatorSettings, MaxLatencyNotice, ResultAggregator,
    setup_result_aggregator,
};
pub use histogram::{LatencyHistogram, LatencySummary};
pub use throughput::{ThroughputCounters, ThroughputSnapshot};
pub use types::{
    CounterSnapshot, DumpBudget, DumpedBody, ErrorNotice, OutcomeKind, OutcomeRecord,
    WorkerCounterSet, WorkerCounters,
};
