//! Core library for the `hitload` CLI.
//!
//! `hitload` drives a fixed number of concurrent HTTP/1.1 clients against one
//! or more URLs, either for a fixed number of requests per client or for a
//! fixed duration, and reports request counts, throughput, and a latency
//! distribution once the run stops. The modules here are the building blocks
//! used by the binary; library APIs may evolve as the CLI grows.
pub mod app;
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod metrics;
pub mod system;
