//! Connection setup, request templates, and the per-client worker loop.
mod connection;
mod counting;
mod dial;
mod request;
mod tls;
mod worker;


pub use connection::Connection;
pub use counting::CountingStream;
pub use dial::{Dialer, TargetStream};
pub use request::{RequestTemplate, build_templates};
pub use tls::{
    ClientIdentity, TlsSettings, build_client_config, cipher_suite_names, find_cipher_suite,
    load_identity,
};
pub use worker::{WorkerChannels, WorkerExit, WorkerShared, run_worker};
