//! Configuration loading, merging, and the immutable run snapshot.
mod apply;
mod loader;
mod run;
pub mod types;

#[cfg(test)]
mod tests;

pub use apply::apply_config;
pub(crate) use loader::DEFAULT_CONFIG_FILES;
pub use loader::{load_config, load_config_file};
pub use run::{RunConfig, RunLimit, Scheme, Target, validate_args};
