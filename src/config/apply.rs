use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{PositiveU64, PositiveUsize, TesterArgs};
use crate::error::{AppError, AppResult, ConfigError, MetricsError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Values supplied on the
/// command line are left untouched.
///
/// # Errors
///
/// Returns an error when a config value is out of range.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    apply_targets(args, matches, config);
    apply_limits(args, matches, config)?;
    apply_transport(args, matches, config)?;
    apply_diagnostics(args, matches, config)?;
    Ok(())
}

fn apply_targets(args: &mut TesterArgs, matches: &ArgMatches, config: &ConfigFile) {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "urls_file")
        && let Some(path) = config.urls_file.clone()
    {
        args.urls_file = Some(path);
    }

    if !is_cli(matches, "data_file")
        && let Some(path) = config.data_file.clone()
    {
        args.data_file = Some(path);
    }

    if !is_cli(matches, "auth")
        && let Some(auth) = config.auth.clone()
    {
        args.auth = Some(auth);
    }

    if !is_cli(matches, "host_header")
        && let Some(host) = config.host.clone()
    {
        args.host_header = Some(host);
    }
}

fn apply_limits(args: &mut TesterArgs, matches: &ArgMatches, config: &ConfigFile) -> AppResult<()> {
    if !is_cli(matches, "clients")
        && let Some(clients) = config.clients
    {
        args.clients = ensure_positive_usize(clients, "clients")?;
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = Some(ensure_positive_u64(requests, "requests")?);
    }

    if !is_cli(matches, "duration")
        && let Some(duration) = config.duration
    {
        args.duration = Some(ensure_positive_u64(duration, "duration")?);
    }

    Ok(())
}

fn apply_transport(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "keep_alive")
        && let Some(value) = config.keep_alive
    {
        args.keep_alive = value;
    }

    if !is_cli(matches, "insecure")
        && let Some(value) = config.insecure
    {
        args.insecure = value;
    }

    if !is_cli(matches, "cert")
        && let Some(path) = config.cert.clone()
    {
        args.cert = Some(path);
    }

    if !is_cli(matches, "key")
        && let Some(path) = config.key.clone()
    {
        args.key = Some(path);
    }

    if !is_cli(matches, "resolve")
        && let Some(name) = config.resolve.clone()
    {
        args.resolve = Some(name);
    }

    if !is_cli(matches, "cipher")
        && let Some(name) = config.cipher.clone()
    {
        args.cipher = Some(name);
    }

    if !is_cli(matches, "write_timeout_ms")
        && let Some(value) = config.write_timeout
    {
        args.write_timeout_ms = ensure_positive_u64(value, "write_timeout")?;
    }

    if !is_cli(matches, "read_timeout_ms")
        && let Some(value) = config.read_timeout
    {
        args.read_timeout_ms = ensure_positive_u64(value, "read_timeout")?;
    }

    Ok(())
}

fn apply_diagnostics(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "track_max_latency")
        && let Some(value) = config.track_max_latency
    {
        args.track_max_latency = value;
    }

    if !is_cli(matches, "dump")
        && let Some(value) = config.dump
    {
        args.dump = value;
    }

    if !is_cli(matches, "quiet_errors")
        && let Some(value) = config.quiet_errors
    {
        args.quiet_errors = value;
    }

    if !is_cli(matches, "shutdown_grace_ms")
        && let Some(value) = config.shutdown_grace
    {
        args.shutdown_grace_ms = value;
    }

    if !is_cli(matches, "histogram_sigfig")
        && let Some(value) = config.histogram_sigfig
    {
        if !(1..=5).contains(&value) {
            return Err(AppError::metrics(MetricsError::InvalidSigfig { value }));
        }
        args.histogram_sigfig = value;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_u64(value: u64, field: &str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}
