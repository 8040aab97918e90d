use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::app::{print_report, run_load};
use crate::args::{PositiveUsize, TesterArgs};
use crate::config::{DEFAULT_CONFIG_FILES, RunConfig, apply_config, load_config};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::cipher_suite_names;
use crate::system::logger::init_logging;
use crate::system::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

/// Parses arguments, runs the load test, and maps the outcome to an exit
/// status: 0 for completed or interrupted runs, 1 for anything fatal.
#[must_use]
pub fn run() -> ExitCode {
    match try_run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_fatal(&err);
            ExitCode::FAILURE
        }
    }
}

fn try_run() -> AppResult<()> {
    let Some((mut args, matches)) = parse_args()? else {
        return Ok(());
    };

    init_logging(args.verbose, args.no_color);

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }
    let config = Arc::new(RunConfig::from_args(&args)?);

    let runtime = build_runtime(args.threads)?;
    runtime.block_on(run_async(config))
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = match cmd.try_get_matches_from(raw_args) {
        Ok(matches) => matches,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let args = TesterArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

fn build_runtime(threads: Option<PositiveUsize>) -> AppResult<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = threads {
        builder.worker_threads(threads.get());
    }
    Ok(builder.build()?)
}

async fn run_async(config: Arc<RunConfig>) -> AppResult<()> {
    let (shutdown_tx, _) = shutdown_channel();
    let signal_handler = setup_signal_shutdown_handler(&shutdown_tx);

    let result = run_load(config, &shutdown_tx).await;
    signal_handler.abort();

    let report = result?;
    print_report(&report);
    Ok(())
}

fn report_fatal(err: &AppError) {
    match err {
        AppError::Clap { source } => {
            if let Err(print_err) = source.print() {
                eprintln!("{}", print_err);
            }
            return;
        }
        AppError::Validation(ValidationError::UnknownCipherSuite { .. }) => {
            eprintln!("Error: {}", err);
            eprintln!("Valid suites:");
            for suite in cipher_suite_names() {
                eprintln!("  {}", suite);
            }
        }
        AppError::Validation(_)
        | AppError::Config(_)
        | AppError::Io { .. }
        | AppError::Join { .. }
        | AppError::Http(_)
        | AppError::Metrics(_) => eprintln!("Error: {}", err),
    }
    if err.is_usage_error() {
        print_usage();
    }
}

fn print_usage() {
    let mut cmd = TesterArgs::command();
    eprintln!("{}", cmd.render_usage());
    eprintln!("For more information, try '--help'.");
}
