use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tokio::sync::oneshot;
use tracing::{debug, error};

use volley::args::TesterArgs;
use volley::config::{DEFAULT_CONFIG_FILES, apply_config, load_config};
use volley::error::AppResult;
use volley::work::{Work, WorkSpec};

use crate::logger::init_logging;
use crate::shutdown_handlers::setup_signal_stop_handler;

pub(crate) fn run() -> AppResult<()> {
    let (mut args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    init_logging(args.verbose);

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }
    let spec = args.into_work_spec().inspect_err(|err| error!("{}", err))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(spec))
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
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

async fn run_async(spec: WorkSpec) -> AppResult<()> {
    let work = Arc::new(Work::new(spec)?);
    let (finished_tx, finished_rx) = oneshot::channel();
    let signals = setup_signal_stop_handler(Arc::clone(&work), finished_rx);

    let outcome = work.run().await;

    if finished_tx.send(()).is_err() {
        debug!("Signal handler already exited");
    }
    signals.await?;

    let reporter = outcome?;
    if let Some(summary) = reporter.summary() {
        debug!(
            results = summary.results,
            failures = summary.failures,
            "Run finished"
        );
    }
    Ok(())
}
