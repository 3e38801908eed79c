mod aggregate;
mod chat;
mod classify;
mod cli;
mod cli_help;
mod config;
mod error;
mod guard;
mod ingest;
mod pipeline;
mod privacy;
mod report_helpers;
mod snapshot;
mod store;
mod summary;
mod window;

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};
use config::Config;
use error::{Result, SyncError};
use pipeline::{Collaborators, SyncOptions};
use store::{DataStore, MemoryStore};
use window::{TimeWindow, last_completed_week};

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn load_config(path: &Path, needs_store: bool) -> Result<Config> {
    let mut config = Config::load(path)?.with_env(|key| std::env::var(key).ok());
    config.validate(needs_store)?;
    Ok(config)
}

fn run_sync(
    config_path: &Path,
    force: bool,
    allow_partial: bool,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path, !dry_run)?;
    let chat = config.chat_platform()?;
    let classifier = config.route_classifier()?;
    let detector = config.issue_detector();
    log::debug!("issue keywords: {:?}", detector.keywords());
    let store: Box<dyn DataStore> = if dry_run {
        log::info!("dry run: using an in-memory store, no snapshot");
        Box::new(MemoryStore::new())
    } else {
        config.data_store()?
    };

    let collab = Collaborators {
        chat: chat.as_ref(),
        store: store.as_ref(),
        classifier: classifier.as_ref(),
    };
    let options = SyncOptions {
        channels: &config.channels,
        detector: &detector,
        snapshot_path: (!dry_run).then_some(config.snapshot_path.as_path()),
        force,
        allow_partial,
    };

    let outcome = pipeline::run(Utc::now(), &collab, &options)?;
    if json {
        summary::print_json(&outcome)
    } else {
        summary::print_outcome(&outcome);
        Ok(())
    }
}

fn run_window(at: Option<&str>, json: bool) -> Result<()> {
    let now = match at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map_err(|e| SyncError::Config(format!("invalid --at {s:?}: {e}")))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let window = last_completed_week(now);
    if json {
        report_helpers::print_json_stdout(&window)
    } else {
        summary::print_window(&window);
        Ok(())
    }
}

fn run_snapshot(config_path: &Path, week: Option<&str>, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, true)?;
    let now = Utc::now();
    let week_key = match week {
        Some(key) => {
            TimeWindow::from_week_key(key)
                .ok_or_else(|| SyncError::Config(format!("invalid week key {key:?}")))?
                .week_key
        }
        None => last_completed_week(now).week_key,
    };
    let path = output.unwrap_or(config.snapshot_path.as_path());
    let store = config.data_store()?;
    let snap = pipeline::rebuild_snapshot(now, store.as_ref(), &week_key, path)?;
    println!(
        "Snapshot for {} ({} routes, {} messages) written to {}",
        snap.week,
        snap.routes.len(),
        snap.total_messages,
        path.display()
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sync {
            force,
            allow_partial,
            dry_run,
            json,
        } => run_sync(&cli.config, force, allow_partial, dry_run, json),
        Commands::Window { at, json } => run_window(at.as_deref(), json),
        Commands::Snapshot { week, output } => {
            run_snapshot(&cli.config, week.as_deref(), output.as_deref())
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "tpulse", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
