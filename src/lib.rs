//! tunedupe - duplicate detection and retention for audio libraries
//!
//! Finds byte-identical copies by content hash and the same recording in
//! different formats by normalized tags and duration, then decides which
//! copy of each group to keep. Nothing is deleted unless asked.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod output;
pub mod progress;
pub mod retention;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{execute_plan, ExecutionConfig, ExecutionReport};
use crate::cli::{Cli, Commands, ConfigAction, FindArgs, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, ScanOutcome};
use crate::error::ExitCode;
use crate::metadata::{FfprobeProbe, LoftyExtractor};
use crate::output::{CsvOutput, JsonOutput, Report, TextOutput};
use crate::progress::Progress;
use crate::retention::{RetentionPlan, RetentionPlanner};

/// Run the application for parsed arguments.
///
/// # Errors
///
/// Configuration, scan and output failures. A scan interrupted by Ctrl+C
/// surfaces as [`duplicates::FinderError::Interrupted`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    match &cli.command {
        Commands::Config(args) => run_config(&cli, args.action),
        Commands::Find(args) => run_find(&cli, args),
    }
}

fn run_config(cli: &Cli, action: ConfigAction) -> anyhow::Result<ExitCode> {
    let path = cli.config.clone().or_else(Config::default_path);
    let mut stdout = io::stdout().lock();

    match action {
        ConfigAction::Path => match path {
            Some(path) => writeln!(stdout, "{}", path.display())?,
            None => anyhow::bail!(config::ConfigError::NoConfigDir),
        },
        ConfigAction::Init => {
            let path = path.ok_or(config::ConfigError::NoConfigDir)?;
            Config::write_example(&path)?;
            writeln!(stdout, "Wrote {}", path.display())?;
        }
        ConfigAction::Show => {
            let config = Config::load(cli.config.as_deref(), &config::Overrides::default())
                .context("Failed to load configuration")?;
            write!(stdout, "{}", config.to_toml()?)?;
        }
    }
    Ok(ExitCode::Success)
}

fn run_find(cli: &Cli, args: &FindArgs) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref(), &args.overrides())
        .context("Failed to load configuration")?;
    log::debug!("Effective configuration: {config:?}");

    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;
    let quiet_progress = cli.quiet || args.output != OutputFormat::Text;
    let progress = Arc::new(Progress::new(quiet_progress));

    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress.clone());
    finder_config.walker_config = finder_config.walker_config.with_min_size(args.min_size);

    let extractor = LoftyExtractor::new().with_probe(FfprobeProbe::new(config.probe_config()));
    let finder = DuplicateFinder::new(finder_config, Arc::new(extractor))?;

    let root = args
        .path
        .canonicalize()
        .unwrap_or_else(|_| args.path.clone());
    let outcome = finder
        .run(&root)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;

    let plan = RetentionPlanner::new(&outcome.records).plan(&outcome.all_groups())?;

    let execution_config = if config.dry_run {
        ExecutionConfig::simulate()
    } else {
        ExecutionConfig::execute(config.permanent)
    }
    .with_shutdown_flag(handler.get_flag())
    .with_progress_callback(progress);
    let execution = execute_plan(&plan, &execution_config)?;

    let exit_code = exit_code_for(&outcome, &plan, &execution);
    let report = Report {
        root: &root,
        outcome: &outcome,
        plan: &plan,
        execution: &execution,
        exit_code,
    };

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => {
            if !cli.quiet {
                TextOutput::new(report).write_to(&mut stdout)?;
            }
        }
        OutputFormat::Json => JsonOutput::new(&report).write_to(&mut stdout, true)?,
        OutputFormat::Csv => CsvOutput::new(report).write_to(&mut stdout)?,
    }
    stdout.flush()?;

    Ok(exit_code)
}

/// Exit code for a completed run.
#[must_use]
pub fn exit_code_for(
    outcome: &ScanOutcome,
    plan: &RetentionPlan,
    execution: &ExecutionReport,
) -> ExitCode {
    if execution.interrupted {
        ExitCode::Interrupted
    } else if execution.failure_count() > 0 || outcome.summary.has_skipped_files() {
        ExitCode::PartialSuccess
    } else if plan.decisions.is_empty() && plan.review.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}
