//! `steptrack` application entry point.
//!
//! The binary replays recorded step scripts through the step tracker and
//! reports whether the run's step hierarchy passed. It uses `eyre` for opaque
//! error handling at the application boundary, converting domain-specific
//! errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/steptrack/config.toml` or path from `STEPTRACK_CONFIG_PATH`)
//! 3. Environment variables (`STEPTRACK_*`)
//! 4. Command-line arguments

use std::process::ExitCode;

use clap::Parser;
use eyre::{Report, Result as EyreResult};
use mockable::DefaultEnv;
use steptrack::config::{AppConfig, CheckArgs, Cli, Commands, load_config};
use steptrack::error::Result as SteptrackResult;
use steptrack::logging::build_filter;
use steptrack::script::{StepScript, replay};
use tracing::{info, warn};

/// Application entry point.
///
/// Loads configuration, installs the log subscriber, then dispatches to the
/// subcommand handler.
fn main() -> EyreResult<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli).map_err(Report::from)?;

    let filter = build_filter(&config.logging, &DefaultEnv::new()).map_err(Report::from)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(&cli, &config).map_err(Report::from)
}

/// Execute the CLI command, returning domain-specific errors.
fn run(cli: &Cli, config: &AppConfig) -> SteptrackResult<ExitCode> {
    match &cli.command {
        Commands::Check(args) => check_script(config, args),
    }
}

/// Replay a step script and log the outcome of every step.
fn check_script(config: &AppConfig, args: &CheckArgs) -> SteptrackResult<ExitCode> {
    let script = StepScript::load(&args.script)?;
    let test_name = config.resolve_test_name(script.test_name());
    let report = replay(&script, &test_name, config.reconciliation.mode)?;

    for step in report.steps().into_iter().flatten() {
        step.error().map_or_else(
            || {
                info!(
                    number = %step.number(),
                    status = ?step.status(),
                    "{}",
                    step.description()
                );
            },
            |error| {
                warn!(
                    number = %step.number(),
                    status = ?step.status(),
                    %error,
                    "{}",
                    step.description()
                );
            },
        );
    }

    let counts = report.counts();
    info!(
        test = %test_name,
        total = counts.total,
        passed = counts.passed,
        failed = counts.failed,
        "replay finished"
    );

    if report.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
