use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use stagebench::{commands, Cli, Command, Config, Reporter, TerminalReporter};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr; stdout carries only reports.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config and apply CLI overrides
    let mut config = Config::load_from(cli.config.as_deref())?;
    cli.apply_to_config(&mut config);
    debug!(?config, "Configuration");

    let reporter = TerminalReporter::new();
    match &cli.command {
        Command::Summarize { logs } => {
            let summary = commands::summarize(logs, &config)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                reporter
                    .report_summaries(&summary.reports, &summary.conclusions)
                    .context("Failed to write summary")?;
            }
        }
        Command::Compare {
            baseline,
            candidate,
        } => {
            let comparisons = commands::compare(
                std::slice::from_ref(baseline),
                std::slice::from_ref(candidate),
                &config,
            )?;
            if cli.json {
                print_json(&comparisons)?;
            } else {
                reporter
                    .report_comparisons(&comparisons)
                    .context("Failed to write comparison")?;
            }
        }
        Command::Settings { .. } => {
            let settings = commands::settings(&config)?;
            if cli.json {
                print_json(&settings)?;
            } else {
                println!("{:#?}", settings);
            }
        }
    }

    Ok(())
}
