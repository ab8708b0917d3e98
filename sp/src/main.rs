//! split-impl - CLI entry point

use std::path::Path;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use splitimpl::cli::Cli;
use splitimpl::config::Config;
use splitimpl::orchestrator::{DocumentOutcome, DocumentState, ManifestOutcome, Orchestrator, RunOptions, RunSummary};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (WARN)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn relative<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}

fn print_summary(summary: &RunSummary, plan_dir: &Path, keep_source: bool) {
    let (created, deleted, updated) = if summary.dry_run {
        ("Would create:", "Would delete:", "Would update:")
    } else {
        ("Created:", "Deleted:", "Updated:")
    };

    for result in &summary.documents {
        let doc = &result.document;
        println!("\n{} {}", "Splitting:".bold(), doc.file_name());

        match &result.outcome {
            DocumentOutcome::Split { state, report } => {
                for file in &report.files {
                    println!("  {} {}", created.green(), relative(&file.path, plan_dir).display());
                }
                for skipped in &report.skipped {
                    println!(
                        "  {} Could not extract task ID from section starting at line {} ({})",
                        "WARNING:".yellow(),
                        skipped.line,
                        skipped.heading
                    );
                }
                for name in &report.duplicates {
                    println!(
                        "  {} Duplicate task ID '{}', later section kept",
                        "WARNING:".yellow(),
                        name
                    );
                }
                if *state == DocumentState::SourceDeleted || (summary.dry_run && !keep_source) {
                    println!("  {} {}", deleted.red(), doc.file_name());
                }
            }
            DocumentOutcome::Skipped { reason } => {
                println!("  {} {}, skipping", "WARNING:".yellow(), reason);
            }
            DocumentOutcome::Failed { state, error } => {
                println!("  {} {} (stopped after: {})", "ERROR:".red().bold(), error, state);
            }
        }
    }

    let manifest_name = relative(&summary.manifest_path, plan_dir).display();
    match &summary.manifest {
        ManifestOutcome::Rewritten | ManifestOutcome::Planned => {
            println!("\n{} {}", updated.green(), manifest_name);
        }
        ManifestOutcome::Failed(e) => {
            println!("\n{} {}", "ERROR:".red().bold(), e);
        }
        ManifestOutcome::Missing | ManifestOutcome::NotNeeded => {}
    }

    println!("\nDone. Split {} file(s).", summary.split_count());
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;
    info!(plan_dir = %cli.plan_dir.display(), "split-impl starting");

    let options = RunOptions {
        dry_run: cli.dry_run,
        keep_source: cli.keep_source,
    };
    let summary = Orchestrator::new(config.clone(), options).run(&cli.plan_dir)?;

    if summary.documents.is_empty() {
        println!(
            "No phaseN-impl.{} files found in {}",
            config.extension,
            config.impl_path(&cli.plan_dir).display()
        );
        return Ok(());
    }

    print_summary(&summary, &cli.plan_dir, options.keep_source);

    if summary.has_failures() {
        eyre::bail!(
            "Split finished with errors ({} document(s) failed)",
            summary.failed_count()
        );
    }
    Ok(())
}
