//! CLI argument parsing for split-impl

use clap::Parser;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Splits monolithic impl/phaseN-impl.md files into per-task directories.

Before: impl/phase1-impl.md (1600+ lines)
After:  impl/phase1/context.md + impl/phase1/task1.md + ...";

#[derive(Parser, Debug)]
#[command(name = "split-impl")]
#[command(author, version, about = "Split phase implementation plans into per-task documents", long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Plan directory containing impl/ and the manifest
    #[arg(required = true, value_name = "PLAN_DIR")]
    pub plan_dir: PathBuf,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Show what would be created, deleted and updated without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Keep the monolithic document after splitting it
    #[arg(long)]
    pub keep_source: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_plan_dir() {
        let cli = Cli::parse_from(["split-impl", "plans/auth"]);
        assert_eq!(cli.plan_dir, PathBuf::from("plans/auth"));
        assert!(!cli.dry_run);
        assert!(!cli.keep_source);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::parse_from([
            "split-impl",
            "-n",
            "--keep-source",
            "-l",
            "debug",
            "-c",
            "/path/to/config.yml",
            "plans/auth",
        ]);
        assert!(cli.dry_run);
        assert!(cli.keep_source);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
    }

    #[test]
    fn test_cli_requires_plan_dir() {
        assert!(Cli::try_parse_from(["split-impl"]).is_err());
    }
}
