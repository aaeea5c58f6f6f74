//! Command-line interface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Version banner including build metadata exported by build.rs
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

/// API Paradigm Experiment - controlled REST vs GraphQL measurement and analysis
#[derive(Parser, Debug, Clone)]
#[command(name = "apx")]
#[command(version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level operations
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the paired measurement experiment and persist the results
    Run(RunArgs),
    /// Analyze a persisted measurement file
    Analyze(AnalyzeArgs),
    /// Validate token and API reachability
    Check,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Paired repetitions per treatment
    #[arg(short = 'n', long, value_parser = parse_repetitions)]
    pub repetitions: Option<u32>,

    /// Keep the canonical treatment order
    #[arg(long)]
    pub no_randomize: bool,

    /// Pause after every invocation, in milliseconds
    #[arg(long, value_name = "MS", value_parser = parse_delay)]
    pub delay_ms: Option<u64>,

    /// Directory receiving the measurement artifacts
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Measurement file (.csv or .json); defaults to the newest file in the results directory
    #[arg(value_name = "DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Directory receiving the analysis artifacts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory searched for the newest measurement file
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command Line:\n");
        match &self.command {
            Command::Run(args) => {
                summary.push_str("  Command: run\n");
                if let Some(n) = args.repetitions {
                    summary.push_str(&format!("  Repetitions: {}\n", n));
                }
                if args.no_randomize {
                    summary.push_str("  Randomize: false\n");
                }
                if let Some(ms) = args.delay_ms {
                    summary.push_str(&format!("  Delay: {}ms\n", ms));
                }
                if let Some(dir) = &args.results_dir {
                    summary.push_str(&format!("  Results dir: {}\n", dir.display()));
                }
            }
            Command::Analyze(args) => {
                summary.push_str("  Command: analyze\n");
                if let Some(file) = &args.data_file {
                    summary.push_str(&format!("  Data file: {}\n", file.display()));
                }
                if let Some(dir) = &args.output_dir {
                    summary.push_str(&format!("  Output dir: {}\n", dir.display()));
                }
            }
            Command::Check => summary.push_str("  Command: check\n"),
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

fn parse_repetitions(s: &str) -> Result<u32, String> {
    if s.starts_with('+') {
        return Err(format!("Invalid repetitions: {}", s));
    }

    s.parse::<u32>()
        .map_err(|_| format!("Invalid repetitions: {}", s))
        .and_then(|n| {
            if n == 0 {
                Err("Repetitions must be greater than 0".to_string())
            } else if n > 1000 {
                Err("Repetitions cannot exceed 1000".to_string())
            } else {
                Ok(n)
            }
        })
}

fn parse_delay(s: &str) -> Result<u64, String> {
    if s.starts_with('+') {
        return Err(format!("Invalid delay: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid delay: {}", s))
        .and_then(|ms| {
            if ms > 60_000 {
                Err("Delay cannot exceed 60000 ms".to_string())
            } else {
                Ok(ms)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_parsing_all_options() {
        let cli = Cli::parse_from([
            "apx",
            "run",
            "--repetitions", "10",
            "--no-randomize",
            "--delay-ms", "250",
            "--results-dir", "out",
            "--verbose",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.repetitions, Some(10));
                assert!(args.no_randomize);
                assert_eq!(args.delay_ms, Some(250));
                assert_eq!(args.results_dir, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_defaults_leave_overrides_empty() {
        let cli = Cli::parse_from(["apx", "run"]);
        match cli.command {
            Command::Run(args) => {
                assert!(args.repetitions.is_none());
                assert!(!args.no_randomize);
                assert!(args.delay_ms.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_analyze_parsing() {
        let cli = Cli::parse_from(["apx", "--no-color", "analyze", "results/x.csv", "-o", "analysis"]);
        assert!(cli.no_color);
        assert!(!cli.use_colors());
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.data_file, Some(PathBuf::from("results/x.csv")));
                assert_eq!(args.output_dir, Some(PathBuf::from("analysis")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["apx", "check", "--debug"]);
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["apx"]).is_err());
    }

    #[test]
    fn test_repetition_parsing_edge_cases() {
        assert_eq!(parse_repetitions("1").unwrap(), 1);
        assert_eq!(parse_repetitions("1000").unwrap(), 1000);
        assert!(parse_repetitions("0").is_err());
        assert!(parse_repetitions("1001").is_err());
        assert!(parse_repetitions("+5").is_err());
        assert!(parse_repetitions("-5").is_err());
        assert!(parse_repetitions("five").is_err());
    }

    #[test]
    fn test_delay_parsing_edge_cases() {
        assert_eq!(parse_delay("0").unwrap(), 0);
        assert_eq!(parse_delay("60000").unwrap(), 60_000);
        assert!(parse_delay("60001").is_err());
        assert!(parse_delay("1.5").is_err());
    }

    #[test]
    fn test_config_summary() {
        let cli = Cli::parse_from(["apx", "run", "-n", "5", "--verbose"]);
        let summary = cli.get_config_summary();
        assert!(summary.contains("Command: run"));
        assert!(summary.contains("Repetitions: 5"));
        assert!(summary.contains("Verbose mode: true"));
    }

    #[test]
    fn test_long_version_contains_build_metadata() {
        assert!(LONG_VERSION.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(LONG_VERSION.contains("commit"));
    }
}
