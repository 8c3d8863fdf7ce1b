//! Command-line interface for the conformance runner
//!
//! ```text
//! plane-test [TEST_DIR] [--interpreter PATH] [--arg ARG]... [--timeout SECS]
//!            [--jobs N] [--repeat-limit N] [--format console|json] [--no-color] [-v]
//! ```
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! `execute` returns `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.
//!
//! ## Exit codes
//!
//! - `0` - every suite file parsed and every test passed
//! - `1` - a test failed or a suite file failed to parse
//! - `2` - the run could not start (interpreter not found, unreadable directory)

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::env;
use std::fmt;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{self, DEFAULT_REPEAT_LIMIT, DEFAULT_TEST_DIR, RunnerConfig};
use crate::driver::ProcessDriver;
use crate::runner::{ConsoleReporter, JsonReporter, Runner, TestReporter};
use crate::version::PLANE_TESTER_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    pub const USAGE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create an error for a run that could not start (exit code 2).
    pub fn setup(error: impl std::error::Error) -> Self {
        Self::new(format!("Error: {}", error), ExitCode::USAGE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Console,
    /// One JSON object per event
    Json,
}

/// Run `.test` suite files against the Plane interpreter
#[derive(Parser, Debug)]
#[command(name = "plane-test")]
#[command(version = PLANE_TESTER_VERSION)]
#[command(about = "Run .test suite files against the Plane interpreter", long_about = None)]
pub struct Cli {
    /// Directory containing suite files
    #[arg(value_name = "TEST_DIR")]
    pub test_dir: Option<PathBuf>,

    /// Interpreter executable (default: $PLANE_INTERPRETER, then a nearby `plane`)
    #[arg(short, long, value_name = "PATH")]
    pub interpreter: Option<PathBuf>,

    /// Extra interpreter argument after the source file (repeatable)
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub interpreter_args: Vec<String>,

    /// Kill the interpreter after this many seconds
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Number of tests of one suite file run at the same time
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Maximum executions of a `repeat` test
    #[arg(long, value_name = "N", default_value_t = DEFAULT_REPEAT_LIMIT)]
    pub repeat_limit: usize,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Show durations and iteration counts
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|_| format!("`{value}` is not a number of seconds"))?;
    if secs <= 0.0 {
        return Err("timeout must be positive".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Build the runner configuration from parsed arguments.
pub fn build_config(cli: &Cli) -> CliResult<RunnerConfig> {
    let interpreter = config::locate_interpreter(cli.interpreter.as_deref()).map_err(CliError::setup)?;
    tracing::info!(interpreter = %interpreter.display(), "using interpreter");

    Ok(RunnerConfig::new(interpreter)
        .with_interpreter_args(cli.interpreter_args.iter().cloned())
        .with_timeout(cli.timeout)
        .with_repeat_limit(cli.repeat_limit)
        .with_jobs(cli.jobs))
}

fn use_color(cli: &Cli) -> bool {
    !cli.no_color && env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal()
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = build_config(&cli)?;
    let driver = ProcessDriver::new(&config).map_err(CliError::setup)?;
    let runner = Runner::new(config, driver);

    let mut reporter: Box<dyn TestReporter> = match cli.format {
        OutputFormat::Console => Box::new(ConsoleReporter::new(use_color(&cli), cli.verbose)),
        OutputFormat::Json => Box::new(JsonReporter::new()),
    };

    let dir = cli.test_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_DIR));
    let report = runner
        .run_directory(&dir, reporter.as_mut())
        .map_err(CliError::setup)?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already printed
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["plane-test"]).unwrap();
        assert!(cli.test_dir.is_none());
        assert!(cli.interpreter.is_none());
        assert_eq!(cli.jobs, 1);
        assert_eq!(cli.repeat_limit, 1000);
        assert_eq!(cli.format, OutputFormat::Console);
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_cli_parse_test_dir() {
        let cli = Cli::try_parse_from(["plane-test", "suites"]).unwrap();
        assert_eq!(cli.test_dir, Some(PathBuf::from("suites")));
    }

    #[test]
    fn test_cli_parse_interpreter_args() {
        let cli = Cli::try_parse_from(["plane-test", "--arg", "-dry", "--arg", "-tree", "-i", "./plane"]).unwrap();
        assert_eq!(cli.interpreter_args, ["-dry", "-tree"]);
        assert_eq!(cli.interpreter, Some(PathBuf::from("./plane")));
    }

    #[test]
    fn test_cli_parse_timeout() {
        let cli = Cli::try_parse_from(["plane-test", "--timeout", "2.5"]).unwrap();
        assert_eq!(cli.timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_cli_rejects_bad_timeout() {
        assert!(Cli::try_parse_from(["plane-test", "--timeout", "0"]).is_err());
        assert!(Cli::try_parse_from(["plane-test", "--timeout", "soon"]).is_err());
    }

    #[test]
    fn test_cli_parse_json_format() {
        let cli = Cli::try_parse_from(["plane-test", "--format", "json", "-j", "4", "-v"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.jobs, 4);
        assert!(cli.verbose);
    }

    #[test]
    fn test_build_config_with_missing_interpreter() {
        let cli = Cli::try_parse_from(["plane-test", "-i", "/no/such/dir/plane"]).unwrap();
        let err = build_config(&cli).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::USAGE);
        assert!(err.message.contains("does not exist"));
    }
}
