//! Test result reporting
//!
//! ## TestReporter Trait
//!
//! The runner pushes events to a `TestReporter` instead of printing, so the
//! output format can change without touching execution. Two formats ship:
//!
//! - [`ConsoleReporter`] - human-readable, one `Test <name> STATUS` line per test
//! - [`JsonReporter`] - one JSON object per event, for tooling

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use miette::{GraphicalReportHandler, GraphicalTheme};
use serde_json::{Value, json};

use super::{AggregateReport, FailureCause, RunResult, RunStatus, SuiteReport};
use crate::suite::ParseError;

/// Receives progress events from the runner. Every method defaults to a no-op.
pub trait TestReporter {
    /// Called once the suite files of a directory are known
    fn on_discovery_complete(&mut self, _dir: &Path, _suite_count: usize) {}

    /// Called before a suite file is parsed
    fn on_suite_start(&mut self, _path: &Path) {}

    /// Called when a suite file cannot be parsed; none of its tests run
    fn on_parse_error(&mut self, _path: &Path, _error: &ParseError) {}

    /// Called for every test, in declaration order
    fn on_test_complete(&mut self, _result: &RunResult) {}

    /// Called after the last test of a suite file
    fn on_suite_complete(&mut self, _report: &SuiteReport) {}

    /// Called when all suite files have completed
    fn on_run_complete(&mut self, _report: &AggregateReport) {}
}

const NAME_WIDTH: usize = 35;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// Default console reporter.
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    color: bool,
    verbose: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn new(color: bool, verbose: bool) -> Self {
        Self::with_writer(io::stdout(), color, verbose)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W, color: bool, verbose: bool) -> Self {
        Self { out, color, verbose }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn emit(&mut self, text: &str) {
        // A closed stdout must not abort the run.
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.write_all(b"\n");
    }

    fn emit_indented(&mut self, text: &str) {
        for line in text.lines() {
            self.emit(&format!("    {}", line));
        }
    }

    fn emit_failure(&mut self, iteration: usize, repeated: bool, cause: &FailureCause) {
        if repeated {
            self.emit(&format!("    failed on iteration {}", iteration));
        }
        match cause {
            FailureCause::Mismatch { mismatch, .. } => {
                self.emit_indented(&mismatch.render());
            }
            FailureCause::Driver(error) => {
                self.emit(&format!("    {}", error));
                if let Some(output) = error.captured_output() {
                    self.emit("    === Interpreter output ===");
                    self.emit_indented(output);
                    self.emit("    ==========================");
                }
            }
        }
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_discovery_complete(&mut self, dir: &Path, suite_count: usize) {
        if suite_count == 0 {
            self.emit(&format!("No suite files found in {}", dir.display()));
        }
    }

    fn on_suite_start(&mut self, path: &Path) {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        self.emit(&format!("Running tests in {}", name));
        self.emit("");
    }

    fn on_parse_error(&mut self, path: &Path, error: &ParseError) {
        if self.color {
            let mut rendered = String::new();
            let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode());
            if handler.render_report(&mut rendered, error).is_ok() {
                let label = self.paint("FAILURE", BOLD_RED);
                self.emit(&format!("{}: {}", label, path.display()));
                self.emit(rendered.trim_end());
                return;
            }
        }
        self.emit(&format!("FAILURE: {}", error));
        if let Some(help) = miette::Diagnostic::help(error) {
            self.emit(&format!("    help: {}", help));
        }
    }

    fn on_test_complete(&mut self, result: &RunResult) {
        let status = match &result.status {
            RunStatus::Success { .. } => self.paint("SUCCESS", GREEN),
            RunStatus::Failure { .. } => self.paint("FAILURE", RED),
            RunStatus::Skipped => self.paint("SKIPPED", YELLOW),
        };

        let mut line = format!("Test {:<width$}   {}", result.name, status, width = NAME_WIDTH);
        if self.verbose {
            match &result.status {
                RunStatus::Success { iterations } if result.repeated => {
                    line.push_str(&format!(" ({} iterations, {}ms)", iterations, result.duration.as_millis()));
                }
                RunStatus::Skipped => {}
                _ => line.push_str(&format!(" ({}ms)", result.duration.as_millis())),
            }
        }
        self.emit(&line);

        if let RunStatus::Failure { iteration, cause } = &result.status {
            self.emit_failure(*iteration, result.repeated, cause);
        }
    }

    fn on_suite_complete(&mut self, _report: &SuiteReport) {
        self.emit("");
    }

    fn on_run_complete(&mut self, report: &AggregateReport) {
        let mut parts = vec![
            format!("{} tests run", report.executed()),
            format!("{} passed", report.passed()),
            format!("{} failed", report.failed()),
            format!("{} skipped", report.skipped()),
        ];
        let parse_failures = report.parse_failures();
        if parse_failures > 0 {
            let noun = if parse_failures == 1 { "file" } else { "files" };
            parts.push(format!("{} suite {} failed to parse", parse_failures, noun));
        }

        let summary = format!(
            "======== {} in {:.2}s ========",
            parts.join(", "),
            report.duration.as_secs_f64()
        );
        let color = if report.is_success() { BOLD_GREEN } else { BOLD_RED };
        let summary = self.paint(&summary, color);
        self.emit(&summary);
    }
}

/// Emits one JSON object per line for every event.
pub struct JsonReporter<W: Write = io::Stdout> {
    out: W,
    current_suite: Option<PathBuf>,
}

impl JsonReporter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for JsonReporter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            current_suite: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: Value) {
        let _ = writeln!(self.out, "{}", event);
    }
}

fn status_fields(result: &RunResult) -> Value {
    match &result.status {
        RunStatus::Success { iterations } => json!({ "status": "success", "iterations": iterations }),
        RunStatus::Skipped => json!({ "status": "skipped" }),
        RunStatus::Failure { iteration, cause } => {
            let detail = match cause {
                FailureCause::Mismatch { actual, mismatch } => json!({
                    "kind": "mismatch",
                    "actual": actual,
                    "first_difference": mismatch.first_difference().map(|l| l.index + 1),
                }),
                FailureCause::Driver(error) => json!({
                    "kind": "driver",
                    "message": error.to_string(),
                    "output": error.captured_output(),
                }),
            };
            json!({ "status": "failure", "iteration": iteration, "failure": detail })
        }
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_suite_start(&mut self, path: &Path) {
        self.current_suite = Some(path.to_path_buf());
        self.emit(json!({ "event": "suite_start", "suite": path.display().to_string() }));
    }

    fn on_parse_error(&mut self, path: &Path, error: &ParseError) {
        let code = miette::Diagnostic::code(error).map(|c| c.to_string());
        self.emit(json!({
            "event": "parse_error",
            "suite": path.display().to_string(),
            "line": error.line,
            "code": code,
            "test": error.test,
            "message": error.kind.to_string(),
            "text": error.text,
        }));
    }

    fn on_test_complete(&mut self, result: &RunResult) {
        let mut event = json!({
            "event": "test",
            "suite": self.current_suite.as_ref().map(|p| p.display().to_string()),
            "name": result.name,
            "repeated": result.repeated,
            "duration_ms": result.duration.as_millis() as u64,
        });
        if let (Some(target), Value::Object(fields)) = (event.as_object_mut(), status_fields(result)) {
            target.extend(fields);
        }
        self.emit(event);
    }

    fn on_suite_complete(&mut self, report: &SuiteReport) {
        self.emit(json!({
            "event": "suite_complete",
            "suite": report.path.display().to_string(),
            "passed": report.passed(),
            "failed": report.failed(),
            "skipped": report.skipped(),
            "parse_failed": report.parse_error().is_some(),
        }));
        self.current_suite = None;
    }

    fn on_run_complete(&mut self, report: &AggregateReport) {
        self.emit(json!({
            "event": "run_complete",
            "executed": report.executed(),
            "passed": report.passed(),
            "failed": report.failed(),
            "skipped": report.skipped(),
            "parse_failures": report.parse_failures(),
            "success": report.is_success(),
            "duration_ms": report.duration.as_millis() as u64,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{Verdict, compare};
    use crate::driver::DriverError;
    use crate::suite::ParseErrorKind;
    use std::time::Duration;

    fn result(name: &str, status: RunStatus) -> RunResult {
        RunResult {
            name: name.to_string(),
            status,
            repeated: false,
            duration: Duration::from_millis(3),
        }
    }

    fn console_output(f: impl FnOnce(&mut ConsoleReporter<Vec<u8>>)) -> String {
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), false, false);
        f(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_console_status_lines() {
        let out = console_output(|r| {
            r.on_test_complete(&result("addition", RunStatus::Success { iterations: 1 }));
            r.on_test_complete(&result("later", RunStatus::Skipped));
        });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], format!("Test {:<35}   SUCCESS", "addition"));
        assert_eq!(lines[1], format!("Test {:<35}   SKIPPED", "later"));
    }

    #[test]
    fn test_console_failure_shows_diff() {
        let Verdict::Fail(mismatch) = compare("4\n", "3\n") else {
            panic!("expected mismatch");
        };
        let out = console_output(|r| {
            r.on_test_complete(&result(
                "addition",
                RunStatus::Failure {
                    iteration: 1,
                    cause: FailureCause::Mismatch {
                        actual: "4\n".to_string(),
                        mismatch,
                    },
                },
            ));
        });
        assert!(out.contains("FAILURE"));
        assert!(out.contains(">    1 | 3        | 4"));
        assert!(!out.contains("iteration"));
    }

    #[test]
    fn test_console_repeat_failure_names_iteration() {
        let mut failed = result(
            "race",
            RunStatus::Failure {
                iteration: 17,
                cause: FailureCause::Driver(DriverError::MemorySafetyViolation {
                    missing: vec!["No live objects"],
                    report: "All memory freed.\n".to_string(),
                }),
            },
        );
        failed.repeated = true;
        let out = console_output(|r| r.on_test_complete(&failed));
        assert!(out.contains("failed on iteration 17"));
        assert!(out.contains("memory safety violation"));
        assert!(out.contains("    All memory freed."));
    }

    #[test]
    fn test_console_parse_error() {
        let error = ParseError::new("bad.test", 3, ParseErrorKind::MalformedIndentation).with_text("x");
        let out = console_output(|r| r.on_parse_error(Path::new("bad.test"), &error));
        assert!(out.starts_with("FAILURE: bad.test:3: malformed indentation"));
        assert!(out.contains("help:"));
    }

    #[test]
    fn test_console_parse_error_names_test() {
        let error = ParseError::new(
            "bad.test",
            9,
            ParseErrorKind::UnexpectedEndOfInput { expected: "`end`" },
        )
        .in_test("loops");
        let out = console_output(|r| r.on_parse_error(Path::new("bad.test"), &error));
        assert!(out.starts_with("FAILURE: bad.test:9: in test `loops`: unexpected end of input"));
    }

    #[test]
    fn test_console_parse_error_with_color_renders_diagnostic() {
        let error = ParseError::new("bad.test", 3, ParseErrorKind::MalformedIndentation).with_text("x");
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), true, false);
        reporter.on_parse_error(Path::new("bad.test"), &error);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.starts_with("\x1b[1;31mFAILURE\x1b[0m: bad.test\n"));
        assert!(out.contains("plane_tester::parse::malformed_indentation"));
        assert!(out.contains("malformed indentation"));
        assert!(out.contains("indent content lines"));
    }

    #[test]
    fn test_console_summary_line() {
        let out = console_output(|r| r.on_run_complete(&AggregateReport::default()));
        assert_eq!(
            out.trim_end(),
            "======== 0 tests run, 0 passed, 0 failed, 0 skipped in 0.00s ========"
        );
    }

    #[test]
    fn test_console_color_codes() {
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), true, false);
        reporter.on_test_complete(&result("a", RunStatus::Success { iterations: 1 }));
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.contains("\x1b[32mSUCCESS\x1b[0m"));
    }

    #[test]
    fn test_json_events() {
        let mut reporter = JsonReporter::with_writer(Vec::new());
        reporter.on_suite_start(Path::new("math.test"));
        reporter.on_test_complete(&result("addition", RunStatus::Success { iterations: 1 }));
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        let events: Vec<Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(events[0]["event"], "suite_start");
        assert_eq!(events[1]["event"], "test");
        assert_eq!(events[1]["suite"], "math.test");
        assert_eq!(events[1]["name"], "addition");
        assert_eq!(events[1]["status"], "success");
        assert_eq!(events[1]["iterations"], 1);
    }

    #[test]
    fn test_json_parse_error_code() {
        let mut reporter = JsonReporter::with_writer(Vec::new());
        let error = ParseError::new(
            "a.test",
            2,
            ParseErrorKind::UnknownAnnotation {
                token: "slow".to_string(),
            },
        );
        reporter.on_parse_error(Path::new("a.test"), &error);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        let event: Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(event["code"], "plane_tester::parse::unknown_annotation");
        assert_eq!(event["line"], 2);
        assert!(event["test"].is_null());
    }

    #[test]
    fn test_json_parse_error_names_test() {
        let mut reporter = JsonReporter::with_writer(Vec::new());
        let error = ParseError::new(
            "a.test",
            4,
            ParseErrorKind::UnexpectedEndOfInput { expected: "`end`" },
        )
        .in_test("addition");
        reporter.on_parse_error(Path::new("a.test"), &error);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        let event: Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(event["test"], "addition");
        assert_eq!(event["line"], 4);
        assert_eq!(event["message"], "unexpected end of input, expected `end`");
    }
}
