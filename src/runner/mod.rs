//! Suite orchestration
//!
//! Discovers suite files, parses them, runs every test that is not skipped
//! through an [`InterpreterDriver`], compares the output, and aggregates the
//! verdicts.
//!
//! ## Reporting
//!
//! Progress is pushed to a [`TestReporter`] as it happens; results of one
//! suite file are always reported in declaration order, also when tests run
//! on several workers.
//!
//! ## Repeat mode
//!
//! A `repeat` test runs up to `repeat_limit` times and stops at the first
//! failing iteration. This surfaces non-deterministic failures (e.g. memory
//! management races) a single run would miss.

pub mod discovery;
pub mod reporter;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::compare::{Mismatch, Verdict, compare};
use crate::config::RunnerConfig;
use crate::driver::{DriverError, InterpreterDriver};
use crate::suite::{ParseError, TestCase, load_suite};

pub use discovery::discover_suite_files;
pub use reporter::{ConsoleReporter, JsonReporter, TestReporter};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot read test directory `{}`: {source}", .dir.display())]
    Discovery {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a test failed.
#[derive(Debug)]
pub enum FailureCause {
    /// The program ran cleanly but printed something else
    Mismatch { actual: String, mismatch: Mismatch },
    /// The interpreter could not run or broke the output contract
    Driver(DriverError),
}

#[derive(Debug)]
pub enum RunStatus {
    Success {
        iterations: usize,
    },
    Failure {
        /// 1-based iteration that failed; always 1 without `repeat`
        iteration: usize,
        cause: FailureCause,
    },
    Skipped,
}

/// Outcome of one test case.
#[derive(Debug)]
pub struct RunResult {
    pub name: String,
    pub status: RunStatus,
    pub repeated: bool,
    pub duration: Duration,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, RunStatus::Failure { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, RunStatus::Skipped)
    }
}

#[derive(Debug)]
pub enum SuiteOutcome {
    Ran(Vec<RunResult>),
    ParseFailed(ParseError),
}

/// Results for one suite file.
#[derive(Debug)]
pub struct SuiteReport {
    pub path: PathBuf,
    pub outcome: SuiteOutcome,
}

impl SuiteReport {
    pub fn results(&self) -> &[RunResult] {
        match &self.outcome {
            SuiteOutcome::Ran(results) => results,
            SuiteOutcome::ParseFailed(_) => &[],
        }
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        match &self.outcome {
            SuiteOutcome::ParseFailed(e) => Some(e),
            SuiteOutcome::Ran(_) => None,
        }
    }

    /// Tests that were actually executed (not skipped).
    pub fn executed(&self) -> usize {
        self.results().iter().filter(|r| !r.is_skipped()).count()
    }

    pub fn passed(&self) -> usize {
        self.results().iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results().iter().filter(|r| r.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results().iter().filter(|r| r.is_skipped()).count()
    }

    pub fn is_success(&self) -> bool {
        self.parse_error().is_none() && self.failed() == 0
    }
}

/// Totals across every suite file of a run.
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub suites: Vec<SuiteReport>,
    pub duration: Duration,
}

impl AggregateReport {
    pub fn executed(&self) -> usize {
        self.suites.iter().map(SuiteReport::executed).sum()
    }

    pub fn passed(&self) -> usize {
        self.suites.iter().map(SuiteReport::passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.suites.iter().map(SuiteReport::failed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.suites.iter().map(SuiteReport::skipped).sum()
    }

    pub fn parse_failures(&self) -> usize {
        self.suites.iter().filter(|s| s.parse_error().is_some()).count()
    }

    /// Zero failed tests and every suite file parsed.
    pub fn is_success(&self) -> bool {
        self.suites.iter().all(SuiteReport::is_success)
    }
}

/// Runs suite files against one interpreter configuration.
pub struct Runner<D> {
    config: RunnerConfig,
    driver: D,
}

impl<D: InterpreterDriver> Runner<D> {
    pub fn new(config: RunnerConfig, driver: D) -> Self {
        Self { config, driver }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run every suite file in `dir`.
    ///
    /// Only an unreadable directory is an error; parse failures and test
    /// failures are part of the report.
    #[tracing::instrument(skip_all, fields(dir = %dir.display()))]
    pub fn run_directory(
        &self,
        dir: &Path,
        reporter: &mut dyn TestReporter,
    ) -> Result<AggregateReport, RunnerError> {
        let start = Instant::now();
        let files = discover_suite_files(dir, &self.config.suite_suffix).map_err(|source| RunnerError::Discovery {
            dir: dir.to_path_buf(),
            source,
        })?;
        tracing::debug!(count = files.len(), "discovered suite files");
        reporter.on_discovery_complete(dir, files.len());

        let mut report = AggregateReport::default();
        for path in &files {
            report.suites.push(self.run_suite_file(path, reporter));
        }
        report.duration = start.elapsed();

        reporter.on_run_complete(&report);
        Ok(report)
    }

    /// Parse and run one suite file.
    #[tracing::instrument(skip_all, fields(suite = %path.display()))]
    pub fn run_suite_file(&self, path: &Path, reporter: &mut dyn TestReporter) -> SuiteReport {
        reporter.on_suite_start(path);

        let outcome = match load_suite(path) {
            Ok(suite) => SuiteOutcome::Ran(self.run_cases(&suite.cases, reporter)),
            Err(error) => {
                tracing::debug!(%error, "suite file failed to parse");
                reporter.on_parse_error(path, &error);
                SuiteOutcome::ParseFailed(error)
            }
        };

        let report = SuiteReport {
            path: path.to_path_buf(),
            outcome,
        };
        reporter.on_suite_complete(&report);
        report
    }

    /// Run `cases`, reporting each result in declaration order.
    pub fn run_cases(&self, cases: &[TestCase], reporter: &mut dyn TestReporter) -> Vec<RunResult> {
        if self.config.jobs <= 1 || cases.len() <= 1 {
            return cases
                .iter()
                .map(|case| {
                    let result = self.run_case(case);
                    reporter.on_test_complete(&result);
                    result
                })
                .collect();
        }
        self.run_cases_parallel(cases, reporter)
    }

    fn run_cases_parallel(&self, cases: &[TestCase], reporter: &mut dyn TestReporter) -> Vec<RunResult> {
        let next = AtomicUsize::new(0);
        let workers = self.config.jobs.min(cases.len());
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(case) = cases.get(index) else {
                            break;
                        };
                        if tx.send((index, self.run_case(case))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            // Buffer out-of-order completions so reporting follows declaration order.
            let mut pending = BTreeMap::new();
            let mut results = Vec::with_capacity(cases.len());
            for (index, result) in rx {
                pending.insert(index, result);
                while let Some(result) = pending.remove(&results.len()) {
                    reporter.on_test_complete(&result);
                    results.push(result);
                }
            }
            results
        })
    }

    /// Run a single test case, honouring `skip` and `repeat`.
    #[tracing::instrument(skip_all, fields(test = %case.name))]
    pub fn run_case(&self, case: &TestCase) -> RunResult {
        let start = Instant::now();
        let repeated = case.is_repeated();

        let status = if case.is_skipped() {
            RunStatus::Skipped
        } else {
            let limit = if repeated { self.config.repeat_limit } else { 1 };
            self.run_repeatedly(case, limit)
        };

        RunResult {
            name: case.name.clone(),
            status,
            repeated,
            duration: start.elapsed(),
        }
    }

    fn run_repeatedly(&self, case: &TestCase, limit: usize) -> RunStatus {
        for iteration in 1..=limit {
            if let Err(cause) = self.run_once(case) {
                if limit > 1 {
                    tracing::info!(iteration, limit, "repeated test failed");
                }
                return RunStatus::Failure { iteration, cause };
            }
        }
        RunStatus::Success { iterations: limit }
    }

    fn run_once(&self, case: &TestCase) -> Result<(), FailureCause> {
        let actual = self.driver.run(&case.code, &case.files).map_err(FailureCause::Driver)?;
        match compare(&actual, &case.expected_output) {
            Verdict::Pass => Ok(()),
            Verdict::Fail(mismatch) => Err(FailureCause::Mismatch { actual, mismatch }),
        }
    }
}
