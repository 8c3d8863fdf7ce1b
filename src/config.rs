//! Runner configuration
//!
//! Everything that used to be a process-wide constant (interpreter location,
//! suite suffix, repeat bound) lives in one [`RunnerConfig`] value handed to
//! the runner, so several configurations can coexist in one process.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Environment variable naming the interpreter executable.
pub const INTERPRETER_ENV: &str = "PLANE_INTERPRETER";
pub const DEFAULT_TEST_DIR: &str = "tests";
pub const DEFAULT_SUITE_SUFFIX: &str = ".test";
pub const DEFAULT_SOURCE_EXTENSION: &str = "pln";
pub const DEFAULT_REPEAT_LIMIT: usize = 1000;

/// Executable names tried when no interpreter is given explicitly.
const INTERPRETER_NAMES: [&str; 2] = ["plane", "plane.exe"];
/// How many parent directories above a search root are searched.
const SEARCH_DEPTH: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("interpreter not found (pass --interpreter or set {}); searched: {}", INTERPRETER_ENV, .searched.join(", "))]
    InterpreterNotFound { searched: Vec<String> },

    #[error("interpreter `{}` does not exist", .0.display())]
    MissingInterpreter(PathBuf),
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Interpreter executable
    pub interpreter: PathBuf,
    /// Extra arguments passed after the generated source file
    pub interpreter_args: Vec<String>,
    /// File name suffix identifying suite files
    pub suite_suffix: String,
    /// Extension of the generated source file
    pub source_extension: String,
    /// Per-run limit; `None` waits forever
    pub timeout: Option<Duration>,
    /// Upper bound on executions of a `repeat` test
    pub repeat_limit: usize,
    /// Worker threads executing the tests of one suite file
    pub jobs: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(INTERPRETER_NAMES[0]),
            interpreter_args: Vec::new(),
            suite_suffix: DEFAULT_SUITE_SUFFIX.to_string(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            timeout: None,
            repeat_limit: DEFAULT_REPEAT_LIMIT,
            jobs: 1,
        }
    }
}

impl RunnerConfig {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            ..Self::default()
        }
    }

    pub fn with_interpreter_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreter_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_suite_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suite_suffix = suffix.into();
        self
    }

    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the repeat bound (at least 1).
    pub fn with_repeat_limit(mut self, limit: usize) -> Self {
        self.repeat_limit = limit.max(1);
        self
    }

    /// Set the worker count (at least 1).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

/// Find the interpreter executable.
///
/// Order: `explicit`, then `$PLANE_INTERPRETER`, then `plane`/`plane.exe` in
/// the current directory, its ancestors, and next to this executable.
pub fn locate_interpreter(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let mut roots = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }
    locate_interpreter_in(explicit, env::var_os(INTERPRETER_ENV), &roots)
}

/// [`locate_interpreter`] with the environment supplied by the caller.
pub fn locate_interpreter_in(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    roots: &[PathBuf],
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return existing(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return existing(PathBuf::from(value));
    }

    let mut searched = Vec::new();
    for root in roots {
        for dir in root.ancestors().take(SEARCH_DEPTH + 1) {
            for name in INTERPRETER_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    tracing::debug!(interpreter = %candidate.display(), "located interpreter");
                    return Ok(candidate);
                }
                searched.push(candidate.display().to_string());
            }
        }
    }
    Err(ConfigError::InterpreterNotFound { searched })
}

fn existing(path: PathBuf) -> Result<PathBuf, ConfigError> {
    // Bare names are resolved through PATH at spawn time.
    if path.components().count() == 1 || path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::MissingInterpreter(path))
    }
}
