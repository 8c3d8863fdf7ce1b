//! Interpreter driver
//!
//! The driver runs one program through the interpreter under test and
//! enforces the output contract before anything is compared:
//!
//! 1. materialize the source and auxiliary files in a fresh [`Workspace`]
//! 2. run the interpreter with the generated source file as its argument
//! 3. merge stdout and stderr, normalize line terminators
//! 4. require the diagnostics marker and the memory-safety sentinels
//! 5. hand back everything before the marker
//!
//! [`InterpreterDriver`] is the seam the runner depends on; tests plug in
//! fakes, [`ProcessDriver`] is the real thing.

pub mod diagnostics;
pub mod process;
pub mod workspace;

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use process::ProcessDriver;
pub use workspace::Workspace;

/// Contract violations and execution failures for a single run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to prepare working directory: {0}")]
    Workspace(#[source] io::Error),

    #[error("auxiliary file name `{name}` must be a relative path inside the working directory")]
    UnsafeFileName { name: String },

    #[error("failed to launch interpreter `{}`: {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("interpreter did not finish within {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("failed to capture interpreter output: {0}")]
    Io(#[from] io::Error),

    #[error("interpreter output has no `{}` marker", diagnostics::DIAGNOSTICS_MARKER)]
    MissingDiagnosticsMarker { output: String },

    #[error("memory safety violation: diagnostics lack {}", quote_all(.missing))]
    MemorySafetyViolation { missing: Vec<&'static str>, report: String },
}

fn quote_all(items: &[&str]) -> String {
    items.iter().map(|s| format!("`{}`", s)).collect::<Vec<_>>().join(", ")
}

impl DriverError {
    /// Raw interpreter text worth showing next to the error, if any.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            DriverError::MissingDiagnosticsMarker { output } => Some(output),
            DriverError::MemorySafetyViolation { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Runs a program and returns its observable output.
pub trait InterpreterDriver: Send + Sync {
    /// Run `source` with `files` materialized next to it.
    ///
    /// Returns the program output preceding the diagnostics marker, with
    /// `\n` line terminators.
    fn run(&self, source: &str, files: &BTreeMap<String, String>) -> Result<String, DriverError>;
}

impl<T: InterpreterDriver + ?Sized> InterpreterDriver for &T {
    fn run(&self, source: &str, files: &BTreeMap<String, String>) -> Result<String, DriverError> {
        (**self).run(source, files)
    }
}

impl<T: InterpreterDriver + ?Sized> InterpreterDriver for Box<T> {
    fn run(&self, source: &str, files: &BTreeMap<String, String>) -> Result<String, DriverError> {
        (**self).run(source, files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_violation_lists_missing_sentinels() {
        let err = DriverError::MemorySafetyViolation {
            missing: vec!["All memory freed", "No live objects"],
            report: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "memory safety violation: diagnostics lack `All memory freed`, `No live objects`"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = DriverError::Timeout {
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "interpreter did not finish within 1.5s");
    }

    #[test]
    fn test_captured_output_only_for_contract_errors() {
        let err = DriverError::MissingDiagnosticsMarker {
            output: "boom".to_string(),
        };
        assert_eq!(err.captured_output(), Some("boom"));
        assert_eq!(DriverError::Io(io::Error::other("x")).captured_output(), None);
    }
}
