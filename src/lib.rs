#![forbid(unsafe_code)]
//! Conformance runner for the Plane interpreter
//!
//! A suite file (`*.test`) holds named tests, each with a program, optional
//! auxiliary files and the exact output the interpreter must print. This crate
//! parses those files ([`suite`]), runs every program through an external
//! interpreter in an isolated working directory ([`driver`]), compares the
//! captured output ([`compare`]) and reports the results ([`runner`]).
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod compare;
pub mod config;
pub mod driver;
pub mod runner;
pub mod suite;
pub mod version;

pub use compare::{Mismatch, Verdict, compare};
pub use config::RunnerConfig;
pub use driver::{DriverError, InterpreterDriver, ProcessDriver};
pub use runner::{AggregateReport, Runner, RunResult, RunStatus, SuiteReport};
pub use suite::{ParseError, ParseErrorKind, TestCase, TestSuite, load_suite, parse_suite};
