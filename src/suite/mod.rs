//! Suite files: the `.test` definition language
//!
//! A suite file is a sequence of test declarations:
//!
//! ```text
//! [annotation ...] test <name>
//!     <code lines>
//! file <name>
//!     <file content lines>
//! expect
//!     <expected output lines>
//! end
//! ```
//!
//! Every content line is indented with exactly one tab or four spaces (see
//! [`dedent`]). `file` blocks are optional and repeatable.
//!
//! ## Modules
//!
//! - `cursor` - bounds-checked line cursor, the parser's only input primitive
//! - `dedent` - the indentation rule for content lines
//! - `header` - tokenizer for `[annotation ...] test <name>` lines
//! - `parser` - the block state machine producing [`TestSuite`]
//! - `error` - parse error taxonomy

pub mod cursor;
pub mod dedent;
pub mod error;
pub mod header;
pub mod parser;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

pub use error::{ParseError, ParseErrorKind};
pub use parser::{load_suite, parse_suite};

/// Annotation attached to a test header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Annotation {
    /// Do not execute the test; report it as skipped.
    Skip,
    /// Execute the test repeatedly to surface non-deterministic failures.
    Repeat,
}

impl Annotation {
    /// Every recognized annotation, in canonical order.
    pub const ALL: [Annotation; 2] = [Annotation::Skip, Annotation::Repeat];

    /// Look up an annotation by its header token.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == token)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Annotation::Skip => "skip",
            Annotation::Repeat => "repeat",
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    /// Program text handed to the interpreter
    pub code: String,
    /// Auxiliary files keyed by name, content without the block's final terminator
    pub files: BTreeMap<String, String>,
    pub expected_output: String,
    pub annotations: BTreeSet<Annotation>,
    /// 1-based line of the `test` header
    pub line: usize,
}

impl TestCase {
    pub fn has(&self, annotation: Annotation) -> bool {
        self.annotations.contains(&annotation)
    }

    pub fn is_skipped(&self) -> bool {
        self.has(Annotation::Skip)
    }

    pub fn is_repeated(&self) -> bool {
        self.has(Annotation::Repeat)
    }

    /// Serialize the case back into suite syntax, tab-indented.
    ///
    /// Parsing the rendered text yields an equal case (apart from `line`).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for annotation in &self.annotations {
            out.push_str(annotation.as_str());
            out.push(' ');
        }
        out.push_str("test ");
        out.push_str(&self.name);
        out.push('\n');

        push_indented(&mut out, &self.code);
        for (name, content) in &self.files {
            out.push_str("file ");
            out.push_str(name);
            out.push('\n');
            // The block terminator is syntax, not content.
            let mut block = content.clone();
            block.push('\n');
            push_indented(&mut out, &block);
        }
        out.push_str("expect\n");
        push_indented(&mut out, &self.expected_output);
        out.push_str("end\n");
        out
    }
}

fn push_indented(out: &mut String, text: &str) {
    for line in text.split_inclusive('\n') {
        if line == "\n" {
            out.push('\n');
        } else {
            out.push('\t');
            out.push_str(line);
        }
    }
}

/// The ordered test cases read from one suite file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    pub path: PathBuf,
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(path: impl AsRef<Path>, cases: Vec<TestCase>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cases,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn get(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name == name)
    }
}
