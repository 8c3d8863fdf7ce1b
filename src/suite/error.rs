//! Parse errors for suite files
//!
//! Every error is fatal to the suite file it occurs in. The error records the
//! file, the 1-based line, and the offending line text so it can be located.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// What went wrong while parsing a suite file.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseErrorKind {
    #[error("text outside test bounds")]
    #[diagnostic(
        code(plane_tester::parse::text_outside_test_bounds),
        help("every block must start with `[annotation ...] test <name>`")
    )]
    TextOutsideTestBounds,

    #[error("unknown annotation `{token}`")]
    #[diagnostic(
        code(plane_tester::parse::unknown_annotation),
        help("recognized annotations are `skip` and `repeat`")
    )]
    UnknownAnnotation { token: String },

    #[error("test header has no name")]
    #[diagnostic(code(plane_tester::parse::missing_test_name))]
    MissingTestName,

    #[error("duplicate test name `{name}` (first declared on line {first_line})")]
    #[diagnostic(code(plane_tester::parse::duplicate_test_name))]
    DuplicateTestName { name: String, first_line: usize },

    #[error("malformed indentation")]
    #[diagnostic(
        code(plane_tester::parse::malformed_indentation),
        help("indent content lines with one tab or four spaces; blank lines may be empty")
    )]
    MalformedIndentation,

    #[error("file block `{name}` has no content")]
    #[diagnostic(
        code(plane_tester::parse::malformed_file_block),
        help("the last line of a file block is dropped as syntax; add an indented blank line for an empty file")
    )]
    MalformedFileBlock { name: String },

    #[error("file `{name}` declared twice in the same test")]
    #[diagnostic(code(plane_tester::parse::duplicate_file_name))]
    DuplicateFileName { name: String },

    #[error("unexpected end of input, expected {expected}")]
    #[diagnostic(code(plane_tester::parse::unexpected_end_of_input))]
    UnexpectedEndOfInput { expected: &'static str },

    #[error("cannot read suite file: {0}")]
    #[diagnostic(code(plane_tester::parse::io))]
    Io(#[from] std::io::Error),
}

/// A located parse error.
#[derive(Debug)]
pub struct ParseError {
    pub origin: PathBuf,
    /// 1-based line number, 0 when the error is not tied to a line
    pub line: usize,
    /// The offending line without its terminator
    pub text: Option<String>,
    /// Name of the test whose body was being read
    pub test: Option<String>,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(origin: impl Into<PathBuf>, line: usize, kind: ParseErrorKind) -> Self {
        Self {
            origin: origin.into(),
            line,
            text: None,
            test: None,
            kind,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.trim_end_matches('\n').to_string());
        self
    }

    pub fn in_test(mut self, name: &str) -> Self {
        self.test = Some(name.to_string());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "{}:{}: ", self.origin.display(), self.line)?;
        } else {
            write!(f, "{}: ", self.origin.display())?;
        }
        if let Some(test) = &self.test {
            write!(f, "in test `{}`: ", test)?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(text) = &self.text {
            write!(f, "\n    | {}", text)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.help()
    }
}
