//! Suite file parser
//!
//! A small state machine over [`LineCursor`]:
//!
//! ```text
//! ExpectHeader -> ReadCode -> ReadFiles* -> ReadExpected -> ExpectHeader | EOF
//! ```
//!
//! Any error aborts the whole file; no partial suite is returned.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use super::cursor::LineCursor;
use super::dedent::dedent;
use super::error::{ParseError, ParseErrorKind};
use super::header::{HeaderError, parse_header};
use super::{Annotation, TestCase, TestSuite};

const EXPECT_KEYWORD: &str = "expect";
const END_KEYWORD: &str = "end";
const FILE_KEYWORD: &str = "file ";

/// Read and parse a suite file from disk.
pub fn load_suite(path: &Path) -> Result<TestSuite, ParseError> {
    let source = fs::read_to_string(path).map_err(|e| ParseError::new(path, 0, ParseErrorKind::Io(e)))?;
    parse_suite(&source, path)
}

/// Parse suite text. `origin` is only used for error reporting and [`TestSuite::path`].
#[tracing::instrument(skip_all, fields(origin = %origin.display(), source_len = source.len()))]
pub fn parse_suite(source: &str, origin: &Path) -> Result<TestSuite, ParseError> {
    let normalized = source.replace("\r\n", "\n");
    let mut parser = SuiteParser {
        cursor: LineCursor::new(&normalized),
        origin,
    };

    let mut cases: Vec<TestCase> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    while let Some(case) = parser.next_case()? {
        if let Some(&first_line) = seen.get(&case.name) {
            let error = parser.error_at(
                case.line,
                ParseErrorKind::DuplicateTestName {
                    name: case.name.clone(),
                    first_line,
                },
            );
            return Err(error.in_test(&case.name));
        }
        seen.insert(case.name.clone(), case.line);
        cases.push(case);
    }

    tracing::debug!(cases = cases.len(), "parsed suite");
    Ok(TestSuite::new(origin, cases))
}

/// How content lines of a block are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Dedent and keep every line
    Keep,
    /// Consume lines without validating them (skipped tests)
    Discard,
}

/// The line that ended a code or file block.
enum Terminator {
    Expect,
    /// `end` before any `expect`; only closes a skipped test
    End,
    File { name: String, line: usize },
}

struct SuiteParser<'a> {
    cursor: LineCursor<'a>,
    origin: &'a Path,
}

impl<'a> SuiteParser<'a> {
    fn error_at(&self, line: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.origin, line, kind)
    }

    fn error_here(&self, kind: ParseErrorKind, text: &str) -> ParseError {
        ParseError::new(self.origin, self.cursor.line_number(), kind).with_text(text)
    }

    /// Reported at the last line of the file.
    fn unexpected_end(&self, expected: &'static str) -> ParseError {
        self.error_at(self.cursor.total_lines(), ParseErrorKind::UnexpectedEndOfInput { expected })
    }

    /// ExpectHeader: skip blank lines, then parse one complete test block.
    fn next_case(&mut self) -> Result<Option<TestCase>, ParseError> {
        let line = loop {
            match self.cursor.next_line() {
                None => return Ok(None),
                Some(l) if l.trim().is_empty() => continue,
                Some(l) => break l,
            }
        };
        let header_line = self.cursor.line_number();

        let header = parse_header(line).map_err(|e| {
            let kind = match e {
                HeaderError::NotAHeader => ParseErrorKind::TextOutsideTestBounds,
                HeaderError::UnknownAnnotation(token) => ParseErrorKind::UnknownAnnotation { token },
                HeaderError::MissingName => ParseErrorKind::MissingTestName,
            };
            self.error_here(kind, line)
        })?;

        let mode = if header.annotations.contains(&Annotation::Skip) {
            Mode::Discard
        } else {
            Mode::Keep
        };

        let (code, files, expected_output) = self.read_body(mode).map_err(|e| e.in_test(&header.name))?;

        Ok(Some(TestCase {
            name: header.name,
            code,
            files,
            expected_output,
            annotations: header.annotations,
            line: header_line,
        }))
    }

    /// Everything after the header up to and including `end`.
    fn read_body(&mut self, mode: Mode) -> Result<(String, BTreeMap<String, String>, String), ParseError> {
        let (code, mut terminator) = self.read_code_block(mode)?;

        let mut files = BTreeMap::new();
        while let Terminator::File { name, line } = terminator {
            let (mut content, next) = self.read_code_block(mode)?;
            terminator = next;
            if mode == Mode::Discard {
                continue;
            }
            // The block's final terminator belongs to the syntax.
            if content.pop() != Some('\n') {
                return Err(self.error_at(line, ParseErrorKind::MalformedFileBlock { name }));
            }
            match files.entry(name) {
                Entry::Occupied(entry) => {
                    return Err(self.error_at(
                        line,
                        ParseErrorKind::DuplicateFileName {
                            name: entry.key().clone(),
                        },
                    ));
                }
                Entry::Vacant(entry) => {
                    entry.insert(content);
                }
            }
        }

        if matches!(terminator, Terminator::End) {
            return Ok((code, files, String::new()));
        }

        // The `expect` line was only peeked at.
        self.cursor.next_line();
        let expected_output = self.read_expected_block(mode)?;
        Ok((code, files, expected_output))
    }

    /// ReadCode / ReadFiles: accumulate lines until `expect` (peeked) or `file <name>` (consumed).
    ///
    /// A skipped test may also close here with `end`.
    fn read_code_block(&mut self, mode: Mode) -> Result<(String, Terminator), ParseError> {
        let mut text = String::new();
        loop {
            let Some(line) = self.cursor.peek() else {
                return Err(self.unexpected_end("`expect`"));
            };
            let trimmed = line.trim();
            if trimmed == EXPECT_KEYWORD {
                return Ok((text, Terminator::Expect));
            }
            self.cursor.next_line();
            if mode == Mode::Discard && trimmed == END_KEYWORD {
                return Ok((text, Terminator::End));
            }
            if let Some(name) = trimmed.strip_prefix(FILE_KEYWORD) {
                let terminator = Terminator::File {
                    name: name.trim().to_string(),
                    line: self.cursor.line_number(),
                };
                return Ok((text, terminator));
            }
            self.push_content(&mut text, line, mode)?;
        }
    }

    /// ReadExpected: accumulate lines until `end` (consumed).
    fn read_expected_block(&mut self, mode: Mode) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            let Some(line) = self.cursor.next_line() else {
                return Err(self.unexpected_end("`end`"));
            };
            if line.trim() == END_KEYWORD {
                return Ok(text);
            }
            self.push_content(&mut text, line, mode)?;
        }
    }

    fn push_content(&self, text: &mut String, line: &str, mode: Mode) -> Result<(), ParseError> {
        if mode == Mode::Discard {
            return Ok(());
        }
        let content = dedent(line).map_err(|_| self.error_here(ParseErrorKind::MalformedIndentation, line))?;
        text.push_str(content);
        Ok(())
    }
}
