//! Output comparison
//!
//! Pass/fail is exact string equality: the parser already removed the
//! indentation, and leading or trailing whitespace inside a line is
//! significant. On failure, lines are paired by index to build a diff table.

use std::fmt;

/// Placeholder for the side that ran out of lines.
pub const NO_MORE_LINES: &str = "<no more lines>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(Mismatch),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// One row of the diff table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// 0-based line index
    pub index: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl DiffLine {
    pub fn differs(&self) -> bool {
        self.expected != self.actual
    }
}

/// Line-aligned comparison of a failed test's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub lines: Vec<DiffLine>,
}

/// Compare the program's output against the expected output.
pub fn compare(actual: &str, expected: &str) -> Verdict {
    if actual == expected {
        return Verdict::Pass;
    }

    // Terminators stay attached so a missing final newline shows up as a difference.
    let expected_lines: Vec<&str> = expected.split_inclusive('\n').collect();
    let actual_lines: Vec<&str> = actual.split_inclusive('\n').collect();
    let rows = expected_lines.len().max(actual_lines.len());

    let lines = (0..rows)
        .map(|index| DiffLine {
            index,
            expected: expected_lines.get(index).map(|s| s.to_string()),
            actual: actual_lines.get(index).map(|s| s.to_string()),
        })
        .collect();

    Verdict::Fail(Mismatch { lines })
}

fn cell(line: &Option<String>) -> String {
    match line {
        None => NO_MORE_LINES.to_string(),
        Some(text) => match text.strip_suffix('\n') {
            Some(content) => content.to_string(),
            None => format!("{} (no newline)", text),
        },
    }
}

impl Mismatch {
    /// The first row whose sides differ.
    pub fn first_difference(&self) -> Option<&DiffLine> {
        self.lines.iter().find(|l| l.differs())
    }

    pub fn differing_lines(&self) -> usize {
        self.lines.iter().filter(|l| l.differs()).count()
    }

    /// Render the diff table. Differing rows are marked with `>`.
    pub fn render(&self) -> String {
        let cells: Vec<(bool, usize, String, String)> = self
            .lines
            .iter()
            .map(|l| (l.differs(), l.index + 1, cell(&l.expected), cell(&l.actual)))
            .collect();

        let width = cells
            .iter()
            .map(|(_, _, expected, _)| expected.chars().count())
            .chain(std::iter::once("expected".len()))
            .max()
            .unwrap_or(0);

        let mut out = format!("  {:>4} | {:<width$} | actual\n", "line", "expected");
        for (differs, number, expected, actual) in cells {
            let marker = if differs { '>' } else { ' ' };
            out.push_str(&format!("{marker} {number:>4} | {expected:<width$} | {actual}\n"));
        }
        out
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
