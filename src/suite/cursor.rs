//! Bounds-checked cursor over the lines of a suite file

/// A peekable cursor over lines that keep their `\n` terminator.
///
/// End of input is reported as `None`, so callers can tell "block ended" apart
/// from "file ended" without relying on a panicking iterator.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    /// Split `source` into lines. The source is expected to use `\n` terminators.
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.split_inclusive('\n').collect(),
            pos: 0,
        }
    }

    /// The next line without consuming it.
    pub fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// Consume and return the next line.
    pub fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    /// 1-based number of the line most recently returned by [`next_line`](Self::next_line).
    ///
    /// Zero before anything was consumed.
    pub fn line_number(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }
}
