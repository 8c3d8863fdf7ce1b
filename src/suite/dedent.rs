//! Indentation rule for suite content lines
//!
//! Content lines must declare their indentation explicitly: one tab, four
//! spaces, or nothing at all for a bare blank line. Anything else is rejected
//! so the block-terminator scan never has to guess.

use thiserror::Error;

pub const TAB_INDENT: &str = "\t";
pub const SPACE_INDENT: &str = "    ";

/// A content line that is neither blank nor indented with a tab or four spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("content lines must be indented with one tab or four spaces")]
pub struct IndentError;

/// Strip the declared indentation prefix from `line`.
///
/// `line` includes its trailing terminator. A bare `\n` (or the empty string)
/// is returned unchanged.
pub fn dedent(line: &str) -> Result<&str, IndentError> {
    if line.is_empty() || line == "\n" {
        Ok(line)
    } else if let Some(rest) = line.strip_prefix(TAB_INDENT) {
        Ok(rest)
    } else if let Some(rest) = line.strip_prefix(SPACE_INDENT) {
        Ok(rest)
    } else {
        Err(IndentError)
    }
}
