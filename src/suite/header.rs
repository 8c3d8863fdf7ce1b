//! Tokenizer for test header lines: `[annotation ...] test <name>`

use std::collections::BTreeSet;

use super::Annotation;

pub const TEST_KEYWORD: &str = "test";

/// A parsed test header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub annotations: BTreeSet<Annotation>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// No `test` keyword on the line
    NotAHeader,
    /// A token before `test` outside the annotation vocabulary
    UnknownAnnotation(String),
    /// `test` with nothing after it
    MissingName,
}

/// Whitespace-separated tokens with their byte offsets.
fn tokens(line: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut rest = line;
    let mut offset = 0;
    std::iter::from_fn(move || {
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            return None;
        }
        let len = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let token = (offset, &trimmed[..len]);
        rest = &trimmed[len..];
        offset += len;
        Some(token)
    })
}

/// Parse a header line. Annotation order is insignificant.
pub fn parse_header(line: &str) -> Result<Header, HeaderError> {
    let line = line.trim_end_matches(['\n', '\r']);

    let mut prefix = Vec::new();
    let mut name_start = None;
    for (offset, token) in tokens(line) {
        if token == TEST_KEYWORD {
            name_start = Some(offset + token.len());
            break;
        }
        prefix.push(token);
    }

    let Some(name_start) = name_start else {
        return Err(HeaderError::NotAHeader);
    };

    let mut annotations = BTreeSet::new();
    for token in prefix {
        let annotation =
            Annotation::from_token(token).ok_or_else(|| HeaderError::UnknownAnnotation(token.to_string()))?;
        annotations.insert(annotation);
    }

    let name = line[name_start..].trim();
    if name.is_empty() {
        return Err(HeaderError::MissingName);
    }

    Ok(Header {
        annotations,
        name: name.to_string(),
    })
}
