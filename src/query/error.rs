//! Error types for path query parsing.

use std::fmt;

/// Errors that can occur while parsing a path query.
///
/// Every positional variant carries the character index (not byte offset)
/// of the offending character in the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// The query string was empty.
    EmptyQuery,
    /// A `]` with no matching `[`.
    UnmatchedClose { position: usize },
    /// A `[` that is never closed.
    Unterminated { position: usize },
    /// A `[]` group with nothing inside.
    EmptyGroup { position: usize },
    /// An ordinary character directly after a `]`.
    MissingDelimiter { position: usize, found: char },
}

impl SyntaxError {
    /// Returns the character index the error refers to, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            SyntaxError::EmptyQuery => None,
            SyntaxError::UnmatchedClose { position }
            | SyntaxError::Unterminated { position }
            | SyntaxError::EmptyGroup { position }
            | SyntaxError::MissingDelimiter { position, .. } => Some(*position),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::EmptyQuery => write!(f, "Empty path query"),
            SyntaxError::UnmatchedClose { position } => {
                write!(f, "Closing brace without opening brace (<path>:{})", position)
            }
            SyntaxError::Unterminated { position } => {
                write!(f, "Unterminated brace expression (<path>:{})", position)
            }
            SyntaxError::EmptyGroup { position } => {
                write!(f, "Empty brace expression (<path>:{})", position)
            }
            SyntaxError::MissingDelimiter { position, found } => write!(
                f,
                "Unexpected '{}' after closing brace, expected '.', '|' or ']' (<path>:{})",
                found, position
            ),
        }
    }
}

impl std::error::Error for SyntaxError {}
