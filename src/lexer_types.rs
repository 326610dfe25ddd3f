use std::fmt;

use crate::grammar::{TokenId, TokenSet};
use crate::tables::{self, token_name, TABLES};

/// What the scanner or dispatcher was prepared to accept at a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Any terminal of a token set.
    Set(TokenSet),
    /// Exactly one terminal.
    Token(TokenId),
}

/// A lexical or dispatch failure within one line.
///
/// Spans are in UTF-16 code units of the line being tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub begin: usize,
    pub end: usize,
    /// Automaton state at the failure; 0 for dispatch failures.
    pub state: u32,
    /// The terminal found, or `None` when no terminal could be recognised.
    pub offending: Option<TokenId>,
    pub expected: Expected,
}

impl ParseError {
    pub fn is_lexical(&self) -> bool {
        self.offending.is_none()
    }

    pub fn expected_names(&self) -> Vec<&'static str> {
        match self.expected {
            Expected::Token(id) => vec![token_name(id)],
            Expected::Set(_) if self.state != 0 => TABLES.expected_from_state(self.state),
            Expected::Set(set) => tables::expected_token_names(set),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = self.expected_names().join(", ");
        match self.offending {
            None => write!(
                f,
                "lexical analysis failed while expecting [{}] at {}..{}",
                expected, self.begin, self.end
            ),
            Some(found) => write!(
                f,
                "syntax error: found {} while expecting [{}] at {}..{}",
                token_name(found),
                expected,
                self.begin,
                self.end
            ),
        }
    }
}

impl std::error::Error for ParseError {}
