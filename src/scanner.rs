//! Maximal-munch matcher over the packed transition tables.

use crate::char_class::{classify_at, is_low_surrogate};
use crate::grammar::{TokenId, TokenSet};
use crate::lexer_types::{Expected, ParseError};
use crate::tables::{self, STATE_MASK, TABLES};

/// Cursor over one UTF-16 line.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a [u16],
    begin: usize,
    end: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u16]) -> Self {
        Self {
            input,
            begin: 0,
            end: 0,
        }
    }

    pub fn input(&self) -> &'a [u16] {
        self.input
    }

    /// Start of the last match.
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// End of the last match; the next match starts here.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Match the longest terminal of `set` at the cursor and advance past it.
    pub fn match_token(&mut self, set: TokenSet) -> Result<TokenId, ParseError> {
        let tables = &*TABLES;
        let mut nonbmp = false;
        self.begin = self.end;
        let mut current = self.end;
        let mut result = tables.initial(set);
        let mut state = 0;

        let mut code = result & STATE_MASK;
        while code != 0 {
            let c = classify_at(self.input, current);
            current += c.width;
            nonbmp |= c.nonbmp;

            state = code;
            code = tables.transition(code, c.class);
            if code > STATE_MASK {
                result = code;
                code &= STATE_MASK;
                self.end = current;
            }
        }

        let Some((token, backoff)) = tables::decode(result) else {
            let mut end = current - 1;
            if is_low_surrogate(self.input.get(end)) {
                end -= 1;
            }
            return Err(ParseError {
                begin: self.begin,
                end,
                state,
                offending: None,
                expected: Expected::Set(set),
            });
        };

        if nonbmp {
            for _ in 0..backoff {
                self.end -= 1;
                if is_low_surrogate(self.input.get(self.end)) {
                    self.end -= 1;
                }
            }
        } else {
            self.end -= backoff as usize;
        }
        Ok(token)
    }
}
