//! Packed scanner tables and all of the arithmetic that reads them.
//!
//! The tables are produced once per process by [`crate::table_gen`] from the
//! lexical grammar. Their layout:
//!
//! * `INITIAL[set]` – packed entry for the start state of a token set.
//! * `TRANSITION` – two-level block table indexed by
//!   `(class << 12) + state - 1`.
//! * `EXPECTED` – four-level block table of 32-bit token masks indexed by
//!   `window * STATES + state - 1`.
//!
//! A packed entry is `next | (token + 1) << 12 | backoff << 21`; entries
//! above 4095 accept.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::grammar::{TokenId, TokenSet, TERMINALS};
use crate::keywords::KEYWORDS;
use crate::table_gen;

pub const STATE_BITS: u32 = 12;
pub const STATE_MASK: u32 = (1 << STATE_BITS) - 1;
pub const TOKEN_BITS: u32 = 9;
pub const TOKEN_MASK: u32 = (1 << TOKEN_BITS) - 1;

pub(crate) const TRANSITION_LEVELS: [u32; 1] = [4];
pub(crate) const EXPECTED_LEVELS: [u32; 3] = [2, 2, 2];

#[derive(Debug)]
pub struct Tables {
    pub(crate) initial: Vec<u32>,
    pub(crate) transition: Vec<u32>,
    pub(crate) expected: Vec<u32>,
    /// Number of automaton states (ids run 1..=states).
    pub(crate) states: usize,
}

pub static TABLES: Lazy<Tables> = Lazy::new(table_gen::generate);

/// Display names of all terminals, keywords included.
pub static TOKEN: Lazy<Vec<String>> = Lazy::new(|| {
    TERMINALS
        .iter()
        .map(|name| name.to_string())
        .chain(KEYWORDS.iter().map(|kw| format!("'{}'", kw)))
        .collect()
});

pub fn token_name(id: TokenId) -> &'static str {
    TOKEN.get(id).map(String::as_str).unwrap_or("(unknown)")
}

/// Pack `next`, an accepted token and its backoff into one entry.
pub(crate) fn encode(next: u32, accept: Option<(TokenId, u32)>) -> u32 {
    debug_assert!(next <= STATE_MASK);
    match accept {
        Some((token, backoff)) => {
            next | ((token as u32 + 1) << STATE_BITS) | (backoff << (STATE_BITS + TOKEN_BITS))
        }
        None => next,
    }
}

/// Split the last accepting entry of a match into `(token, backoff)`;
/// `None` when nothing was accepted.
pub fn decode(result: u32) -> Option<(TokenId, u32)> {
    let result = result >> STATE_BITS;
    if result == 0 {
        return None;
    }
    Some((((result & TOKEN_MASK) - 1) as usize, result >> TOKEN_BITS))
}

impl Tables {
    pub fn initial(&self, set: TokenSet) -> u32 {
        self.initial[set.id()]
    }

    pub fn transition(&self, state: u32, class: u8) -> u32 {
        let i0 = ((class as u32) << STATE_BITS) + state - 1;
        self.transition[((i0 & 15) + self.transition[(i0 >> 4) as usize]) as usize]
    }

    fn expected_mask(&self, window: usize, state: u32) -> u32 {
        let i0 = (window * self.states) as u32 + state - 1;
        let i1 = i0 >> 2;
        let i2 = i1 >> 2;
        let e = &self.expected;
        e[((i0 & 3) + e[((i1 & 3) + e[((i2 & 3) + e[(i2 >> 2) as usize]) as usize]) as usize])
            as usize]
    }

    /// Terminals that can still be accepted from automaton `state`.
    pub fn expected_from_state(&self, state: u32) -> Vec<&'static str> {
        let mut names = Vec::new();
        if state == 0 || state as usize > self.states {
            return names;
        }
        for window in 0..TERMINALS.len().div_ceil(32) {
            let mut mask = self.expected_mask(window, state);
            let mut j = window * 32;
            while mask != 0 {
                if mask & 1 != 0 {
                    names.push(token_name(j));
                }
                mask >>= 1;
                j += 1;
            }
        }
        names
    }
}

/// Terminals admissible at the start of a token set.
pub fn expected_token_names(set: TokenSet) -> Vec<&'static str> {
    let tables = &*TABLES;
    tables.expected_from_state(tables.initial(set) & STATE_MASK)
}

/* ------------------------------------------------------------------ */
/*  Block packing                                                     */
/* ------------------------------------------------------------------ */

/// Compress `dense` into a trie of deduplicated blocks.
///
/// `levels` gives the bit width of each level from the leaves upwards; the
/// remaining high bits index the root, which occupies the front of the
/// output. Reading index `x` with `levels = [a, b]` is
/// `t[(x & ma) + t[((x >> a) & mb) + t[x >> (a + b)]]]`.
pub(crate) fn pack(dense: &[u32], levels: &[u32]) -> Vec<u32> {
    let span = 1usize << levels.iter().sum::<u32>();
    let roots = dense.len().div_ceil(span).max(1);

    let mut out = vec![0u32; roots];
    let mut level = dense.to_vec();
    level.resize(roots * span, 0);

    for &bits in levels {
        let mut seen: HashMap<Vec<u32>, u32> = HashMap::new();
        let mut offsets = Vec::with_capacity(level.len() >> bits);
        for block in level.chunks(1 << bits) {
            let offset = *seen.entry(block.to_vec()).or_insert_with(|| {
                let offset = out.len() as u32;
                out.extend_from_slice(block);
                offset
            });
            offsets.push(offset);
        }
        level = offsets;
    }
    out[..roots].copy_from_slice(&level);
    out
}
