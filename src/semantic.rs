//! Cached analyzer tokens and their merge into freshly scanned lines.
//
//  The analyzer runs out of band and reports tokens for a row as it was
//  when last tokenized. When that row is tokenized again, tokens whose column
//  window survived the edit (inside the unchanged prefix, or inside the
//  unchanged suffix after shifting by the length delta) take the analyzer's
//  category.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::line_lexer::Token;

/// One analyzer token; columns are UTF-16 offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticToken {
    pub sc: usize,
    pub ec: usize,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Analyzer output for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticBatch {
    pub row: usize,
    pub tokens: Vec<SemanticToken>,
}

#[derive(Debug, Clone)]
struct CachedRow {
    line: Vec<u16>,
    tokens: Vec<SemanticToken>,
}

impl CachedRow {
    fn kind_at(&self, sc: usize, ec: usize) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.sc == sc && t.ec == ec)
            .map(|t| t.kind.as_str())
    }
}

#[derive(Debug, Default)]
pub struct SemanticCache {
    /// Text of each row as it was last tokenized.
    seen: HashMap<usize, Vec<u16>>,
    rows: HashMap<usize, CachedRow>,
}

impl SemanticCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the text `row` was just tokenized with.
    pub fn observe(&mut self, row: usize, line: &[u16]) {
        let seen = self.seen.entry(row).or_default();
        if seen.as_slice() != line {
            seen.clear();
            seen.extend_from_slice(line);
        }
    }

    /// Attach `batch` to the text its row was last tokenized with.
    /// A batch for a row never tokenized is dropped.
    pub fn store(&mut self, batch: SemanticBatch) -> bool {
        let Some(line) = self.seen.get(&batch.row) else {
            debug!("row {} was never tokenized; dropping semantic batch", batch.row);
            return false;
        };
        self.rows.insert(
            batch.row,
            CachedRow {
                line: line.clone(),
                tokens: batch.tokens,
            },
        );
        true
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains_key(&row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.rows.clear();
    }

    /// Overwrite the category of every token of `line` whose window the
    /// cached analysis of `row` still covers, then record `line` as the
    /// row's current text. The cache entry survives only when `line` is
    /// unchanged.
    pub fn retag(&mut self, row: usize, line: &[u16], tokens: &mut [Token]) {
        self.merge(row, line, tokens);
        self.observe(row, line);
    }

    fn merge(&mut self, row: usize, line: &[u16], tokens: &mut [Token]) {
        let Some(cached) = self.rows.get(&row) else {
            return;
        };

        if cached.line == line {
            let mut sc = 0;
            for token in tokens.iter_mut() {
                let ec = sc + token.len_utf16();
                if let Some(kind) = cached.kind_at(sc, ec) {
                    token.kind = kind.to_string();
                }
                sc = ec;
            }
            return;
        }

        let old = &cached.line;
        let prefix = old.iter().zip(line).take_while(|(a, b)| a == b).count();
        let max_suffix = old.len().min(line.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(line.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        let suffix_start = line.len() - suffix;

        let mut retagged = 0;
        let mut sc = 0;
        for token in tokens.iter_mut() {
            let ec = sc + token.len_utf16();
            let kind = if ec <= prefix {
                cached.kind_at(sc, ec)
            } else if sc >= suffix_start {
                // same text, shifted by the length delta
                let sc_old = sc + old.len() - line.len();
                let ec_old = ec + old.len() - line.len();
                cached.kind_at(sc_old, ec_old)
            } else {
                None
            };
            if let Some(kind) = kind {
                token.kind = kind.to_string();
                retagged += 1;
            }
            sc = ec;
        }
        debug!(
            "row {} changed; kept {} semantic tokens (prefix {}, suffix {})",
            row, retagged, prefix, suffix
        );
        self.rows.remove(&row);
    }
}
