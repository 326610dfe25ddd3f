//! Lexical modes and the persistent stack that carries them across lines.

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::grammar::TokenSet;

/// A lexical context; the top of the stack picks the dispatcher entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "_EQName")]
    EqName,
    Prefix,
    StartTag,
    TagContent,
    AposAttr,
    QuotAttr,
    #[serde(rename = "CData")]
    CData,
    #[serde(rename = "XMLComment")]
    XmlComment,
    #[serde(rename = "PI")]
    Pi,
    Pragma,
    Comment,
    CommentDoc,
    QuotString,
    AposString,
}

impl Mode {
    pub const ALL: [Mode; 15] = [
        Mode::Start,
        Mode::EqName,
        Mode::Prefix,
        Mode::StartTag,
        Mode::TagContent,
        Mode::AposAttr,
        Mode::QuotAttr,
        Mode::CData,
        Mode::XmlComment,
        Mode::Pi,
        Mode::Pragma,
        Mode::Comment,
        Mode::CommentDoc,
        Mode::QuotString,
        Mode::AposString,
    ];

    /// Name used in the serialized state.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Start => "start",
            Mode::EqName => "_EQName",
            Mode::Prefix => "Prefix",
            Mode::StartTag => "StartTag",
            Mode::TagContent => "TagContent",
            Mode::AposAttr => "AposAttr",
            Mode::QuotAttr => "QuotAttr",
            Mode::CData => "CData",
            Mode::XmlComment => "XMLComment",
            Mode::Pi => "PI",
            Mode::Pragma => "Pragma",
            Mode::Comment => "Comment",
            Mode::CommentDoc => "CommentDoc",
            Mode::QuotString => "QuotString",
            Mode::AposString => "AposString",
        }
    }

    pub fn token_set(self) -> TokenSet {
        match self {
            Mode::Start => TokenSet::Start,
            Mode::EqName => TokenSet::EqName,
            Mode::Prefix => TokenSet::Prefix,
            Mode::StartTag => TokenSet::StartTag,
            Mode::TagContent => TokenSet::TagContent,
            Mode::AposAttr => TokenSet::AposAttr,
            Mode::QuotAttr => TokenSet::QuotAttr,
            Mode::CData => TokenSet::CData,
            Mode::XmlComment => TokenSet::XmlComment,
            Mode::Pi => TokenSet::Pi,
            Mode::Pragma => TokenSet::Pragma,
            Mode::Comment => TokenSet::Comment,
            Mode::CommentDoc => TokenSet::CommentDoc,
            Mode::QuotString => TokenSet::QuotString,
            Mode::AposString => TokenSet::AposString,
        }
    }

    /// Modes whose lookahead skips whitespace.
    pub fn skips_whitespace(self) -> bool {
        matches!(
            self,
            Mode::Start | Mode::EqName | Mode::Prefix | Mode::StartTag
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lexical mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Nested lexical contexts, bottom first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeStack {
    modes: Vec<Mode>,
}

impl Default for ModeStack {
    fn default() -> Self {
        Self {
            modes: vec![Mode::Start],
        }
    }
}

impl ModeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a stack from a previous line's state. Absent, `"start"`,
    /// malformed and empty states all give `["start"]`.
    pub fn parse(state: Option<&str>) -> Self {
        let Some(state) = state else {
            return Self::default();
        };
        if state == Mode::Start.name() {
            return Self::default();
        }
        match serde_json::from_str::<Vec<Mode>>(state) {
            Ok(modes) if !modes.is_empty() => Self { modes },
            Ok(_) => {
                warn!("empty lexer state, starting over");
                Self::default()
            }
            Err(e) => {
                warn!("malformed lexer state {:?}: {}", state, e);
                Self::default()
            }
        }
    }

    /// JSON array of mode names.
    pub fn to_json(&self) -> String {
        let names: Vec<&str> = self.modes.iter().map(|m| m.name()).collect();
        serde_json::Value::from(names).to_string()
    }

    pub fn top(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Start)
    }

    pub fn depth(&self) -> usize {
        self.modes.len()
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn push(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    /// Pop the top mode; a single remaining mode stays.
    pub fn pop(&mut self) {
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    pub fn replace_top(&mut self, mode: Mode) {
        match self.modes.last_mut() {
            Some(top) => *top = mode,
            None => self.modes.push(mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_serde() {
        for mode in Mode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.name()));
            assert_eq!(mode.name().parse::<Mode>().unwrap(), mode);
            assert_eq!(mode.token_set(), TokenSet::ALL[mode.token_set().id()]);
        }
        assert!("Nope".parse::<Mode>().is_err());
    }

    #[test]
    fn parse_normalises_missing_and_bad_state() {
        let start = ModeStack::new();
        assert_eq!(ModeStack::parse(None), start);
        assert_eq!(ModeStack::parse(Some("start")), start);
        assert_eq!(ModeStack::parse(Some("[]")), start);
        assert_eq!(ModeStack::parse(Some("{oops")), start);
        assert_eq!(ModeStack::parse(Some("[\"Bogus\"]")), start);
        assert_eq!(ModeStack::parse(Some("")), start);
    }

    #[test]
    fn round_trips_through_json() {
        let mut stack = ModeStack::new();
        stack.push(Mode::TagContent);
        stack.push(Mode::Start);
        stack.push(Mode::XmlComment);
        let json = stack.to_json();
        assert_eq!(json, r#"["start","TagContent","start","XMLComment"]"#);
        assert_eq!(ModeStack::parse(Some(&json)), stack);
    }

    #[test]
    fn pop_never_empties() {
        let mut stack = ModeStack::new();
        stack.pop();
        stack.pop();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top(), Mode::Start);

        stack.push(Mode::StartTag);
        stack.replace_top(Mode::TagContent);
        assert_eq!(stack.modes(), &[Mode::Start, Mode::TagContent]);
    }
}
