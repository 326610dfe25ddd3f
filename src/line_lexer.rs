//! `line_lexer` – the per-line entry point editors call.
//
//  Threads the mode stack from one line to the next, drives the dispatcher
//  one terminal at a time for whatever mode is on top, maps terminals to
//  presentation categories and applies each rule's stack action. A line
//  the grammar cannot handle is never an error: its unscanned remainder
//  becomes one text token and the state starts over.

use log::{debug, trace};
use serde::Serialize;

use crate::dispatcher::Dispatcher;
use crate::event_sink::{RawToken, TokenCollector, WS};
use crate::mode::{Mode, ModeStack};
use crate::rules::{self, Action, TEXT};
use crate::semantic::{SemanticBatch, SemanticCache};

/// One presentation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Token {
    fn new(kind: &str, value: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.into(),
        }
    }

    pub fn len_utf16(&self) -> usize {
        self.value.encode_utf16().count()
    }
}

/// Tokens of one line plus the serialized stack for the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineTokens {
    pub tokens: Vec<Token>,
    pub state: String,
}

#[derive(Debug, Default)]
pub struct XQueryLexer {
    semantic: SemanticCache,
}

impl XQueryLexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize `line` starting from `state` (the previous line's
    /// `LineTokens::state`, or `None` for the first line).
    pub fn tokenize_line(&mut self, line: &str, state: Option<&str>, row: usize) -> LineTokens {
        let mut stack = ModeStack::parse(state);
        let input: Vec<u16> = line.encode_utf16().collect();
        let mut tokens = Vec::new();

        if let Err(reason) = scan(&input, line, &mut stack, &mut tokens) {
            let consumed: usize = tokens.iter().map(Token::len_utf16).sum();
            debug!("row {}: {}; restarting at column {}", row, reason, consumed);
            if consumed < input.len() {
                tokens.push(Token::new(TEXT, String::from_utf16_lossy(&input[consumed..])));
            }
            stack = ModeStack::new();
        }

        self.semantic.retag(row, &input, &mut tokens);
        LineTokens {
            tokens,
            state: stack.to_json(),
        }
    }

    /// Cache analyzer tokens for a row. They describe the text the row had
    /// when it was last passed to [`Self::tokenize_line`]; returns `false`
    /// (and caches nothing) for a row never tokenized.
    pub fn apply_semantic_tokens(&mut self, batch: SemanticBatch) -> bool {
        self.semantic.store(batch)
    }

    /// [`Self::apply_semantic_tokens`] for a JSON batch
    /// (`{"row": n, "tokens": [{"sc", "ec", "type"}]}`).
    pub fn apply_semantic_json(&mut self, json: &str) -> Result<bool, serde_json::Error> {
        let batch: SemanticBatch = serde_json::from_str(json)?;
        Ok(self.apply_semantic_tokens(batch))
    }

    pub fn semantic_cache(&self) -> &SemanticCache {
        &self.semantic
    }
}

/// Run the dispatcher over `input` until end of line, appending to
/// `tokens`. `Err` carries why the line had to be abandoned.
fn scan(
    input: &[u16],
    line: &str,
    stack: &mut ModeStack,
    tokens: &mut Vec<Token>,
) -> Result<(), String> {
    let mut dispatcher = Dispatcher::new(input, TokenCollector::new(line));
    loop {
        let mode = stack.top();
        dispatcher.parse(mode).map_err(|e| e.to_string())?;

        let mut raw = dispatcher.handler_mut().take().into_iter().peekable();
        if let Some(ws) = raw.next_if(|t| t.name == WS) {
            tokens.push(Token::new(TEXT, ws.value));
        }
        for t in raw {
            if t.name == "EOF" {
                if t.begin < input.len() {
                    return Err(format!("non-XML character at column {}", t.begin));
                }
                return Ok(());
            }
            if t.begin == t.end {
                return Err(format!("empty {} at column {}", t.name, t.begin));
            }
            present(mode, t, stack, tokens);
        }
    }
}

fn present(mode: Mode, t: RawToken, stack: &mut ModeStack, tokens: &mut Vec<Token>) {
    let (kind, action) = match rules::find(mode, t.name) {
        Some(rule) => (rule.style.category(&t.value), rule.action),
        None => (TEXT, Action::None),
    };
    trace!("{} {} {:?} -> {}", mode, t.name, t.value, kind);
    tokens.push(Token::new(kind, t.value));
    match action {
        Action::None => {}
        Action::Push(m) => stack.push(m),
        Action::Pop => stack.pop(),
        Action::Replace(m) => stack.replace_top(m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::SemanticToken;
    use proptest::prelude::*;

    fn pairs(lt: &LineTokens) -> Vec<(&str, &str)> {
        lt.tokens
            .iter()
            .map(|t| (t.kind.as_str(), t.value.as_str()))
            .collect()
    }

    fn joined(lt: &LineTokens) -> String {
        lt.tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn arithmetic_line() {
        let mut lexer = XQueryLexer::new();
        let lt = lexer.tokenize_line("1 + 2", Some("start"), 0);
        assert_eq!(
            pairs(&lt),
            vec![
                ("constant", "1"),
                ("text", " "),
                ("keyword.operator", "+"),
                ("text", " "),
                ("constant", "2")
            ]
        );
        assert_eq!(lt.state, r#"["start"]"#);
    }

    #[test]
    fn comment_pushes_and_pops() {
        let mut lexer = XQueryLexer::new();
        let lt = lexer.tokenize_line("(: a comment :)", None, 0);
        assert_eq!(
            pairs(&lt),
            vec![
                ("comment", "(:"),
                ("comment", " a comment "),
                ("comment", ":)")
            ]
        );
        assert_eq!(lt.state, r#"["start"]"#);
    }

    #[test]
    fn start_tag_enters_tag_content() {
        let mut lexer = XQueryLexer::new();
        let lt = lexer.tokenize_line("<a b='1'>", Some(r#"["start"]"#), 0);
        assert_eq!(
            pairs(&lt),
            vec![
                ("meta.tag", "<a"),
                ("text", " "),
                ("entity.other.attribute-name", "b"),
                ("text", "="),
                ("string", "'"),
                ("string", "1"),
                ("string", "'"),
                ("meta.tag", ">")
            ]
        );
        assert_eq!(lt.state, r#"["start","TagContent"]"#);
    }

    #[test]
    fn unterminated_string_recovers() {
        let mut lexer = XQueryLexer::new();
        let lt = lexer.tokenize_line("'abc", Some("start"), 0);
        assert_eq!(pairs(&lt), vec![("string", "'"), ("text", "abc")]);
        assert_eq!(lt.state, r#"["start"]"#);
    }

    #[test]
    fn cached_semantic_tokens_override_categories() {
        let mut lexer = XQueryLexer::new();
        let line = "local:f($x)";
        let batch = r#"{"row":4,"tokens":[{"sc":0,"ec":7,"type":"entity.name.function"}]}"#;
        // nothing to attach to before the row is tokenized
        assert!(!lexer.apply_semantic_json(batch).unwrap());

        lexer.tokenize_line(line, None, 4);
        assert!(lexer.apply_semantic_json(batch).unwrap());
        let lt = lexer.tokenize_line(line, None, 4);
        assert_eq!(lt.tokens[0].kind, "entity.name.function");
        assert_eq!(lt.tokens[0].value, "local:f");
        assert_eq!(lt.tokens[2].kind, "variable");
        // untouched lines keep their cache
        assert!(lexer.semantic_cache().contains(4));
        assert!(lexer.apply_semantic_json("{").is_err());
    }

    #[test]
    fn semantic_batch_follows_edits_to_its_row() {
        let mut lexer = XQueryLexer::new();
        lexer.tokenize_line("$a + $b", None, 2);
        lexer.apply_semantic_tokens(SemanticBatch {
            row: 2,
            tokens: vec![
                SemanticToken {
                    sc: 0,
                    ec: 2,
                    kind: "variable.parameter".to_string(),
                },
                SemanticToken {
                    sc: 5,
                    ec: 7,
                    kind: "variable.other".to_string(),
                },
            ],
        });

        let edited = lexer.tokenize_line("$a + 10 + $b", None, 2);
        assert_eq!(
            pairs(&edited),
            vec![
                ("variable.parameter", "$a"),
                ("text", " "),
                ("keyword.operator", "+"),
                ("text", " "),
                ("constant", "10"),
                ("text", " "),
                ("keyword.operator", "+"),
                ("text", " "),
                ("variable.other", "$b")
            ]
        );
        assert!(!lexer.semantic_cache().contains(2));

        let again = lexer.tokenize_line("$a + 10 + $b", None, 2);
        assert_eq!(again.tokens[0].kind, "variable");
        assert_eq!(again.tokens[8].kind, "variable");
    }

    #[test]
    fn state_carries_across_lines() {
        let mut lexer = XQueryLexer::new();
        let first = lexer.tokenize_line("<p>{ (: x", None, 0);
        assert_eq!(first.state, r#"["start","TagContent","start","Comment"]"#);
        let second = lexer.tokenize_line("y :) }</p>", Some(&first.state), 1);
        assert_eq!(
            pairs(&second),
            vec![
                ("comment", "y "),
                ("comment", ":)"),
                ("text", " "),
                ("text", "}"),
                ("meta.tag", "</p>")
            ]
        );
        assert_eq!(second.state, r#"["start"]"#);
    }

    #[test]
    fn declarations_name_their_target() {
        let mut lexer = XQueryLexer::new();
        let lt = lexer.tokenize_line("module namespace ex = 'urn:x';", None, 0);
        assert_eq!(lt.tokens[0], Token::new("keyword", "module namespace"));
        assert_eq!(lt.tokens[2], Token::new("text", "ex"));
        assert_eq!(lt.state, r#"["start"]"#);

        let lt = lexer.tokenize_line("declare option output:method 'xml';", None, 1);
        assert_eq!(lt.tokens[0], Token::new("keyword", "declare option"));
        assert_eq!(lt.tokens[2], Token::new("text", "output:method"));
    }

    #[test]
    fn keywords_and_function_names() {
        let mut lexer = XQueryLexer::new();
        let lt = lexer.tokenize_line("if (fn:empty($s)) then 1 else ()", None, 0);
        let kinds: Vec<_> = lt
            .tokens
            .iter()
            .filter(|t| t.value.trim() != "")
            .map(|t| t.kind.as_str())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "keyword",
                "lparen",
                "support.function",
                "lparen",
                "variable",
                "rparen",
                "rparen",
                "keyword",
                "constant",
                "keyword",
                "lparen",
                "rparen"
            ]
        );
    }

    #[test]
    fn embedded_nul_restarts_the_line() {
        let mut lexer = XQueryLexer::new();
        let lt = lexer.tokenize_line("a\u{0}b", Some(r#"["start","Comment"]"#), 0);
        assert_eq!(joined(&lt), "a\u{0}b");
        assert_eq!(lt.state, r#"["start"]"#);
    }

    #[test]
    fn output_serializes_with_type_keys() {
        let mut lexer = XQueryLexer::new();
        let lt = lexer.tokenize_line("$x", None, 0);
        assert_eq!(
            serde_json::to_string(&lt).unwrap(),
            r#"{"tokens":[{"type":"variable","value":"$x"}],"state":"[\"start\"]"}"#
        );
    }

    fn any_state() -> impl Strategy<Value = Option<String>> {
        let modes = prop::collection::vec(prop::sample::select(Mode::ALL.to_vec()), 0..5);
        prop_oneof![
            Just(None),
            Just(Some("start".to_string())),
            ".{0,8}".prop_map(Some),
            modes.prop_map(|m| {
                let names: Vec<&str> = m.iter().map(|m| m.name()).collect();
                Some(serde_json::to_string(&names).unwrap())
            }),
        ]
    }

    proptest! {
        #[test]
        fn every_line_is_covered_exactly(line in any::<String>(), state in any_state()) {
            let mut lexer = XQueryLexer::new();
            let lt = lexer.tokenize_line(&line, state.as_deref(), 0);
            prop_assert_eq!(joined(&lt), line);
            prop_assert!(lt.tokens.iter().all(|t| !t.value.is_empty()));
        }

        #[test]
        fn xquery_like_lines_are_covered(
            line in "[a-z$<>/='\"(){}:;,.0-9 &#!?\\[\\]-]{0,40}",
            state in any_state(),
        ) {
            let mut lexer = XQueryLexer::new();
            let lt = lexer.tokenize_line(&line, state.as_deref(), 0);
            prop_assert_eq!(joined(&lt), line);
        }

        #[test]
        fn lines_with_control_characters_are_covered(
            line in "[\\x00-\\x1f\\x7f a-z$<>'\"(){}:&;]{0,60}",
            state in any_state(),
        ) {
            let mut lexer = XQueryLexer::new();
            let lt = lexer.tokenize_line(&line, state.as_deref(), 0);
            prop_assert_eq!(joined(&lt), line);
            prop_assert!(lt.tokens.iter().all(|t| !t.value.is_empty()));
        }

        #[test]
        fn state_is_a_nonempty_mode_list(line in "\\PC{0,40}", state in any_state()) {
            let mut lexer = XQueryLexer::new();
            let lt = lexer.tokenize_line(&line, state.as_deref(), 0);
            let modes: Vec<String> = serde_json::from_str(&lt.state).unwrap();
            prop_assert!(!modes.is_empty());
            prop_assert!(modes.iter().all(|m| m.parse::<Mode>().is_ok()));
        }

        #[test]
        fn failed_line_resets_to_start(bad in "[a-z]{0,6}", next in "[a-z$(){} 0-9'<>/]{0,30}") {
            let mut lexer = XQueryLexer::new();
            // an unterminated string always fails
            let line = format!("'{}", bad);
            let lt = lexer.tokenize_line(&line, None, 0);
            prop_assert_eq!(&lt.state, r#"["start"]"#);
            let after = lexer.tokenize_line(&next, Some(&lt.state), 1);
            let fresh = lexer.tokenize_line(&next, Some(r#"["start"]"#), 1);
            prop_assert_eq!(after, fresh);
        }
    }
}
