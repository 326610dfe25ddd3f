//! Grammar-driven dispatcher: one entry point per lexical mode.
//!
//! Each entry point fetches a single lookahead terminal with its mode's
//! token set, then either shifts it or descends into one of the name
//! nonterminals, reporting everything to an [`EventHandler`]. Only enough
//! grammar is kept to know which terminals are admissible where; no tree is
//! built.

use log::trace;

use crate::event_sink::EventHandler;
use crate::grammar::{t, TokenId, TokenSet};
use crate::keywords;
use crate::lexer_types::{Expected, ParseError};
use crate::mode::Mode;
use crate::scanner::Scanner;
use crate::tables::token_name;

pub struct Dispatcher<'a, H: EventHandler> {
    scanner: Scanner<'a>,
    handler: H,
    /// Current lookahead, if fetched.
    l1: Option<TokenId>,
    b1: usize,
    e1: usize,
    /// End of the last shifted terminal.
    e0: usize,
}

impl<'a, H: EventHandler> Dispatcher<'a, H> {
    pub fn new(input: &'a [u16], handler: H) -> Self {
        Self {
            scanner: Scanner::new(input),
            handler,
            l1: None,
            b1: 0,
            e1: 0,
            e0: 0,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Offset just past the last shifted terminal.
    pub fn position(&self) -> usize {
        self.e0
    }

    /// Consume one terminal in `mode`.
    pub fn parse(&mut self, mode: Mode) -> Result<(), ParseError> {
        match mode {
            Mode::Start => self.parse_start(),
            Mode::EqName => self.parse_eq_name_mode(),
            Mode::Prefix => self.parse_prefix(),
            Mode::StartTag => self.parse_start_tag(),
            Mode::TagContent => self.parse_tag_content(),
            Mode::AposAttr => self.parse_apos_attr(),
            Mode::QuotAttr => self.parse_quot_attr(),
            Mode::CData => self.parse_cdata(),
            Mode::XmlComment => self.parse_xml_comment(),
            Mode::Pi => self.parse_pi(),
            Mode::Pragma => self.parse_pragma(),
            Mode::Comment => self.parse_comment(),
            Mode::CommentDoc => self.parse_comment_doc(),
            Mode::QuotString => self.parse_quot_string(),
            Mode::AposString => self.parse_apos_string(),
        }
    }

    /* -------------------------------------------------------------- */
    /*  Mode entry points                                             */
    /* -------------------------------------------------------------- */

    fn parse_start(&mut self) -> Result<(), ParseError> {
        self.handler.start_nonterminal("start", self.e0);
        self.lookahead(Mode::Start)?;
        match self.l1 {
            Some(t::EQ_NAME) => {
                if self.followed_by_call() {
                    self.parse_function_name()?;
                } else {
                    self.parse_eq_name()?;
                }
            }
            Some(
                id @ (t::EOF
                | t::INTEGER_LITERAL
                | t::DECIMAL_LITERAL
                | t::DOUBLE_LITERAL
                | t::VARIABLE
                | t::ANNOTATION
                | t::ATTR_TEST
                | t::MODULE_DECL
                | t::OPTION_DECL
                | t::TAG
                | t::OPERATOR
                | t::QUOT
                | t::APOS
                | t::LPAREN
                | t::RPAREN
                | t::LBRACE
                | t::RBRACE
                | t::LBRACKET
                | t::RBRACKET
                | t::COMMA
                | t::SEMICOLON
                | t::DOT
                | t::DOT_DOT
                | t::COLON
                | t::COLON_COLON
                | t::HASH
                | t::PRAGMA_OPEN
                | t::COMMENT_OPEN
                | t::DOC_COMMENT_OPEN
                | t::XML_COMMENT_OPEN
                | t::PI_OPEN
                | t::CDATA_OPEN),
            ) => self.shift(id)?,
            _ => return Err(self.unexpected(TokenSet::Start)),
        }
        self.handler.end_nonterminal("start", self.e0);
        Ok(())
    }

    fn parse_eq_name_mode(&mut self) -> Result<(), ParseError> {
        self.handler.start_nonterminal("_EQName", self.e0);
        self.lookahead(Mode::EqName)?;
        match self.l1 {
            Some(t::EQ_NAME) => self.parse_eq_name()?,
            Some(t::EOF) => self.shift(t::EOF)?,
            _ => return Err(self.unexpected(TokenSet::EqName)),
        }
        self.handler.end_nonterminal("_EQName", self.e0);
        Ok(())
    }

    fn parse_prefix(&mut self) -> Result<(), ParseError> {
        self.handler.start_nonterminal("Prefix", self.e0);
        self.lookahead(Mode::Prefix)?;
        match self.l1 {
            Some(t::NC_NAME) => self.parse_nc_name()?,
            Some(t::EOF) => self.shift(t::EOF)?,
            _ => return Err(self.unexpected(TokenSet::Prefix)),
        }
        self.handler.end_nonterminal("Prefix", self.e0);
        Ok(())
    }

    fn parse_start_tag(&mut self) -> Result<(), ParseError> {
        self.handler.start_nonterminal("StartTag", self.e0);
        self.lookahead(Mode::StartTag)?;
        match self.l1 {
            Some(
                id @ (t::EOF
                | t::QNAME
                | t::EQUALS
                | t::QUOT
                | t::APOS
                | t::TAG_CLOSE
                | t::EMPTY_TAG_CLOSE),
            ) => self.shift(id)?,
            _ => return Err(self.unexpected(TokenSet::StartTag)),
        }
        self.handler.end_nonterminal("StartTag", self.e0);
        Ok(())
    }

    fn parse_tag_content(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::TagContent)
    }

    fn parse_apos_attr(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::AposAttr)
    }

    fn parse_quot_attr(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::QuotAttr)
    }

    fn parse_cdata(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::CData)
    }

    fn parse_xml_comment(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::XmlComment)
    }

    fn parse_pi(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::Pi)
    }

    fn parse_pragma(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::Pragma)
    }

    fn parse_comment(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::Comment)
    }

    fn parse_comment_doc(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::CommentDoc)
    }

    fn parse_quot_string(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::QuotString)
    }

    fn parse_apos_string(&mut self) -> Result<(), ParseError> {
        self.simple(Mode::AposString)
    }

    /// A mode whose every admissible terminal is shifted as is.
    fn simple(&mut self, mode: Mode) -> Result<(), ParseError> {
        let name = mode.name();
        let set = mode.token_set();
        self.handler.start_nonterminal(name, self.e0);
        self.lookahead(mode)?;
        match self.l1 {
            Some(id) if set.members().contains(&id) => self.shift(id)?,
            _ => return Err(self.unexpected(set)),
        }
        self.handler.end_nonterminal(name, self.e0);
        Ok(())
    }

    /* -------------------------------------------------------------- */
    /*  Name nonterminals                                             */
    /* -------------------------------------------------------------- */

    fn parse_eq_name(&mut self) -> Result<(), ParseError> {
        self.handler.start_nonterminal("EQName", self.e0);
        self.promote_keyword(|_| true);
        let id = self.current()?;
        self.shift(id)?;
        self.handler.end_nonterminal("EQName", self.e0);
        Ok(())
    }

    fn parse_function_name(&mut self) -> Result<(), ParseError> {
        self.handler.start_nonterminal("FunctionName", self.e0);
        self.promote_keyword(keywords::is_reserved_function_name);
        let id = self.current()?;
        self.shift(id)?;
        self.handler.end_nonterminal("FunctionName", self.e0);
        Ok(())
    }

    fn parse_nc_name(&mut self) -> Result<(), ParseError> {
        self.handler.start_nonterminal("NCName", self.e0);
        self.promote_keyword(|_| true);
        let id = self.current()?;
        self.shift(id)?;
        self.handler.end_nonterminal("NCName", self.e0);
        Ok(())
    }

    /// Turn a name lookahead into its keyword terminal when `allow` says so.
    fn promote_keyword(&mut self, allow: impl Fn(&str) -> bool) {
        let text = String::from_utf16_lossy(&self.scanner.input()[self.b1..self.e1]);
        if let Some(id) = keywords::lookup(&text) {
            if allow(&text) {
                self.l1 = Some(id);
            }
        }
    }

    /// Next non-blank character opens an argument list (not a comment or
    /// pragma).
    fn followed_by_call(&self) -> bool {
        let input = self.scanner.input();
        let mut rest = input[self.e1.min(input.len())..]
            .iter()
            .copied()
            .skip_while(|&u| matches!(u, 0x20 | 0x09 | 0x0a | 0x0d));
        if rest.next() != Some(u16::from(b'(')) {
            return false;
        }
        !matches!(rest.next(), Some(u) if u == u16::from(b':') || u == u16::from(b'#'))
    }

    /* -------------------------------------------------------------- */
    /*  Lookahead and shifting                                        */
    /* -------------------------------------------------------------- */

    /// Fetch the lookahead for `mode`, skipping whitespace where it is
    /// insignificant.
    fn lookahead(&mut self, mode: Mode) -> Result<(), ParseError> {
        if mode.skips_whitespace() {
            self.lookahead1w(mode.token_set())
        } else {
            self.lookahead1(mode.token_set())
        }
    }

    fn lookahead1(&mut self, set: TokenSet) -> Result<(), ParseError> {
        if self.l1.is_none() {
            let token = self.scanner.match_token(set)?;
            self.l1 = Some(token);
            self.b1 = self.scanner.begin();
            self.e1 = self.scanner.end();
        }
        Ok(())
    }

    /// Like [`Self::lookahead1`], skipping whitespace terminals.
    fn lookahead1w(&mut self, set: TokenSet) -> Result<(), ParseError> {
        if self.l1.is_none() {
            let mut token = self.scanner.match_token(set)?;
            while token == t::S {
                token = self.scanner.match_token(set)?;
            }
            self.l1 = Some(token);
            self.b1 = self.scanner.begin();
            self.e1 = self.scanner.end();
        }
        Ok(())
    }

    fn current(&self) -> Result<TokenId, ParseError> {
        self.l1.ok_or(ParseError {
            begin: self.b1,
            end: self.e1,
            state: 0,
            offending: None,
            expected: Expected::Token(t::EQ_NAME),
        })
    }

    fn shift(&mut self, id: TokenId) -> Result<(), ParseError> {
        if self.l1 != Some(id) {
            return Err(ParseError {
                begin: self.b1,
                end: self.e1,
                state: 0,
                offending: self.l1,
                expected: Expected::Token(id),
            });
        }
        if self.e0 < self.b1 {
            self.handler.whitespace(self.e0, self.b1);
        }
        trace!("shift {} at {}..{}", token_name(id), self.b1, self.e1);
        self.handler.terminal(token_name(id), self.b1, self.e1);
        self.e0 = self.e1;
        self.l1 = None;
        Ok(())
    }

    fn unexpected(&self, set: TokenSet) -> ParseError {
        ParseError {
            begin: self.b1,
            end: self.e1,
            state: 0,
            offending: self.l1,
            expected: Expected::Set(set),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sink::TokenCollector;

    /// Records every event, nonterminals included.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl EventHandler for Recorder {
        fn reset(&mut self, _line: &str) {
            self.events.clear();
        }

        fn start_nonterminal(&mut self, name: &'static str, begin: usize) {
            self.events.push(format!("<{}@{}", name, begin));
        }

        fn end_nonterminal(&mut self, name: &'static str, end: usize) {
            self.events.push(format!(">{}@{}", name, end));
        }

        fn terminal(&mut self, name: &'static str, begin: usize, end: usize) {
            self.events.push(format!("{} {}..{}", name, begin, end));
        }

        fn whitespace(&mut self, begin: usize, end: usize) {
            self.events.push(format!("ws {}..{}", begin, end));
        }
    }

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    /// Terminal names for `text` parsed wholly in `mode`, up to EOF.
    fn names(text: &str, mode: Mode) -> Vec<&'static str> {
        let input = units(text);
        let mut d = Dispatcher::new(&input, TokenCollector::new(text));
        loop {
            d.parse(mode).unwrap();
            let tokens = d.handler().tokens();
            if tokens.last().map(|t| t.name) == Some("EOF") {
                return tokens.iter().map(|t| t.name).collect();
            }
        }
    }

    #[test]
    fn emits_nested_events_and_whitespace() {
        let input = units("  x");
        let mut d = Dispatcher::new(&input, Recorder::default());
        d.parse(Mode::Start).unwrap();
        assert_eq!(
            d.handler().events,
            vec!["<start@0", "<EQName@0", "ws 0..2", "EQName 2..3", ">EQName@3", ">start@3"]
        );
        assert_eq!(d.position(), 3);
    }

    #[test]
    fn whitespace_is_skipped_only_where_the_mode_allows() {
        let input = units("  x");
        for mode in Mode::ALL {
            let mut d = Dispatcher::new(&input, Recorder::default());
            match d.parse(mode) {
                Ok(()) => {}
                // string modes need their closing quote ahead
                Err(e) if e.is_lexical() && !mode.skips_whitespace() => continue,
                Err(e) => panic!("{}: {}", mode, e),
            }
            let events = &d.handler().events;
            let first = events
                .iter()
                .find(|e| !e.starts_with('<'))
                .unwrap();
            if mode.skips_whitespace() {
                assert_eq!(first, "ws 0..2", "{}", mode);
            } else {
                assert!(events.iter().all(|e| !e.starts_with("ws ")), "{}", mode);
                assert!(first.contains(" 0.."), "{}: {:?}", mode, events);
            }
        }
    }

    #[test]
    fn keywords_are_promoted() {
        assert_eq!(
            names("for $x in 1 return $x", Mode::Start),
            vec![
                "'for'",
                "WS",
                "Variable",
                "WS",
                "'in'",
                "WS",
                "IntegerLiteral",
                "WS",
                "'return'",
                "WS",
                "Variable",
                "EOF"
            ]
        );
    }

    #[test]
    fn function_names_only_promote_reserved_words() {
        assert_eq!(names("count(", Mode::Start), vec!["EQName", "'('", "EOF"]);
        assert_eq!(names("if (", Mode::Start), vec!["'if'", "WS", "'('", "EOF"]);
        assert_eq!(names("foo", Mode::Start), vec!["EQName", "EOF"]);
        // a comment after the name is not a call
        assert_eq!(names("count (:x", Mode::Start)[0], "'count'");
    }

    #[test]
    fn prefix_and_eqname_modes() {
        assert_eq!(names(" ns", Mode::Prefix), vec!["WS", "NCName", "EOF"]);
        let input = units("fn:x");
        let mut d = Dispatcher::new(&input, TokenCollector::new("fn:x"));
        d.parse(Mode::EqName).unwrap();
        assert_eq!(d.handler().tokens()[0].name, "EQName");
        assert_eq!(d.handler().tokens()[0].value, "fn:x");
    }

    #[test]
    fn start_tag_terminals() {
        assert_eq!(
            names(" b='' />", Mode::StartTag),
            vec!["WS", "QName", "'='", "\"'\"", "\"'\"", "WS", "'/>'", "EOF"]
        );
    }

    #[test]
    fn lexical_failure_surfaces_unchanged() {
        let input = units("abc");
        let mut d = Dispatcher::new(&input, TokenCollector::new("abc"));
        let err = d.parse(Mode::AposString).unwrap_err();
        assert!(err.is_lexical());
        assert!(d.handler().tokens().is_empty());
    }

    #[test]
    fn shifting_the_wrong_terminal_is_a_dispatch_failure() {
        let input = units("x");
        let mut d = Dispatcher::new(&input, TokenCollector::new("x"));
        d.lookahead1w(TokenSet::Start).unwrap();
        let err = d.shift(t::LPAREN).unwrap_err();
        assert_eq!(err.offending, Some(t::EQ_NAME));
        assert_eq!(err.expected, Expected::Token(t::LPAREN));
        assert_eq!(
            err.to_string(),
            "syntax error: found EQName while expecting ['('] at 0..1"
        );
    }
}
