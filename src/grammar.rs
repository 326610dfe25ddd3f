//! Lexical grammar of XQuery with embedded XML, as input for the table
//! generator.
//!
//! Every terminal the automaton can recognise is declared here once, as a
//! pattern over character classes with an optional fixed-length trailing
//! context. Token sets list which terminals are admissible in each lexical
//! mode. Declaration order is priority: when two terminals match the same
//! longest text, the lower id wins.

use crate::char_class::{self, ascii, CLASS_COUNT};

pub type TokenId = usize;

/// Terminal ids, in priority order. Keyword terminals follow [`TERMINALS`]
/// and are produced by the dispatcher, never by the automaton.
pub mod t {
    use super::TokenId;

    pub const EOF: TokenId = 0;
    pub const S: TokenId = 1;
    pub const INTEGER_LITERAL: TokenId = 2;
    pub const DECIMAL_LITERAL: TokenId = 3;
    pub const DOUBLE_LITERAL: TokenId = 4;
    pub const VARIABLE: TokenId = 5;
    pub const ANNOTATION: TokenId = 6;
    pub const ATTR_TEST: TokenId = 7;
    pub const MODULE_DECL: TokenId = 8;
    pub const OPTION_DECL: TokenId = 9;
    pub const EQ_NAME: TokenId = 10;
    pub const NC_NAME: TokenId = 11;
    pub const QNAME: TokenId = 12;
    pub const TAG: TokenId = 13;
    pub const END_TAG: TokenId = 14;
    pub const OPERATOR: TokenId = 15;
    pub const PREDEFINED_ENTITY_REF: TokenId = 16;
    pub const CHAR_REF: TokenId = 17;
    pub const ELEMENT_CONTENT_CHAR: TokenId = 18;
    pub const QUOT_ATTR_CONTENT_CHAR: TokenId = 19;
    pub const APOS_ATTR_CONTENT_CHAR: TokenId = 20;
    pub const QUOT_CHAR: TokenId = 21;
    pub const APOS_CHAR: TokenId = 22;
    pub const COMMENT_CONTENTS: TokenId = 23;
    pub const DOC_COMMENT_CONTENTS: TokenId = 24;
    pub const DOC_TAG: TokenId = 25;
    pub const PRAGMA_CONTENTS: TokenId = 26;
    pub const DIR_COMMENT_CONTENTS: TokenId = 27;
    pub const DIR_PI_CONTENTS: TokenId = 28;
    pub const CDATA_SECTION_CONTENTS: TokenId = 29;
    pub const ESCAPE_QUOT: TokenId = 30;
    pub const ESCAPE_APOS: TokenId = 31;
    pub const QUOT: TokenId = 32;
    pub const APOS: TokenId = 33;
    pub const LPAREN: TokenId = 34;
    pub const RPAREN: TokenId = 35;
    pub const LBRACE: TokenId = 36;
    pub const RBRACE: TokenId = 37;
    pub const LBRACKET: TokenId = 38;
    pub const RBRACKET: TokenId = 39;
    pub const COMMA: TokenId = 40;
    pub const SEMICOLON: TokenId = 41;
    pub const DOT: TokenId = 42;
    pub const DOT_DOT: TokenId = 43;
    pub const COLON: TokenId = 44;
    pub const COLON_COLON: TokenId = 45;
    pub const HASH: TokenId = 46;
    pub const PRAGMA_OPEN: TokenId = 47;
    pub const PRAGMA_CLOSE: TokenId = 48;
    pub const COMMENT_OPEN: TokenId = 49;
    pub const DOC_COMMENT_OPEN: TokenId = 50;
    pub const COMMENT_CLOSE: TokenId = 51;
    pub const XML_COMMENT_OPEN: TokenId = 52;
    pub const XML_COMMENT_CLOSE: TokenId = 53;
    pub const PI_OPEN: TokenId = 54;
    pub const QUESTION: TokenId = 55;
    pub const PI_CLOSE: TokenId = 56;
    pub const CDATA_OPEN: TokenId = 57;
    pub const CDATA_CLOSE: TokenId = 58;
    pub const TAG_CLOSE: TokenId = 59;
    pub const EMPTY_TAG_CLOSE: TokenId = 60;
    pub const EQUALS: TokenId = 61;
    pub const DOUBLE_LBRACE: TokenId = 62;
    pub const DOUBLE_RBRACE: TokenId = 63;
}

/// Display names of the automaton's terminals, indexed by id.
pub const TERMINALS: [&str; 64] = [
    "EOF",
    "S",
    "IntegerLiteral",
    "DecimalLiteral",
    "DoubleLiteral",
    "Variable",
    "Annotation",
    "AttrTest",
    "ModuleDecl",
    "OptionDecl",
    "EQName",
    "NCName",
    "QName",
    "Tag",
    "EndTag",
    "Operator",
    "PredefinedEntityRef",
    "CharRef",
    "ElementContentChar",
    "QuotAttrContentChar",
    "AposAttrContentChar",
    "QuotChar",
    "AposChar",
    "CommentContents",
    "DocCommentContents",
    "DocTag",
    "PragmaContents",
    "DirCommentContents",
    "DirPIContents",
    "CDataSectionContents",
    "EscapeQuot",
    "EscapeApos",
    "'\"'",
    "\"'\"",
    "'('",
    "')'",
    "'{'",
    "'}'",
    "'['",
    "']'",
    "','",
    "';'",
    "'.'",
    "'..'",
    "':'",
    "'::'",
    "'#'",
    "'(#'",
    "'#)'",
    "'(:'",
    "'(:~'",
    "':)'",
    "'<!--'",
    "'-->'",
    "'<?'",
    "'?'",
    "'?>'",
    "'<![CDATA['",
    "']]>'",
    "'>'",
    "'/>'",
    "'='",
    "'{{'",
    "'}}'",
];

/* ------------------------------------------------------------------ */
/*  Character class sets                                              */
/* ------------------------------------------------------------------ */

/// A set of character classes; the automaton's alphabet fits in 128 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassSet(u128);

const _: () = assert!(CLASS_COUNT <= 128);

impl ClassSet {
    pub const EMPTY: ClassSet = ClassSet(0);

    pub const fn class(c: u8) -> Self {
        ClassSet(1 << c)
    }

    /// The classes of the given ASCII characters.
    pub fn chars(s: &str) -> Self {
        s.bytes().fold(Self::EMPTY, |set, b| set.union(Self::class(ascii(b))))
    }

    pub fn range(lo: u8, hi: u8) -> Self {
        (lo..=hi).fold(Self::EMPTY, |set, b| set.union(Self::class(ascii(b))))
    }

    pub const fn union(self, other: Self) -> Self {
        ClassSet(self.0 | other.0)
    }

    pub const fn minus(self, other: Self) -> Self {
        ClassSet(self.0 & !other.0)
    }

    pub const fn contains(self, class: u8) -> bool {
        self.0 & (1 << class) != 0
    }

    /// Every class except end of input.
    pub fn xml_char() -> Self {
        ClassSet(((1u128 << CLASS_COUNT) - 1) & !1)
    }

    pub fn whitespace() -> Self {
        Self::chars(" \t\r\n")
    }

    pub fn digits() -> Self {
        Self::range(b'0', b'9')
    }

    pub fn hex_digits() -> Self {
        Self::digits()
            .union(Self::range(b'a', b'f'))
            .union(Self::range(b'A', b'F'))
    }

    pub fn name_start() -> Self {
        Self::range(b'a', b'z')
            .union(Self::range(b'A', b'Z'))
            .union(Self::chars("_"))
            .union(Self::class(char_class::NAME_START_OTHER))
    }

    pub fn name_char() -> Self {
        Self::name_start()
            .union(Self::digits())
            .union(Self::chars("-."))
            .union(Self::class(char_class::NAME_OTHER))
    }

    /// Anything that ends a name, end of input included.
    pub fn name_boundary() -> Self {
        Self::xml_char()
            .minus(Self::name_char())
            .union(Self::class(char_class::EOF))
    }
}

/* ------------------------------------------------------------------ */
/*  Patterns                                                          */
/* ------------------------------------------------------------------ */

#[derive(Debug, Clone)]
pub enum Pattern {
    Set(ClassSet),
    Seq(Vec<Pattern>),
    Alt(Vec<Pattern>),
    Star(Box<Pattern>),
    Plus(Box<Pattern>),
    Opt(Box<Pattern>),
}

impl Pattern {
    /// Length in characters, if every match has the same length.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            Pattern::Set(_) => Some(1),
            Pattern::Seq(items) => items.iter().map(Pattern::fixed_len).sum(),
            Pattern::Alt(alts) => {
                let first = alts.first()?.fixed_len()?;
                alts.iter()
                    .all(|a| a.fixed_len() == Some(first))
                    .then_some(first)
            }
            Pattern::Star(_) | Pattern::Plus(_) | Pattern::Opt(_) => None,
        }
    }
}

pub fn lit(s: &str) -> Pattern {
    Pattern::Seq(s.bytes().map(|b| Pattern::Set(ClassSet::class(ascii(b)))).collect())
}

pub fn set(s: ClassSet) -> Pattern {
    Pattern::Set(s)
}

pub fn seq(items: impl IntoIterator<Item = Pattern>) -> Pattern {
    Pattern::Seq(items.into_iter().collect())
}

pub fn alt(items: impl IntoIterator<Item = Pattern>) -> Pattern {
    Pattern::Alt(items.into_iter().collect())
}

pub fn star(p: Pattern) -> Pattern {
    Pattern::Star(Box::new(p))
}

pub fn plus(p: Pattern) -> Pattern {
    Pattern::Plus(Box::new(p))
}

pub fn opt(p: Pattern) -> Pattern {
    Pattern::Opt(Box::new(p))
}

fn nc_name() -> Pattern {
    seq([set(ClassSet::name_start()), star(set(ClassSet::name_char()))])
}

fn qname() -> Pattern {
    seq([nc_name(), opt(seq([lit(":"), nc_name()]))])
}

fn eq_name() -> Pattern {
    let braced_uri = set(ClassSet::xml_char().minus(ClassSet::chars("{}")));
    alt([
        qname(),
        seq([lit("Q{"), star(braced_uri), lit("}"), nc_name()]),
    ])
}

fn run_except(excluded: &str) -> Pattern {
    plus(set(ClassSet::xml_char().minus(ClassSet::chars(excluded))))
}

fn digits() -> Pattern {
    plus(set(ClassSet::digits()))
}

/// One terminal's definition. A match of `body` followed by `context` is
/// accepted as `token`, with the context handed back to the input.
#[derive(Debug, Clone)]
pub struct Production {
    pub token: TokenId,
    pub body: Pattern,
    pub context: Option<Pattern>,
}

fn prod(token: TokenId, body: Pattern) -> Production {
    Production {
        token,
        body,
        context: None,
    }
}

fn prod_followed_by(token: TokenId, body: Pattern, context: Pattern) -> Production {
    Production {
        token,
        body,
        context: Some(context),
    }
}

const OPERATORS: &[&str] = &[
    "!=", ":=", ">=", "<=", "<<", ">>", "=>", "||", "//", "=", "<", ">", "-", "+", "*", "|", "!",
    "?", "/",
];

/// Every terminal the automaton recognises.
pub fn productions() -> Vec<Production> {
    let ws = || plus(set(ClassSet::whitespace()));
    let fraction = || seq([lit("."), digits()]);

    let mut productions = vec![
        prod_followed_by(t::EOF, seq([]), set(ClassSet::class(char_class::EOF))),
        prod(t::S, ws()),
        prod(t::INTEGER_LITERAL, digits()),
        prod(
            t::DECIMAL_LITERAL,
            alt([
                fraction(),
                seq([digits(), lit("."), star(set(ClassSet::digits()))]),
            ]),
        ),
        prod(
            t::DOUBLE_LITERAL,
            seq([
                alt([
                    fraction(),
                    seq([digits(), opt(seq([lit("."), star(set(ClassSet::digits()))]))]),
                ]),
                set(ClassSet::chars("eE")),
                opt(set(ClassSet::chars("+-"))),
                digits(),
            ]),
        ),
        prod(t::VARIABLE, seq([lit("$"), eq_name()])),
        prod(t::ANNOTATION, seq([lit("%"), eq_name()])),
        prod(t::ATTR_TEST, seq([lit("@"), alt([eq_name(), lit("*")])])),
        prod_followed_by(
            t::MODULE_DECL,
            seq([
                opt(seq([lit("import"), ws()])),
                alt([lit("module"), lit("schema")]),
                ws(),
                lit("namespace"),
            ]),
            set(ClassSet::name_boundary()),
        ),
        prod_followed_by(
            t::OPTION_DECL,
            seq([lit("declare"), ws(), lit("option")]),
            set(ClassSet::name_boundary()),
        ),
        prod(t::EQ_NAME, eq_name()),
        prod(t::NC_NAME, nc_name()),
        prod(t::QNAME, qname()),
        prod(t::TAG, seq([lit("<"), qname()])),
        prod(
            t::END_TAG,
            seq([
                lit("</"),
                qname(),
                star(set(ClassSet::whitespace())),
                lit(">"),
            ]),
        ),
        prod(t::OPERATOR, alt(OPERATORS.iter().map(|op| lit(op)))),
        prod(
            t::PREDEFINED_ENTITY_REF,
            seq([
                lit("&"),
                alt(["lt", "gt", "amp", "quot", "apos"].map(lit)),
                lit(";"),
            ]),
        ),
        prod(
            t::CHAR_REF,
            alt([
                seq([lit("&#"), digits(), lit(";")]),
                seq([lit("&#x"), plus(set(ClassSet::hex_digits())), lit(";")]),
            ]),
        ),
        prod(t::ELEMENT_CONTENT_CHAR, run_except("{}<&")),
        prod(t::QUOT_ATTR_CONTENT_CHAR, run_except("\"{}<&")),
        prod(t::APOS_ATTR_CONTENT_CHAR, run_except("'{}<&")),
        // string literals end on this line or not at all
        prod_followed_by(t::QUOT_CHAR, run_except("\"&"), set(ClassSet::chars("\"&"))),
        prod_followed_by(t::APOS_CHAR, run_except("'&"), set(ClassSet::chars("'&"))),
        prod(
            t::COMMENT_CONTENTS,
            alt([run_except(":("), lit(":"), lit("(")]),
        ),
        prod(
            t::DOC_COMMENT_CONTENTS,
            alt([run_except(":(@"), lit(":"), lit("("), lit("@")]),
        ),
        prod(t::DOC_TAG, seq([lit("@"), nc_name()])),
        prod(t::PRAGMA_CONTENTS, run_except("#")),
        prod(t::DIR_COMMENT_CONTENTS, alt([run_except("-"), lit("-")])),
        prod(t::DIR_PI_CONTENTS, run_except("?")),
        prod(t::CDATA_SECTION_CONTENTS, alt([run_except("]"), lit("]")])),
        prod(t::ESCAPE_QUOT, lit("\"\"")),
        prod(t::ESCAPE_APOS, lit("''")),
    ];

    let punctuation = [
        (t::QUOT, "\""),
        (t::APOS, "'"),
        (t::LPAREN, "("),
        (t::RPAREN, ")"),
        (t::LBRACE, "{"),
        (t::RBRACE, "}"),
        (t::LBRACKET, "["),
        (t::RBRACKET, "]"),
        (t::COMMA, ","),
        (t::SEMICOLON, ";"),
        (t::DOT, "."),
        (t::DOT_DOT, ".."),
        (t::COLON, ":"),
        (t::COLON_COLON, "::"),
        (t::HASH, "#"),
        (t::PRAGMA_OPEN, "(#"),
        (t::PRAGMA_CLOSE, "#)"),
        (t::COMMENT_OPEN, "(:"),
        (t::DOC_COMMENT_OPEN, "(:~"),
        (t::COMMENT_CLOSE, ":)"),
        (t::XML_COMMENT_OPEN, "<!--"),
        (t::XML_COMMENT_CLOSE, "-->"),
        (t::PI_OPEN, "<?"),
        (t::QUESTION, "?"),
        (t::PI_CLOSE, "?>"),
        (t::CDATA_OPEN, "<![CDATA["),
        (t::CDATA_CLOSE, "]]>"),
        (t::TAG_CLOSE, ">"),
        (t::EMPTY_TAG_CLOSE, "/>"),
        (t::EQUALS, "="),
        (t::DOUBLE_LBRACE, "{{"),
        (t::DOUBLE_RBRACE, "}}"),
    ];
    productions.extend(punctuation.iter().map(|&(token, text)| prod(token, lit(text))));
    productions
}

/* ------------------------------------------------------------------ */
/*  Token sets                                                        */
/* ------------------------------------------------------------------ */

/// Lookahead alphabets, one per lexical mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSet {
    Start,
    EqName,
    Prefix,
    StartTag,
    TagContent,
    AposAttr,
    QuotAttr,
    CData,
    XmlComment,
    Pi,
    Pragma,
    Comment,
    CommentDoc,
    QuotString,
    AposString,
}

impl TokenSet {
    pub const ALL: [TokenSet; 15] = [
        TokenSet::Start,
        TokenSet::EqName,
        TokenSet::Prefix,
        TokenSet::StartTag,
        TokenSet::TagContent,
        TokenSet::AposAttr,
        TokenSet::QuotAttr,
        TokenSet::CData,
        TokenSet::XmlComment,
        TokenSet::Pi,
        TokenSet::Pragma,
        TokenSet::Comment,
        TokenSet::CommentDoc,
        TokenSet::QuotString,
        TokenSet::AposString,
    ];

    pub fn id(self) -> usize {
        self as usize
    }

    pub fn members(self) -> &'static [TokenId] {
        use t::*;
        match self {
            TokenSet::Start => &[
                EOF,
                S,
                INTEGER_LITERAL,
                DECIMAL_LITERAL,
                DOUBLE_LITERAL,
                VARIABLE,
                ANNOTATION,
                ATTR_TEST,
                MODULE_DECL,
                OPTION_DECL,
                EQ_NAME,
                TAG,
                OPERATOR,
                QUOT,
                APOS,
                LPAREN,
                RPAREN,
                LBRACE,
                RBRACE,
                LBRACKET,
                RBRACKET,
                COMMA,
                SEMICOLON,
                DOT,
                DOT_DOT,
                COLON,
                COLON_COLON,
                HASH,
                PRAGMA_OPEN,
                COMMENT_OPEN,
                DOC_COMMENT_OPEN,
                XML_COMMENT_OPEN,
                PI_OPEN,
                CDATA_OPEN,
            ],
            TokenSet::EqName => &[EOF, S, EQ_NAME],
            TokenSet::Prefix => &[EOF, S, NC_NAME],
            TokenSet::StartTag => &[EOF, S, QNAME, EQUALS, QUOT, APOS, TAG_CLOSE, EMPTY_TAG_CLOSE],
            TokenSet::TagContent => &[
                EOF,
                ELEMENT_CONTENT_CHAR,
                TAG,
                END_TAG,
                PREDEFINED_ENTITY_REF,
                CHAR_REF,
                DOUBLE_LBRACE,
                DOUBLE_RBRACE,
                LBRACE,
                XML_COMMENT_OPEN,
                CDATA_OPEN,
                PI_OPEN,
            ],
            TokenSet::AposAttr => &[
                EOF,
                APOS,
                ESCAPE_APOS,
                APOS_ATTR_CONTENT_CHAR,
                PREDEFINED_ENTITY_REF,
                CHAR_REF,
                DOUBLE_LBRACE,
                DOUBLE_RBRACE,
                LBRACE,
            ],
            TokenSet::QuotAttr => &[
                EOF,
                QUOT,
                ESCAPE_QUOT,
                QUOT_ATTR_CONTENT_CHAR,
                PREDEFINED_ENTITY_REF,
                CHAR_REF,
                DOUBLE_LBRACE,
                DOUBLE_RBRACE,
                LBRACE,
            ],
            TokenSet::CData => &[EOF, CDATA_SECTION_CONTENTS, CDATA_CLOSE],
            TokenSet::XmlComment => &[EOF, DIR_COMMENT_CONTENTS, XML_COMMENT_CLOSE],
            TokenSet::Pi => &[EOF, DIR_PI_CONTENTS, QUESTION, PI_CLOSE],
            TokenSet::Pragma => &[EOF, PRAGMA_CONTENTS, HASH, PRAGMA_CLOSE],
            TokenSet::Comment => &[EOF, COMMENT_CONTENTS, COMMENT_OPEN, COMMENT_CLOSE],
            TokenSet::CommentDoc => &[
                EOF,
                DOC_COMMENT_CONTENTS,
                DOC_TAG,
                COMMENT_OPEN,
                COMMENT_CLOSE,
            ],
            TokenSet::QuotString => &[QUOT, ESCAPE_QUOT, PREDEFINED_ENTITY_REF, CHAR_REF, QUOT_CHAR],
            TokenSet::AposString => &[APOS, ESCAPE_APOS, PREDEFINED_ENTITY_REF, CHAR_REF, APOS_CHAR],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_terminal_has_exactly_one_production() {
        let productions = productions();
        for id in 0..TERMINALS.len() {
            let count = productions.iter().filter(|p| p.token == id).count();
            assert_eq!(count, 1, "terminal {} ({})", id, TERMINALS[id]);
        }
    }

    #[test]
    fn trailing_contexts_have_fixed_length() {
        for p in productions() {
            if let Some(context) = &p.context {
                assert_eq!(context.fixed_len(), Some(1), "{}", TERMINALS[p.token]);
            }
        }
    }

    #[test]
    fn class_sets() {
        let ws = ClassSet::whitespace();
        assert!(ws.contains(char_class::TAB));
        assert!(!ws.contains(ascii(b'a')));
        assert!(!ClassSet::xml_char().contains(char_class::EOF));
        assert!(ClassSet::name_boundary().contains(char_class::EOF));
        assert!(!ClassSet::name_boundary().contains(ascii(b'-')));
        assert!(ClassSet::name_char().contains(char_class::NAME_OTHER));
        assert!(!ClassSet::name_start().contains(char_class::NAME_OTHER));
    }
}
