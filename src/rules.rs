//! Per-mode presentation rules: terminal name → category and stack action.

use std::fmt;

use crate::keywords;
use crate::mode::Mode;

/// Category of anything no rule claims.
pub const TEXT: &str = "text";

#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Exact terminal display name.
    Name(&'static str),
    /// Any keyword terminal (`'return'`, `'if'`, ...).
    Keyword,
}

impl Matcher {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Name(n) => *n == name,
            Matcher::Keyword => name
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .is_some_and(keywords::is_keyword),
        }
    }
}

#[derive(Clone, Copy)]
pub enum Style {
    Fixed(&'static str),
    /// Category computed from the token's text.
    Classify(fn(&str) -> &'static str),
}

impl Style {
    pub fn category(&self, value: &str) -> &'static str {
        match self {
            Style::Fixed(c) => *c,
            Style::Classify(f) => f(value),
        }
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Fixed(c) => f.debug_tuple("Fixed").field(c).finish(),
            Style::Classify(_) => f.write_str("Classify(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Push(Mode),
    Pop,
    Replace(Mode),
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub matcher: Matcher,
    pub style: Style,
    pub action: Action,
}

/// Names outside the keyword table read as function names.
fn eq_name_category(value: &str) -> &'static str {
    if keywords::is_keyword(value) {
        "keyword"
    } else {
        "support.function"
    }
}

const fn rule(name: &'static str, category: &'static str, action: Action) -> Rule {
    Rule {
        matcher: Matcher::Name(name),
        style: Style::Fixed(category),
        action,
    }
}

const fn plain(name: &'static str, category: &'static str) -> Rule {
    rule(name, category, Action::None)
}

const QUOT: &str = "'\"'";
const APOS: &str = "\"'\"";

static START: &[Rule] = &[
    rule("'(#'", "meta.pragma", Action::Push(Mode::Pragma)),
    rule("'(:'", "comment", Action::Push(Mode::Comment)),
    rule("'(:~'", "comment.doc", Action::Push(Mode::CommentDoc)),
    rule("'<!--'", "comment.doc", Action::Push(Mode::XmlComment)),
    rule("'<?'", "xml-pe", Action::Push(Mode::Pi)),
    rule(APOS, "string", Action::Push(Mode::AposString)),
    rule(QUOT, "string", Action::Push(Mode::QuotString)),
    plain("Annotation", "support.function"),
    rule("ModuleDecl", "keyword", Action::Push(Mode::Prefix)),
    rule("OptionDecl", "keyword", Action::Push(Mode::EqName)),
    plain("AttrTest", "support.type"),
    plain("Variable", "variable"),
    rule("'<![CDATA['", "constant.language", Action::Push(Mode::CData)),
    plain("IntegerLiteral", "constant"),
    plain("DecimalLiteral", "constant"),
    plain("DoubleLiteral", "constant"),
    plain("Operator", "keyword.operator"),
    Rule {
        matcher: Matcher::Name("EQName"),
        style: Style::Classify(eq_name_category),
        action: Action::None,
    },
    Rule {
        matcher: Matcher::Keyword,
        style: Style::Fixed("keyword"),
        action: Action::None,
    },
    plain("'('", "lparen"),
    plain("')'", "rparen"),
    rule("Tag", "meta.tag", Action::Push(Mode::StartTag)),
    rule("'}'", TEXT, Action::Pop),
    rule("'{'", TEXT, Action::Push(Mode::Start)),
];

static EQ_NAME: &[Rule] = &[
    rule("EQName", TEXT, Action::Pop),
    Rule {
        matcher: Matcher::Keyword,
        style: Style::Fixed(TEXT),
        action: Action::Pop,
    },
];

static PREFIX: &[Rule] = &[
    rule("NCName", TEXT, Action::Pop),
    Rule {
        matcher: Matcher::Keyword,
        style: Style::Fixed(TEXT),
        action: Action::Pop,
    },
];

static START_TAG: &[Rule] = &[
    rule("'>'", "meta.tag", Action::Replace(Mode::TagContent)),
    plain("QName", "entity.other.attribute-name"),
    plain("'='", TEXT),
    rule(APOS, "string", Action::Push(Mode::AposAttr)),
    rule(QUOT, "string", Action::Push(Mode::QuotAttr)),
    rule("'/>'", "meta.tag.r", Action::Pop),
];

static TAG_CONTENT: &[Rule] = &[
    plain("ElementContentChar", TEXT),
    rule("'<![CDATA['", "constant.language", Action::Push(Mode::CData)),
    rule("'<!--'", "comment.doc", Action::Push(Mode::XmlComment)),
    rule("'<?'", "xml-pe", Action::Push(Mode::Pi)),
    rule("Tag", "meta.tag", Action::Push(Mode::StartTag)),
    plain("PredefinedEntityRef", "constant.language.escape"),
    plain("CharRef", "constant.language.escape"),
    plain("'{{'", TEXT),
    plain("'}}'", TEXT),
    rule("'{'", TEXT, Action::Push(Mode::Start)),
    rule("EndTag", "meta.tag", Action::Pop),
];

static APOS_ATTR: &[Rule] = &[
    rule(APOS, "string", Action::Pop),
    plain("EscapeApos", "constant.language.escape"),
    plain("AposAttrContentChar", "string"),
    plain("PredefinedEntityRef", "constant.language.escape"),
    plain("CharRef", "constant.language.escape"),
    plain("'{{'", "string"),
    plain("'}}'", "string"),
    rule("'{'", TEXT, Action::Push(Mode::Start)),
];

static QUOT_ATTR: &[Rule] = &[
    rule(QUOT, "string", Action::Pop),
    plain("EscapeQuot", "constant.language.escape"),
    plain("QuotAttrContentChar", "string"),
    plain("PredefinedEntityRef", "constant.language.escape"),
    plain("CharRef", "constant.language.escape"),
    plain("'{{'", "string"),
    plain("'}}'", "string"),
    rule("'{'", TEXT, Action::Push(Mode::Start)),
];

static PRAGMA: &[Rule] = &[
    plain("PragmaContents", "meta.pragma"),
    plain("'#'", "meta.pragma"),
    rule("'#)'", "meta.pragma", Action::Pop),
];

static COMMENT: &[Rule] = &[
    plain("CommentContents", "comment"),
    rule("'(:'", "comment", Action::Push(Mode::Comment)),
    rule("':)'", "comment", Action::Pop),
];

static COMMENT_DOC: &[Rule] = &[
    plain("DocCommentContents", "comment.doc"),
    plain("DocTag", "comment.doc.tag"),
    rule("'(:'", "comment.doc", Action::Push(Mode::CommentDoc)),
    rule("':)'", "comment.doc", Action::Pop),
];

static XML_COMMENT: &[Rule] = &[
    plain("DirCommentContents", "comment.doc"),
    rule("'-->'", "comment.doc", Action::Pop),
];

static PI: &[Rule] = &[
    plain("DirPIContents", "xml-pe"),
    plain("'?'", "xml-pe"),
    rule("'?>'", "xml-pe", Action::Pop),
];

static APOS_STRING: &[Rule] = &[
    rule(APOS, "string", Action::Pop),
    plain("PredefinedEntityRef", "constant.language.escape"),
    plain("CharRef", "constant.language.escape"),
    plain("EscapeApos", "constant.language.escape"),
    plain("AposChar", "string"),
];

static QUOT_STRING: &[Rule] = &[
    rule(QUOT, "string", Action::Pop),
    plain("PredefinedEntityRef", "constant.language.escape"),
    plain("CharRef", "constant.language.escape"),
    plain("EscapeQuot", "constant.language.escape"),
    plain("QuotChar", "string"),
];

static CDATA: &[Rule] = &[
    plain("CDataSectionContents", TEXT),
    rule("']]>'", "constant.language", Action::Pop),
];

pub fn rules(mode: Mode) -> &'static [Rule] {
    match mode {
        Mode::Start => START,
        Mode::EqName => EQ_NAME,
        Mode::Prefix => PREFIX,
        Mode::StartTag => START_TAG,
        Mode::TagContent => TAG_CONTENT,
        Mode::AposAttr => APOS_ATTR,
        Mode::QuotAttr => QUOT_ATTR,
        Mode::CData => CDATA,
        Mode::XmlComment => XML_COMMENT,
        Mode::Pi => PI,
        Mode::Pragma => PRAGMA,
        Mode::Comment => COMMENT,
        Mode::CommentDoc => COMMENT_DOC,
        Mode::QuotString => QUOT_STRING,
        Mode::AposString => APOS_STRING,
    }
}

/// First rule of `mode` claiming terminal `name`.
pub fn find(mode: Mode, name: &str) -> Option<&'static Rule> {
    rules(mode).iter().find(|r| r.matcher.matches(name))
}
