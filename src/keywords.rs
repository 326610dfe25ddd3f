//! Reserved words of XQuery 3.1 together with the Update Facility, Full
//! Text and Scripting extensions.
//!
//! A matched name is checked against this table before it is accepted as a
//! plain `EQName`. Keyword terminals get the ids following the automaton's
//! terminals, in table order.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::grammar::{TokenId, TERMINALS};

pub const KEYWORDS: &[&str] = &[
    "NaN",
    "after",
    "all",
    "allowing",
    "ancestor",
    "ancestor-or-self",
    "and",
    "any",
    "array",
    "array-node",
    "as",
    "ascending",
    "at",
    "attribute",
    "base-uri",
    "before",
    "boolean-node",
    "boundary-space",
    "break",
    "by",
    "case",
    "cast",
    "castable",
    "catch",
    "check",
    "child",
    "collation",
    "collection",
    "comment",
    "constraint",
    "construction",
    "contains",
    "content",
    "context",
    "continue",
    "copy",
    "copy-namespaces",
    "count",
    "decimal-format",
    "decimal-separator",
    "declare",
    "default",
    "delete",
    "descendant",
    "descendant-or-self",
    "descending",
    "diacritics",
    "different",
    "digit",
    "distance",
    "div",
    "document",
    "document-node",
    "element",
    "else",
    "empty",
    "empty-sequence",
    "encoding",
    "end",
    "entire",
    "eq",
    "every",
    "exactly",
    "except",
    "exit",
    "exponent-separator",
    "external",
    "false",
    "first",
    "following",
    "following-sibling",
    "for",
    "foreach",
    "foreign",
    "from",
    "ft-option",
    "ftand",
    "ftnot",
    "ftor",
    "function",
    "ge",
    "greatest",
    "group",
    "grouping-separator",
    "gt",
    "idiv",
    "if",
    "import",
    "in",
    "index",
    "infinity",
    "inherit",
    "insensitive",
    "insert",
    "instance",
    "integrity",
    "intersect",
    "into",
    "is",
    "item",
    "json",
    "json-item",
    "key",
    "language",
    "last",
    "lax",
    "le",
    "least",
    "let",
    "levels",
    "loop",
    "lowercase",
    "lt",
    "map",
    "minus-sign",
    "mod",
    "modify",
    "module",
    "most",
    "namespace",
    "namespace-node",
    "ne",
    "next",
    "no",
    "no-inherit",
    "no-preserve",
    "node",
    "nodes",
    "not",
    "null",
    "null-node",
    "number-node",
    "object",
    "object-node",
    "occurs",
    "of",
    "on",
    "only",
    "option",
    "or",
    "order",
    "ordered",
    "ordering",
    "paragraph",
    "paragraphs",
    "parent",
    "pattern-separator",
    "per-mille",
    "percent",
    "phrase",
    "position",
    "preceding",
    "preceding-sibling",
    "preserve",
    "previous",
    "private",
    "processing-instruction",
    "public",
    "relationship",
    "rename",
    "replace",
    "return",
    "returning",
    "revalidation",
    "same",
    "satisfies",
    "schema",
    "schema-attribute",
    "schema-element",
    "score",
    "select",
    "self",
    "sensitive",
    "sentence",
    "sentences",
    "sequential",
    "simple",
    "skip",
    "sliding",
    "some",
    "stable",
    "start",
    "stemming",
    "stop",
    "strict",
    "strip",
    "structured-item",
    "switch",
    "text",
    "then",
    "thesaurus",
    "times",
    "to",
    "treat",
    "true",
    "try",
    "tumbling",
    "type",
    "typeswitch",
    "union",
    "unique",
    "unordered",
    "updating",
    "uppercase",
    "using",
    "validate",
    "value",
    "variable",
    "version",
    "weight",
    "when",
    "where",
    "while",
    "wildcards",
    "window",
    "with",
    "without",
    "word",
    "words",
    "xquery",
    "zero-digit",
];

/// Names that can never be the name of a function call.
pub const RESERVED_FUNCTION_NAMES: &[&str] = &[
    "array",
    "attribute",
    "comment",
    "document-node",
    "element",
    "empty-sequence",
    "function",
    "if",
    "item",
    "map",
    "namespace-node",
    "node",
    "processing-instruction",
    "schema-attribute",
    "schema-element",
    "switch",
    "text",
    "typeswitch",
];

static INDEX: Lazy<HashMap<&'static str, TokenId>> = Lazy::new(|| {
    KEYWORDS
        .iter()
        .enumerate()
        .map(|(i, kw)| (*kw, TERMINALS.len() + i))
        .collect()
});

/// Terminal id of the keyword spelled `text`, if it is one.
pub fn lookup(text: &str) -> Option<TokenId> {
    INDEX.get(text).copied()
}

pub fn is_keyword(text: &str) -> bool {
    INDEX.contains_key(text)
}

pub fn is_keyword_id(id: TokenId) -> bool {
    (TERMINALS.len()..TERMINALS.len() + KEYWORDS.len()).contains(&id)
}

pub fn is_reserved_function_name(text: &str) -> bool {
    RESERVED_FUNCTION_NAMES.contains(&text)
}
