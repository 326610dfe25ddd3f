//! Table-driven line tokenizer for XQuery with embedded XML, as used by
//! editor syntax modes.
//!
//! [`XQueryLexer::tokenize_line`] takes one line and the state left by the
//! previous one and returns presentation tokens plus the next state. Below
//! it sit the packed scanner automaton ([`scanner`], [`tables`]), generated
//! once from the lexical grammar ([`grammar`]), and a small grammar-driven
//! dispatcher ([`dispatcher`]) that decides which terminals are admissible
//! in each lexical mode.

pub mod char_class;
pub mod dispatcher;
pub mod editing;
pub mod event_sink;
pub mod grammar;
pub mod keywords;
pub mod lexer_types;
pub mod line_lexer;
pub mod mode;
pub mod rules;
pub mod scanner;
pub mod semantic;
mod table_gen;
pub mod tables;

#[cfg(feature = "python")]
mod python;

pub use char_class::classify;
pub use dispatcher::Dispatcher;
pub use event_sink::{EventHandler, RawToken, TokenCollector};
pub use grammar::{TokenId, TokenSet};
pub use lexer_types::{Expected, ParseError};
pub use line_lexer::{LineTokens, Token, XQueryLexer};
pub use mode::{Mode, ModeStack};
pub use scanner::Scanner;
pub use semantic::{SemanticBatch, SemanticToken};
pub use tables::{expected_token_names, token_name};
