//! Copyright (c) 2025 The cellgram authors.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Runtime shift-reduce parser generator and driver.
//!
//! `cellgram` builds a parser from a grammar supplied at runtime, with no
//! code-generation step:
//!  * [`Lexer`] splits a source string into named [`Token`]s using an ordered
//!    list of regular expressions;
//!  * [`Parser`] compiles a list of [`GrammarRule`]s into an [`Automaton`]
//!    and drives it over a token stream, calling each rule's reduction
//!    function to build the result.
//!
//! The automaton reduces only when the lookahead cannot be shifted, and
//! rejects grammars where two rules complete in the same state
//! ([`GrammarError::ReduceReduceConflict`]).
//!
//! Diagnostics go through the `log` facade under the targets
//! `cellgram::grammar` and `cellgram::parse`, and to any callbacks
//! subscribed on a [`Trace`].
//!
//! # Example
//! ```rust
//! use cellgram::{GrammarRule, Lexer, Parser, Token};
//!
//! #[derive(Debug, PartialEq)]
//! enum V {
//!     Tok(String),
//!     Num(i64),
//! }
//!
//! impl From<Token> for V {
//!     fn from(t: Token) -> Self {
//!         V::Tok(t.value.to_string())
//!     }
//! }
//!
//! fn num(v: &V) -> i64 {
//!     match v {
//!         V::Num(n) => *n,
//!         V::Tok(s) => s.parse().unwrap_or_default(),
//!     }
//! }
//!
//! let rules: Vec<GrammarRule<V>> = vec![
//!     GrammarRule::new("Sum", ["Sum", "+", "number"], |v: Vec<V>| {
//!         Ok(V::Num(num(&v[0]) + num(&v[2])))
//!     }),
//!     GrammarRule::new("Sum", ["number"], |v: Vec<V>| Ok(V::Num(num(&v[0])))),
//! ];
//! let parser = Parser::new(rules).unwrap();
//! let lexer = Lexer::new([("number", r"\d+"), ("+", r"\+")]).unwrap();
//! assert_eq!(parser.try_parse(lexer.lex("1+2+39")).unwrap(), V::Num(42));
//! ```

mod automaton;
mod error;
mod grammar;
mod lexer;
mod parser;
mod symbol;
mod token;
mod trace;

pub use crate::automaton::{Automaton, ItemSet, ParserState, StateDisplay, StateId, closure};
pub use crate::error::{Error, GrammarError, LexError, ParseError, ReduceError, TokenDefError};
pub use crate::grammar::{
    Grammar, GrammarRule, Item, ItemDisplay, ItemId, Reduction, RuleDisplay, RuleId,
};
pub use crate::lexer::{DEFAULT_MATCH_POLICY, Lexer, MatchPolicy, Tokens};
pub use crate::parser::{Parser, ParserStats};
pub use crate::symbol::{END, START, SymbolId, SymbolTable};
pub use crate::token::Token;
pub use crate::trace::{Channel, Subscription, Trace};
