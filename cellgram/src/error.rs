//! Error types reported by the tokenizer, the automaton builder and the parse
//! driver.
//!
//! Each stage has its own error type so callers can decide what is fatal:
//!
//! - [`LexError`]: no token definition matches at some character offset.
//! - [`GrammarError`]: the grammar cannot be compiled into an automaton.
//!   Raised once, when the parser is built; never retried.
//! - [`ParseError`]: the token stream does not belong to the language, or a
//!   reduction function refused its operands. The automaton stays valid.
//! - [`Error`]: either a [`LexError`] or a [`ParseError`], returned when
//!   lexing and parsing run as one lazy pipeline.
//!
//! # Examples
//!
//! ```rust
//! # use cellgram::{LexError, ParseError, Error};
//! let err = LexError {
//!     position: 4,
//!     found: '@',
//!     input: "1 + @".into(),
//! };
//! assert!(err.to_string().contains("character 4"));
//!
//! let err: Error = ParseError::UnexpectedEnd { expected: vec!["number".into()] }.into();
//! assert!(matches!(err, Error::Parse(_)));
//! ```

use thiserror::Error;

/// No token definition matched at the current character offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at character {position} of {input:?}: unexpected {found:?}")]
pub struct LexError {
    /// 0-based character offset where matching failed.
    pub position: usize,
    /// The character found at `position`.
    pub found: char,
    /// The complete source being tokenized.
    pub input: String,
}

/// A token pattern could not be compiled.
#[derive(Debug, Error)]
#[error("invalid pattern for token {name:?}")]
pub struct TokenDefError {
    /// Name of the offending token definition.
    pub name: String,
    /// Underlying regex compilation failure.
    #[source]
    pub source: Box<regex_automata::meta::BuildError>,
}

/// The grammar cannot be compiled into a deterministic automaton.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A closed item set contains more than one complete item.
    #[error("multiple reductions possible for state:\n\t{}", .items.join("\n\t"))]
    ReduceReduceConflict {
        /// The competing complete items, rendered in dotted form.
        items: Vec<String>,
    },

    /// No rules were supplied, so there is no start symbol.
    #[error("grammar has no rules")]
    EmptyGrammar,

    /// A rule with an empty predicate. Empty productions are not supported.
    #[error("empty production is not supported: {rule}")]
    EmptyProduction { rule: String },

    /// A rule has `^` or `$` as its subject. Both may still appear in
    /// predicates as terminals.
    #[error("rule {rule} uses reserved symbol {symbol:?}")]
    ReservedSymbol { rule: String, symbol: String },
}

/// Error returned by a user-supplied reduction function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ReduceError {
    pub message: String,
}

impl ReduceError {
    /// Creates a new `ReduceError` with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The token stream could not be reduced to a single value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The lookahead has no transition and the state has nothing to reduce.
    #[error(
        "unexpected {name} {value:?} at character {position}, expected one of: {}",
        .expected.join(", ")
    )]
    UnexpectedToken {
        name: String,
        value: String,
        position: usize,
        /// Token names the current state would have accepted.
        expected: Vec<String>,
    },

    /// The token stream ended before the end sentinel was shifted.
    #[error("unexpected end of input, expected one of: {}", .expected.join(", "))]
    UnexpectedEnd { expected: Vec<String> },

    /// A reduction function rejected its operands.
    #[error("cannot reduce {rule} at character {position}: {source}")]
    Reduction {
        rule: String,
        position: usize,
        source: ReduceError,
    },

    /// After a reduction the exposed state has no transition on the rule's
    /// subject. Indicates a defect in automaton construction.
    #[error("state {state} has no transition on {symbol}")]
    MissingGoto { state: usize, symbol: String },

    /// The driver ran out of stack entries.
    #[error("parser stack underflow")]
    EmptyStack,
}

/// Failure of a combined lex-and-parse run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
