//! # formula
//!
//! The formula evaluator: lexes a formula, drops whitespace tokens and
//! parses the rest with the formula grammar.
//!
//! A [`Formula`] is immutable after construction apart from its trace
//! subscriptions, so one instance can evaluate any number of formulas, from
//! any number of threads. [`Formula::shared`] returns a process-wide
//! instance built on first use.
//!
//! ## Example
//! ```rust
//! # use cellgram_calc::{CellOutcome, Formula, Value};
//! let f = Formula::shared();
//! assert_eq!(f.eval("2+3*4").unwrap(), Value::Number(14.0));
//! assert_eq!(f.eval("not true").unwrap(), Value::Bool(false));
//!
//! match f.evaluate_cell("1 +") {
//!     CellOutcome::Error { display, .. } => assert_eq!(display, "=1 +"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use crate::error::FormulaError;
use crate::grammar::{TOKENS, WHITESPACE, rules};
use crate::value::Value;
use cellgram::{Channel, LexError, Lexer, Parser, Subscription, Token, Trace};
use once_cell::sync::Lazy;
use std::fmt;

static SHARED: Lazy<Formula> =
    Lazy::new(|| Formula::new().expect("built-in formula grammar must compile"));

/// Evaluator for the formula language.
pub struct Formula {
    lexer: Lexer,
    parser: Parser<Value>,
}

/// What a spreadsheet cell shows for a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    /// The formula is blank.
    Empty,
    /// The formula evaluated successfully.
    Value(Value),
    /// The formula is invalid. The cell keeps showing the formula text.
    Error {
        /// The formula as typed, prefixed with `=`.
        display: String,
        /// Human-readable reason.
        message: String,
    },
}

impl Formula {
    /// Builds an evaluator with no trace subscribers.
    pub fn new() -> Result<Self, FormulaError> {
        Self::with_trace(Trace::new())
    }

    /// Builds an evaluator, reporting grammar construction on `trace`.
    pub fn with_trace(trace: Trace) -> Result<Self, FormulaError> {
        let lexer = Lexer::new(TOKENS.iter().copied())?;
        let parser = Parser::with_trace(rules(), trace)?;
        Ok(Self { lexer, parser })
    }

    /// The process-wide evaluator.
    pub fn shared() -> &'static Formula {
        &SHARED
    }

    /// Subscribes `sink` to a trace channel of this evaluator. Works on
    /// [`Formula::shared`] too; the sink then also sees formulas evaluated
    /// by other threads.
    pub fn observe<F>(&self, channel: Channel, sink: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.parser.trace().subscribe(channel, sink)
    }

    /// Cancels a subscription made with [`Formula::observe`].
    pub fn cancel(&self, subscription: Subscription) -> bool {
        self.parser.trace().cancel(subscription)
    }

    /// The token stream the parser sees: lexer output minus whitespace.
    pub fn tokens<'a>(
        &'a self,
        source: &'a str,
    ) -> impl Iterator<Item = Result<Token, LexError>> + 'a {
        self.lexer
            .lex(source)
            .filter(|t| !matches!(t, Ok(t) if t.name.as_str() == WHITESPACE))
    }

    /// Evaluates `source`.
    pub fn eval(&self, source: &str) -> Result<Value, FormulaError> {
        let value = self.parser.try_parse(self.tokens(source))?;
        log::debug!("evaluated {:?} to {}", source, value);
        Ok(value)
    }

    /// Evaluates the formula of a cell, turning failures into an error
    /// state instead of returning them.
    pub fn evaluate_cell(&self, source: &str) -> CellOutcome {
        if source.trim().is_empty() {
            return CellOutcome::Empty;
        }
        match self.eval(source) {
            Ok(value) => CellOutcome::Value(value),
            Err(err) => {
                log::debug!("formula {:?} failed: {}", source, err);
                CellOutcome::Error {
                    display: format!("={}", source),
                    message: err.to_string(),
                }
            }
        }
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("lexer", &self.lexer)
            .field("parser", &self.parser)
            .finish()
    }
}
