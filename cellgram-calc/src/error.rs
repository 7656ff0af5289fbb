//! # Formula Error Type
//!
//! This module defines [`FormulaError`], the single error surface of the
//! formula evaluator. It aggregates failures from:
//!
//! - **Tokenizing** the formula source ([`LexError`]),
//! - **Parsing and reducing** the token stream ([`ParseError`]),
//! - **Building** the evaluator itself ([`GrammarError`], [`TokenDefError`]).
//!
//! The first two are per-formula failures; the last two mean the built-in
//! grammar or token table is broken.
//!
//! # Examples
//! ```rust
//! # use cellgram_calc::{Formula, FormulaError};
//! let err = Formula::shared().eval("1 + @").unwrap_err();
//! assert!(matches!(err, FormulaError::Lex(ref e) if e.position == 4));
//! assert!(err.is_user_error());
//! ```

use cellgram::{GrammarError, LexError, ParseError, TokenDefError};
use thiserror::Error;

/// Represents all possible errors of formula construction and evaluation.
#[derive(Debug, Error)]
pub enum FormulaError {
    /// No token definition matches at some character of the formula.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// The formula is not a well-formed expression, or an operand has the
    /// wrong type.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The formula grammar could not be compiled.
    #[error("invalid formula grammar: {0}")]
    Grammar(#[from] GrammarError),

    /// A token pattern could not be compiled.
    #[error(transparent)]
    TokenDef(#[from] TokenDefError),
}

impl FormulaError {
    /// `true` for failures caused by the formula text rather than by the
    /// evaluator's own definition.
    pub fn is_user_error(&self) -> bool {
        matches!(self, FormulaError::Lex(_) | FormulaError::Parse(_))
    }
}

impl From<cellgram::Error> for FormulaError {
    fn from(err: cellgram::Error) -> Self {
        match err {
            cellgram::Error::Lex(e) => FormulaError::Lex(e),
            cellgram::Error::Parse(e) => FormulaError::Parse(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_keep_their_stage() {
        let lex = cellgram::Error::Lex(LexError {
            position: 1,
            found: '?',
            input: "1?".into(),
        });
        assert!(matches!(FormulaError::from(lex), FormulaError::Lex(_)));

        let parse = cellgram::Error::Parse(ParseError::UnexpectedEnd { expected: vec![] });
        let err = FormulaError::from(parse);
        assert!(matches!(err, FormulaError::Parse(_)));
        assert!(err.is_user_error());
    }

    #[test]
    fn grammar_errors_are_not_user_errors() {
        let err = FormulaError::from(GrammarError::EmptyGrammar);
        assert!(!err.is_user_error());
        assert_eq!(err.to_string(), "invalid formula grammar: grammar has no rules");
    }
}
