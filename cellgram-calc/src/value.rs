//! # value
//!
//! The values flowing through the formula grammar's reductions.
//!
//! Shifted tokens enter the parser as [`Value::Text`] holding the matched
//! source text; the `number` rule converts its text into a
//! [`Value::Number`], and the boolean rules produce [`Value::Bool`].
//!
//! ## Example
//! ```rust
//! # use cellgram_calc::Value;
//! assert_eq!(Value::Number(14.0).to_string(), "14");
//! assert_eq!(Value::Number(0.75).to_string(), "0.75");
//! assert_eq!(Value::Bool(false).to_string(), "false");
//! assert!(Value::Bool(true).as_number().is_err());
//! ```

use cellgram::{ReduceError, Token};
use smartstring::alias::String;
use std::fmt;

/// Result of evaluating a formula or one of its sub-expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A numeric value. Arithmetic follows IEEE 754, so `1/0` is infinity.
    Number(f64),
    /// A truth value.
    Bool(bool),
    /// Raw token text that has not been interpreted yet.
    Text(String),
}

impl Value {
    /// A short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Text(_) => "text",
        }
    }

    /// Returns the number, or a [`ReduceError`] naming the actual type.
    pub fn as_number(&self) -> Result<f64, ReduceError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(ReduceError::new(format!(
                "expected a number, found {} {}",
                other.type_name(),
                other
            ))),
        }
    }

    /// Returns the truth value, or a [`ReduceError`] naming the actual type.
    pub fn as_bool(&self) -> Result<bool, ReduceError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ReduceError::new(format!(
                "expected a boolean, found {} {}",
                other.type_name(),
                other
            ))),
        }
    }
}

impl From<Token> for Value {
    fn from(token: Token) -> Self {
        Value::Text(token.value)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_become_text() {
        let v = Value::from(Token::new("number", "1.5", 0));
        assert_eq!(v, Value::Text("1.5".into()));
        assert!(v.as_number().is_err());
    }

    #[test]
    fn type_errors_name_the_found_type() {
        let err = Value::Number(2.0).as_bool().unwrap_err();
        assert_eq!(err.message, "expected a boolean, found number 2");
        let err = Value::Bool(true).as_number().unwrap_err();
        assert_eq!(err.message, "expected a number, found boolean true");
    }

    #[test]
    fn numbers_display_without_trailing_zero() {
        assert_eq!(Value::from(64.0).to_string(), "64");
        assert_eq!(Value::from(-1.0).to_string(), "-1");
        assert_eq!(Value::from(f64::INFINITY).to_string(), "inf");
    }
}
