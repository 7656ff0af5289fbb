//! # grammar
//!
//! Token definitions and grammar rules of the formula language.
//!
//! Precedence is encoded by nesting, loosest first:
//!
//! ```text
//! Expr      → OrExpr | SumExpr
//! OrExpr    → OrExpr or AndExpr | AndExpr
//! AndExpr   → AndExpr and BoolValue | BoolValue
//! BoolValue → SumExpr = SumExpr | BoolValue = OrExpr
//!           | true | false | not BoolValue | ( OrExpr )
//! SumExpr   → SumExpr + MultExpr | SumExpr - MultExpr | MultExpr
//! MultExpr  → MultExpr * Value | MultExpr / Value | PowExpr
//! PowExpr   → PowExpr ^ Value | Value
//! Value     → number | - Value | ( SumExpr )
//! ```
//!
//! Every binary operator, `^` included, groups to the left, so `2^3^2` is
//! `(2^3)^2 = 64`.

use crate::value::Value;
use cellgram::{GrammarRule, ReduceError};

/// Name of the token that [`Formula`](crate::Formula) drops before parsing.
pub const WHITESPACE: &str = "whitespace";

/// Token names and patterns, in tie-break order.
pub const TOKENS: &[(&str, &str)] = &[
    ("number", r"(?:\d+\.?\d*|\.\d+)"),
    (WHITESPACE, r"\s+"),
    ("and", "and"),
    ("or", "or"),
    ("not", "not"),
    ("true", "true"),
    ("false", "false"),
    ("=", "="),
    ("+", r"\+"),
    ("*", r"\*"),
    ("-", "-"),
    ("/", r"\/"),
    ("^", r"\^"),
    ("(", r"\("),
    (")", r"\)"),
];

/// Splits the values of a rule's predicate into a fixed-size array.
fn operands<const N: usize>(values: Vec<Value>) -> Result<[Value; N], ReduceError> {
    values.try_into().map_err(|v: Vec<Value>| {
        ReduceError::new(format!("expected {} operands, got {}", N, v.len()))
    })
}

fn rule<F>(subject: &str, predicate: &[&str], reduce: F) -> GrammarRule<Value>
where
    F: Fn(Vec<Value>) -> Result<Value, ReduceError> + Send + Sync + 'static,
{
    GrammarRule::new(subject, predicate.iter().copied(), reduce)
}

fn pass(values: Vec<Value>) -> Result<Value, ReduceError> {
    let [value] = operands(values)?;
    Ok(value)
}

// `( inner )`
fn parenthesized(values: Vec<Value>) -> Result<Value, ReduceError> {
    let [_, inner, _] = operands(values)?;
    Ok(inner)
}

fn arithmetic(
    op: fn(f64, f64) -> f64,
) -> impl Fn(Vec<Value>) -> Result<Value, ReduceError> + Send + Sync + 'static {
    move |values: Vec<Value>| {
        let [lhs, _, rhs] = operands(values)?;
        Ok(Value::Number(op(lhs.as_number()?, rhs.as_number()?)))
    }
}

fn logical(
    op: fn(bool, bool) -> bool,
) -> impl Fn(Vec<Value>) -> Result<Value, ReduceError> + Send + Sync + 'static {
    move |values: Vec<Value>| {
        let [lhs, _, rhs] = operands(values)?;
        Ok(Value::Bool(op(lhs.as_bool()?, rhs.as_bool()?)))
    }
}

fn equals(values: Vec<Value>) -> Result<Value, ReduceError> {
    let [lhs, _, rhs] = operands(values)?;
    Ok(Value::Bool(lhs == rhs))
}

fn number(values: Vec<Value>) -> Result<Value, ReduceError> {
    let [text] = operands(values)?;
    match text {
        Value::Text(s) => s
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|e| ReduceError::new(format!("invalid number {:?}: {}", s.as_str(), e))),
        other => Err(ReduceError::new(format!(
            "expected number text, found {}",
            other.type_name()
        ))),
    }
}

fn negate(values: Vec<Value>) -> Result<Value, ReduceError> {
    let [_, value] = operands(values)?;
    Ok(Value::Number(-value.as_number()?))
}

fn not(values: Vec<Value>) -> Result<Value, ReduceError> {
    let [_, value] = operands(values)?;
    Ok(Value::Bool(!value.as_bool()?))
}

/// The formula grammar. `Expr` is the start symbol.
pub fn rules() -> Vec<GrammarRule<Value>> {
    vec![
        rule("Expr", &["OrExpr"], pass),
        rule("Expr", &["SumExpr"], pass),
        rule("OrExpr", &["OrExpr", "or", "AndExpr"], logical(|a, b| a || b)),
        rule("OrExpr", &["AndExpr"], pass),
        rule("AndExpr", &["AndExpr", "and", "BoolValue"], logical(|a, b| a && b)),
        rule("AndExpr", &["BoolValue"], pass),
        rule("BoolValue", &["SumExpr", "=", "SumExpr"], equals),
        rule("BoolValue", &["BoolValue", "=", "OrExpr"], equals),
        rule("BoolValue", &["true"], |_| Ok(Value::Bool(true))),
        rule("BoolValue", &["false"], |_| Ok(Value::Bool(false))),
        rule("BoolValue", &["not", "BoolValue"], not),
        rule("BoolValue", &["(", "OrExpr", ")"], parenthesized),
        rule("SumExpr", &["SumExpr", "+", "MultExpr"], arithmetic(|a, b| a + b)),
        rule("SumExpr", &["SumExpr", "-", "MultExpr"], arithmetic(|a, b| a - b)),
        rule("SumExpr", &["MultExpr"], pass),
        rule("MultExpr", &["MultExpr", "*", "Value"], arithmetic(|a, b| a * b)),
        rule("MultExpr", &["MultExpr", "/", "Value"], arithmetic(|a, b| a / b)),
        rule("MultExpr", &["PowExpr"], pass),
        rule("PowExpr", &["PowExpr", "^", "Value"], arithmetic(f64::powf)),
        rule("PowExpr", &["Value"], pass),
        rule("Value", &["number"], number),
        rule("Value", &["-", "Value"], negate),
        rule("Value", &["(", "SumExpr", ")"], parenthesized),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_checks_arity() {
        let [a, b] = operands::<2>(vec![Value::Bool(true), Value::Number(1.0)]).unwrap();
        assert_eq!(a, Value::Bool(true));
        assert_eq!(b, Value::Number(1.0));
        let err = operands::<3>(vec![Value::Bool(true)]).unwrap_err();
        assert_eq!(err.message, "expected 3 operands, got 1");
    }

    #[test]
    fn number_parses_all_literal_forms() {
        for (text, expected) in [("1", 1.0), ("1.23", 1.23), ("1.", 1.0), (".5", 0.5)] {
            let v = number(vec![Value::Text(text.into())]).unwrap();
            assert_eq!(v, Value::Number(expected));
        }
    }

    #[test]
    fn arithmetic_rejects_booleans() {
        let add = arithmetic(|a, b| a + b);
        let err = add(vec![
            Value::Bool(true),
            Value::Text("+".into()),
            Value::Number(1.0),
        ])
        .unwrap_err();
        assert!(err.message.contains("expected a number"));
    }

    #[test]
    fn grammar_has_one_start_symbol() {
        let rules = rules();
        assert_eq!(rules.len(), 23);
        assert_eq!(rules[0].subject(), "Expr");
    }
}
