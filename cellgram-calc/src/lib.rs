//! Copyright (c) 2025 The cellgram authors.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! # cellgram-calc
//!
//! Spreadsheet formula evaluator built on **cellgram**.
//!
//! The formula language covers numbers, booleans, `+ - * / ^`, unary minus,
//! `and`, `or`, `not`, equality `=` and parentheses. Its grammar is compiled
//! at runtime into a cellgram [`Parser`](cellgram::Parser).
//!
//! ## Overview
//!
//! - [`grammar`]: token definitions and the formula grammar rules.
//! - [`value`]: [`Value`], the result type of every reduction.
//! - [`formula`]: [`Formula`], which lexes, drops whitespace and parses,
//!   plus [`CellOutcome`] for per-cell error reporting.
//! - [`error`]: [`FormulaError`].
//!
//! ## Example
//!
//! ```rust
//! use cellgram_calc::{Formula, Value};
//!
//! let f = Formula::shared();
//! assert_eq!(f.eval("(2+3)*4").unwrap(), Value::Number(20.0));
//! assert_eq!(f.eval("1 = 1").unwrap(), Value::Bool(true));
//! assert_eq!(f.eval("2^3^2").unwrap(), Value::Number(64.0));
//! ```
pub mod error;
pub mod formula;
pub mod grammar;
pub mod value;

pub use error::FormulaError;
pub use formula::{CellOutcome, Formula};
pub use value::Value;
