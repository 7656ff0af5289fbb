//! Tokens produced by the [`Lexer`](crate::Lexer) and consumed by the
//! [`Parser`](crate::Parser).
use crate::symbol::END;
use smartstring::alias::String;

/// A named lexeme together with the character offset where it starts.
///
/// Tokens are immutable once created. The `name` selects the grammar
/// terminal, `value` is the matched text and `position` is a 0-based
/// character offset into the source, used in diagnostics.
///
/// # Example
/// ```rust
/// # use cellgram::Token;
/// let tok = Token::new("number", "12", 0);
/// assert_eq!(tok.name.as_str(), "number");
/// assert!(!tok.is_end());
/// assert!(Token::end(2).is_end());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Lexical category, e.g. `number` or `+`.
    pub name: String,
    /// The matched source text.
    pub value: String,
    /// Character offset of the first matched character.
    pub position: usize,
}

impl Token {
    pub fn new(name: impl Into<String>, value: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            position,
        }
    }

    /// The end-of-input sentinel: named `$`, empty value.
    pub fn end(position: usize) -> Self {
        Self::new(END, "", position)
    }

    pub fn is_end(&self) -> bool {
        self.name.as_str() == END
    }
}

impl From<Token> for std::string::String {
    fn from(token: Token) -> Self {
        token.value.into()
    }
}
