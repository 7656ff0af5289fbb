//! Tokenizer driven by an ordered list of named patterns.
//!
//! At every position each pattern is tried anchored at the start of the
//! remaining input. Among the patterns that match a non-empty prefix, the
//! configured [`MatchPolicy`] picks the winner; candidates of equal length go
//! to the pattern registered first. When nothing matches, lexing stops with
//! a [`LexError`].
//!
//! After the input is exhausted the stream yields one end sentinel named `$`
//! with an empty value, positioned at the input's length in characters.

use crate::error::{LexError, TokenDefError};
use crate::token::Token;
use regex_automata::{Anchored, Input, meta::Regex};
use smartstring::alias::String;
use std::iter::FusedIterator;

/// How to choose between several patterns matching at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// The longest matched text wins (maximal munch).
    Longest,
    /// The shortest matched text wins.
    Shortest,
}

impl MatchPolicy {
    /// Whether a candidate of length `candidate` replaces the current best.
    #[inline]
    fn prefers(self, candidate: usize, best: usize) -> bool {
        match self {
            MatchPolicy::Longest => candidate > best,
            MatchPolicy::Shortest => candidate < best,
        }
    }
}

/// Policy used by [`Lexer::new`].
pub const DEFAULT_MATCH_POLICY: MatchPolicy = MatchPolicy::Longest;

#[derive(Debug, Clone)]
struct TokenDef {
    name: String,
    regex: Regex,
}

/// A compiled set of token definitions.
///
/// # Example
/// ```rust
/// # use cellgram::Lexer;
/// let lexer = Lexer::new([("number", r"\d+"), ("+", r"\+")]).unwrap();
/// let names: Vec<String> = lexer
///     .lex("1+22")
///     .map(|t| t.unwrap().name.to_string())
///     .collect();
/// assert_eq!(names, ["number", "+", "number", "$"]);
/// ```
#[derive(Debug, Clone)]
pub struct Lexer {
    defs: Vec<TokenDef>,
    policy: MatchPolicy,
}

impl Lexer {
    /// Compiles `(name, pattern)` pairs, keeping their order.
    pub fn new<I, N, P>(defs: I) -> Result<Self, TokenDefError>
    where
        I: IntoIterator<Item = (N, P)>,
        N: AsRef<str>,
        P: AsRef<str>,
    {
        let defs = defs
            .into_iter()
            .map(|(name, pattern)| {
                let regex = Regex::new(pattern.as_ref()).map_err(|e| TokenDefError {
                    name: name.as_ref().to_owned(),
                    source: Box::new(e),
                })?;
                Ok(TokenDef {
                    name: String::from(name.as_ref()),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, TokenDefError>>()?;
        Ok(Self {
            defs,
            policy: DEFAULT_MATCH_POLICY,
        })
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Returns a lazy, finite token stream over `source`.
    pub fn lex<'l, 's>(&'l self, source: &'s str) -> Tokens<'l, 's> {
        Tokens {
            lexer: self,
            source,
            offset: 0,
            position: 0,
            done: false,
        }
    }

    /// Picks the winning definition for the start of `rest` and the byte
    /// length of its match.
    fn select(&self, rest: &str) -> Option<(&TokenDef, usize)> {
        let input = Input::new(rest).anchored(Anchored::Yes);
        let mut best: Option<(&TokenDef, usize)> = None;
        for def in &self.defs {
            let Some(m) = def.regex.search(&input) else {
                continue;
            };
            let len = m.end();
            if len == 0 {
                continue;
            }
            match best {
                Some((_, best_len)) if !self.policy.prefers(len, best_len) => {}
                _ => best = Some((def, len)),
            }
        }
        best
    }
}

/// Token stream returned by [`Lexer::lex`].
///
/// Yields `Ok` tokens, then either the `$` sentinel or a single `Err`, then
/// nothing.
#[derive(Debug)]
pub struct Tokens<'l, 's> {
    lexer: &'l Lexer,
    source: &'s str,
    // byte offset into `source`
    offset: usize,
    // character offset into `source`
    position: usize,
    done: bool,
}

impl Iterator for Tokens<'_, '_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.source[self.offset..];
        if rest.is_empty() {
            self.done = true;
            return Some(Ok(Token::end(self.position)));
        }

        match self.lexer.select(rest) {
            Some((def, len)) => {
                let text = &rest[..len];
                let token = Token::new(def.name.clone(), text, self.position);
                log::trace!(
                    "MATCHED: {:?} {:?} at {}",
                    token.name.as_str(),
                    token.value.as_str(),
                    token.position
                );
                self.offset += len;
                self.position += text.chars().count();
                Some(Ok(token))
            }
            None => {
                self.done = true;
                Some(Err(LexError {
                    position: self.position,
                    found: rest.chars().next().unwrap_or_default(),
                    input: self.source.to_owned(),
                }))
            }
        }
    }
}

impl FusedIterator for Tokens<'_, '_> {}
