//! The shift-reduce driver.
//!
//! A [`Parser`] owns a compiled [`Grammar`] and the [`Automaton`] built from
//! it. Each parse call keeps two parallel stacks, states and values, and
//! loops until the accept state is on top:
//!
//! - if the lookahead has a transition from the top state, it is shifted;
//! - otherwise, if the top state has a reduction, the top `n` entries are
//!   popped, the rule's reduction function combines their values, and the
//!   result is pushed together with the goto target for the rule's subject;
//! - otherwise the input is rejected.
//!
//! Parse calls share nothing mutable, so one parser may serve many threads.

use crate::automaton::{Automaton, StateId};
use crate::error::{Error, GrammarError, LexError, ParseError};
use crate::grammar::{Grammar, GrammarRule, RuleId};
use crate::token::Token;
use crate::trace::{Channel, Trace, indent};
use std::fmt;

/// Counters collected during one parse call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Tokens pulled from the input, including the end sentinel.
    pub tokens: usize,
    pub shifts: usize,
    /// Reductions by user rules. Acceptance is not counted.
    pub reductions: usize,
}

// A value on the stack with the character position of its leftmost token.
type Entry<V> = (usize, V);

/// Parser for one grammar producing values of type `V`.
///
/// Shifted tokens become values through `V: From<Token>`; reductions turn
/// the values of a rule's predicate into the value of its subject.
///
/// # Example
/// ```rust
/// # use cellgram::{GrammarRule, Lexer, Parser};
/// let rules: Vec<GrammarRule<String>> = vec![
///     GrammarRule::new("List", ["List", ",", "item"], |v: Vec<String>| {
///         Ok(format!("{}{}", v[0], v[2]))
///     }),
///     GrammarRule::new("List", ["item"], |mut v: Vec<String>| Ok(v.remove(0))),
/// ];
/// let parser = Parser::new(rules).unwrap();
/// let lexer = Lexer::new([("item", "[a-z]"), (",", ",")]).unwrap();
/// let out = parser.try_parse(lexer.lex("a,b,c")).unwrap();
/// assert_eq!(out, "abc");
/// ```
pub struct Parser<V> {
    grammar: Grammar<V>,
    automaton: Automaton,
    trace: Trace,
}

impl<V> Parser<V> {
    /// Compiles `rules` into a parser. Fails if the grammar is malformed or
    /// has a reduce/reduce conflict.
    pub fn new(rules: Vec<GrammarRule<V>>) -> Result<Self, GrammarError> {
        Self::with_trace(rules, Trace::new())
    }

    /// Like [`Parser::new`], reporting construction on `trace`'s grammar
    /// channel and later parses on its parse channel.
    pub fn with_trace(rules: Vec<GrammarRule<V>>, trace: Trace) -> Result<Self, GrammarError> {
        let grammar = Grammar::new(rules)?;
        let automaton = Automaton::build(&grammar, &trace)?;
        log::debug!(
            "built automaton with {} states for {} rules",
            automaton.state_count(),
            grammar.rule_count()
        );
        Ok(Self {
            grammar,
            automaton,
            trace,
        })
    }

    /// Replaces the grammar and rebuilds the automaton. On error the parser
    /// keeps its previous grammar.
    pub fn set_grammar(&mut self, rules: Vec<GrammarRule<V>>) -> Result<(), GrammarError> {
        let grammar = Grammar::new(rules)?;
        let automaton = Automaton::build(&grammar, &self.trace)?;
        self.grammar = grammar;
        self.automaton = automaton;
        Ok(())
    }

    pub fn grammar(&self) -> &Grammar<V> {
        &self.grammar
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Subscriptions may be added or cancelled at any time, including
    /// while other threads are parsing.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Terminal names with a transition out of `state`.
    fn expected(&self, state: StateId) -> Vec<String> {
        self.automaton
            .state(state)
            .transitions()
            .keys()
            .filter(|s| !self.grammar.is_nonterminal(**s))
            .map(|s| self.grammar.symbols().name(*s).to_owned())
            .collect()
    }

    /// Pops the predicate of `rule` off `values` and runs its reduction.
    fn reduce(&self, rule: RuleId, values: &mut Vec<Entry<V>>) -> Result<Entry<V>, ParseError> {
        let n = self.grammar.rule_len(rule);
        if values.len() < n {
            return Err(ParseError::EmptyStack);
        }
        let popped = values.split_off(values.len() - n);
        let position = popped.first().map(|(p, _)| *p).unwrap_or_default();
        let args = popped.into_iter().map(|(_, v)| v).collect();
        let value = self
            .grammar
            .reduce(rule, args)
            .map_err(|source| ParseError::Reduction {
                rule: self.grammar.display_rule(rule).to_string(),
                position,
                source,
            })?;
        Ok((position, value))
    }
}

impl<V: From<Token>> Parser<V> {
    /// Parses a token sequence that ends with the `$` sentinel.
    pub fn parse<I>(&self, tokens: I) -> Result<V, ParseError>
    where
        I: IntoIterator<Item = Token>,
    {
        self.parse_with_stats(tokens).map(|(value, _)| value)
    }

    /// Like [`Parser::parse`], also returning the parse counters.
    pub fn parse_with_stats<I>(&self, tokens: I) -> Result<(V, ParserStats), ParseError>
    where
        I: IntoIterator<Item = Token>,
    {
        self.drive(tokens.into_iter().map(Ok))
    }

    /// Parses a fallible token stream, such as the one returned by
    /// [`Lexer::lex`](crate::Lexer::lex). Tokens are pulled one at a time,
    /// so a lex error stops the parse at the point it occurs.
    pub fn try_parse<I>(&self, tokens: I) -> Result<V, Error>
    where
        I: IntoIterator<Item = Result<Token, LexError>>,
    {
        self.drive(tokens.into_iter().map(|t| t.map_err(Error::from)))
            .map(|(value, _)| value)
    }

    fn drive<I, E>(&self, mut tokens: I) -> Result<(V, ParserStats), E>
    where
        I: Iterator<Item = Result<Token, E>>,
        E: From<ParseError>,
    {
        let grammar = &self.grammar;
        let automaton = &self.automaton;
        let trace = &self.trace;

        let mut stats = ParserStats::default();
        let mut states: Vec<StateId> = vec![automaton.start()];
        let mut values: Vec<Entry<V>> = Vec::new();
        let mut lookahead: Option<Token> = None;
        let mut exhausted = false;

        trace.emit(Channel::Parse, || "=== parsing ===".into());

        loop {
            let top = *states.last().ok_or(ParseError::EmptyStack)?;
            if top == automaton.accept() {
                let (_, value) = self.reduce(grammar.augmented_rule(), &mut values)?;
                trace.emit(Channel::Parse, || "Accepted".into());
                return Ok((value, stats));
            }

            if lookahead.is_none() && !exhausted {
                match tokens.next().transpose()? {
                    Some(token) => {
                        stats.tokens += 1;
                        trace.emit(Channel::Parse, || {
                            format!(
                                "Lookahead: {} {:?} at {}",
                                token.name,
                                token.value.as_str(),
                                token.position
                            )
                        });
                        lookahead = Some(token);
                    }
                    None => exhausted = true,
                }
            }

            let state = automaton.state(top);
            trace.emit(Channel::Parse, || {
                format!(
                    "Current state:\n{}",
                    indent(automaton.display_state(grammar, top))
                )
            });

            let shift = lookahead
                .as_ref()
                .and_then(|t| grammar.symbols().get(&t.name))
                .and_then(|symbol| state.transition(symbol));

            if let Some(target) = shift {
                if let Some(token) = lookahead.take() {
                    trace.emit(Channel::Parse, || {
                        format!(
                            "Shifting forward to state:\n{}",
                            indent(automaton.display_state(grammar, target))
                        )
                    });
                    values.push((token.position, V::from(token)));
                    states.push(target);
                    stats.shifts += 1;
                    continue;
                }
            }

            let Some(rule) = state.reduction() else {
                let expected = self.expected(top);
                return Err(match lookahead {
                    Some(token) => ParseError::UnexpectedToken {
                        name: token.name.to_string(),
                        value: token.value.to_string(),
                        position: token.position,
                        expected,
                    },
                    None => ParseError::UnexpectedEnd { expected },
                }
                .into());
            };

            trace.emit(Channel::Parse, || {
                format!("Reducing using rule {}", grammar.display_rule(rule))
            });
            let n = grammar.rule_len(rule);
            if states.len() <= n {
                return Err(ParseError::EmptyStack.into());
            }
            let entry = self.reduce(rule, &mut values)?;
            states.truncate(states.len() - n);

            let back = *states.last().ok_or(ParseError::EmptyStack)?;
            let subject = grammar.rule_subject(rule);
            let target = automaton.state(back).transition(subject).ok_or_else(|| {
                ParseError::MissingGoto {
                    state: back.index(),
                    symbol: grammar.symbols().name(subject).to_owned(),
                }
            })?;
            trace.emit(Channel::Parse, || {
                format!(
                    "Reducing back to state:\n{}",
                    indent(automaton.display_state(grammar, back))
                )
            });
            values.push(entry);
            states.push(target);
            stats.reductions += 1;
        }
    }
}

impl<V> fmt::Debug for Parser<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("grammar", &self.grammar)
            .field("states", &self.automaton.state_count())
            .field("trace", &self.trace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReduceError;
    use crate::lexer::Lexer;
    use std::sync::{Arc, Mutex};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn first(mut v: Vec<String>) -> Result<String, ReduceError> {
        Ok(v.swap_remove(0))
    }

    // Builds a fully bracketed rendering of the parse tree.
    fn bracket_rules() -> Vec<GrammarRule<String>> {
        vec![
            GrammarRule::new("Expr", ["Expr", "+", "Term"], |v: Vec<String>| {
                Ok(format!("({} + {})", v[0], v[2]))
            }),
            GrammarRule::new("Expr", ["Term"], first),
            GrammarRule::new("Term", ["Term", "*", "Factor"], |v: Vec<String>| {
                Ok(format!("({} * {})", v[0], v[2]))
            }),
            GrammarRule::new("Term", ["Factor"], first),
            GrammarRule::new("Factor", ["(", "Expr", ")"], |mut v: Vec<String>| Ok(v.swap_remove(1))),
            GrammarRule::new("Factor", ["number"], first),
        ]
    }

    fn lexer() -> Lexer {
        Lexer::new([
            ("number", r"\d+"),
            ("ws", r"\s+"),
            ("+", r"\+"),
            ("*", r"\*"),
            ("(", r"\("),
            (")", r"\)"),
        ])
        .unwrap()
    }

    fn tokens(source: &str) -> Vec<Token> {
        lexer()
            .lex(source)
            .map(|t| t.unwrap())
            .filter(|t| t.name.as_str() != "ws")
            .collect()
    }

    fn parser() -> Parser<String> {
        Parser::new(bracket_rules()).unwrap()
    }

    #[test]
    fn precedence_follows_grammar_shape() {
        init_logger();
        let p = parser();
        assert_eq!(p.parse(tokens("1+2*3")).unwrap(), "(1 + (2 * 3))");
        assert_eq!(p.parse(tokens("1*2+3")).unwrap(), "((1 * 2) + 3)");
        assert_eq!(p.parse(tokens("(1 + 2) * 3")).unwrap(), "((1 + 2) * 3)");
        assert_eq!(p.parse(tokens("1+2+3")).unwrap(), "((1 + 2) + 3)");
        assert_eq!(p.parse(tokens("42")).unwrap(), "42");
    }

    #[test]
    fn repeated_parses_agree() {
        let p = parser();
        let a = p.parse(tokens("(1+2)*(3+4)")).unwrap();
        let b = p.parse(tokens("(1+2)*(3+4)")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn stats_count_tokens_shifts_and_reductions() {
        let p = parser();
        let (value, stats) = p.parse_with_stats(tokens("1+2")).unwrap();
        assert_eq!(value, "(1 + 2)");
        assert_eq!(
            stats,
            ParserStats {
                tokens: 4,
                shifts: 4,
                reductions: 6,
            }
        );
    }

    #[test]
    fn unexpected_token_lists_expected_terminals() {
        init_logger();
        let p = parser();
        let err = p.parse(tokens("1+")).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                name: "$".into(),
                value: "".into(),
                position: 2,
                expected: vec!["(".into(), "number".into()],
            }
        );

        let err = p.parse(tokens("1 2")).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                name: "number".into(),
                value: "2".into(),
                position: 2,
                expected: vec!["$".into(), "+".into()],
            }
        );
    }

    #[test]
    fn unknown_token_name_is_rejected() {
        let p = parser();
        let err = p
            .parse(vec![Token::new("banana", "x", 0), Token::end(1)])
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { position: 0, .. }));
    }

    #[test]
    fn missing_sentinel_is_unexpected_end() {
        let p = parser();
        let err = p.parse(vec![Token::new("number", "1", 0)]).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedEnd {
                expected: vec!["$".into(), "+".into()],
            }
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let p = parser();
        let err = p.parse(tokens("")).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref name, .. } if name == "$"));
    }

    #[test]
    fn reduction_failure_carries_rule_and_position() {
        let rules: Vec<GrammarRule<String>> = vec![
            GrammarRule::new("S", ["x", "y"], |_: Vec<String>| Err(ReduceError::new("nope"))),
        ];
        let p = Parser::new(rules).unwrap();
        let err = p
            .parse(vec![
                Token::new("x", "x", 3),
                Token::new("y", "y", 4),
                Token::end(5),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::Reduction {
                rule: "S → x y".into(),
                position: 3,
                source: ReduceError::new("nope"),
            }
        );
    }

    #[test]
    fn try_parse_surfaces_lex_errors() {
        let p = parser();
        let lexer = lexer();
        let stream = lexer
            .lex("1 + @")
            .filter(|t| !matches!(t, Ok(t) if t.name.as_str() == "ws"));
        match p.try_parse(stream) {
            Err(Error::Lex(e)) => assert_eq!(e.position, 4),
            other => panic!("expected lex error, got {other:?}"),
        }

        let stream = lexer
            .lex("2 * (3 + 4)")
            .filter(|t| !matches!(t, Ok(t) if t.name.as_str() == "ws"));
        assert_eq!(p.try_parse(stream).unwrap(), "(2 * (3 + 4))");
    }

    #[test]
    fn conflicting_grammar_fails_at_construction() {
        let rules: Vec<GrammarRule<String>> = vec![
            GrammarRule::new("S", ["A"], first),
            GrammarRule::new("S", ["B"], first),
            GrammarRule::new("A", ["x"], first),
            GrammarRule::new("B", ["x"], first),
        ];
        assert!(matches!(
            Parser::new(rules),
            Err(GrammarError::ReduceReduceConflict { .. })
        ));
    }

    #[test]
    fn set_grammar_rebuilds_or_keeps_previous() {
        let mut p = parser();
        let swapped: Vec<GrammarRule<String>> = vec![
            GrammarRule::new("Sum", ["Sum", "+", "number"], |v: Vec<String>| {
                Ok(format!("[{} {}]", v[0], v[2]))
            }),
            GrammarRule::new("Sum", ["number"], first),
        ];
        p.set_grammar(swapped).unwrap();
        assert_eq!(p.parse(tokens("1+2")).unwrap(), "[1 2]");
        assert!(p.parse(tokens("1*2")).is_err());

        assert!(p.set_grammar(Vec::new()).is_err());
        assert_eq!(p.parse(tokens("1+2")).unwrap(), "[1 2]");
    }

    #[test]
    fn parse_channel_traces_shifts_and_reductions() {
        init_logger();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let p = parser();
        let sub = p
            .trace()
            .subscribe(Channel::Parse, move |m| sink.lock().unwrap().push(m.to_owned()));

        p.parse(tokens("7")).unwrap();
        {
            let lines = lines.lock().unwrap();
            assert_eq!(lines.first().map(String::as_str), Some("=== parsing ==="));
            assert_eq!(lines.last().map(String::as_str), Some("Accepted"));
            assert!(lines.iter().any(|l| l == "Lookahead: number \"7\" at 0"));
            assert!(lines.iter().any(|l| l == "Reducing using rule Factor → number"));
            assert!(lines.iter().any(|l| l.starts_with("Shifting forward to state:")));
        }

        assert!(p.trace().cancel(sub));
        let before = lines.lock().unwrap().len();
        p.parse(tokens("8")).unwrap();
        assert_eq!(lines.lock().unwrap().len(), before);
    }

    #[test]
    fn caret_terminal_alongside_augmented_rule() {
        init_logger();
        let rules: Vec<GrammarRule<String>> = vec![
            GrammarRule::new("P", ["P", "^", "n"], |v: Vec<String>| {
                Ok(format!("({} ^ {})", v[0], v[2]))
            }),
            GrammarRule::new("P", ["n"], first),
        ];
        let p = Parser::new(rules).unwrap();
        let caret = p.grammar().symbols().get("^").unwrap();
        let start = p.automaton().state(p.automaton().start());
        assert_eq!(start.transition(caret), None);

        let lexer = Lexer::new([("n", "n"), ("^", r"\^")]).unwrap();
        let (value, stats) = p
            .parse_with_stats(lexer.lex("n^n^n").map(|t| t.unwrap()))
            .unwrap();
        assert_eq!(value, "((n ^ n) ^ n)");
        assert_eq!(
            stats,
            ParserStats {
                tokens: 6,
                shifts: 6,
                reductions: 3,
            }
        );

        let err = p.parse(lexer.lex("n^").map(|t| t.unwrap())).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                name: "$".into(),
                value: "".into(),
                position: 2,
                expected: vec!["n".into()],
            }
        );
    }

    fn _assert_send_sync<T: Send + Sync>() {}
    #[test]
    fn parser_is_send_sync() {
        _assert_send_sync::<Parser<String>>();
        let p = Arc::new(parser());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || p.parse(tokens(&format!("{i}*2"))).unwrap())
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), format!("({i} * 2)"));
        }
    }
}
