//! Item-set closure and construction of the parser automaton.
//!
//! Each [`ParserState`] is a closed set of items. Starting from the
//! augmented rule `^ → ▲ Start $`, states are discovered breadth-first: the
//! non-complete items of a state are grouped by the symbol after their
//! cursor, each group is advanced past that symbol and closed, and the
//! resulting item set becomes the transition target. Item sets are kept in
//! canonical (sorted) form, so structurally equal states are found by a
//! single hash lookup and shared.
//!
//! A state may hold at most one complete item. Reduction happens only when
//! the lookahead cannot be shifted, without consulting lookahead sets, so a
//! second complete item in the same state has no way to be told apart and
//! the grammar is rejected with [`GrammarError::ReduceReduceConflict`].

use crate::error::GrammarError;
use crate::grammar::{Grammar, ItemId, RuleId};
use crate::symbol::SymbolId;
use crate::trace::{Channel, Trace, indent};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

/// A canonical set of items.
pub type ItemSet = BTreeSet<ItemId>;

/// Expands `seed` until every nonterminal after a cursor has all of its
/// rules' first items in the set.
///
/// For example, if the set holds `Expr → ▲ Value` and the grammar has
/// `Value → number`, then `Value → ▲ number` is added, so the automaton can
/// decide what to shift from the next token alone.
///
/// Terminates because the only items ever added are first items, of which
/// there is one per rule.
pub fn closure<V, I>(seed: I, grammar: &Grammar<V>) -> ItemSet
where
    I: IntoIterator<Item = ItemId>,
{
    let mut set = ItemSet::new();
    let mut queue = VecDeque::new();
    for item in seed {
        if set.insert(item) {
            queue.push_back(item);
        }
    }
    while let Some(item) = queue.pop_front() {
        let Some(next) = grammar.item(item).next else {
            continue;
        };
        for &rule in grammar.rules_for(next) {
            let first = grammar.first_item(rule);
            if set.insert(first) {
                queue.push_back(first);
            }
        }
    }
    set
}

/// Index of a state inside an [`Automaton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the automaton.
#[derive(Debug, Clone)]
pub struct ParserState {
    items: ItemSet,
    transitions: IndexMap<SymbolId, StateId>,
    reduction: Option<RuleId>,
}

impl ParserState {
    /// Wraps a closed item set, determining its reduction.
    fn new<V>(items: ItemSet, grammar: &Grammar<V>) -> Result<Self, GrammarError> {
        let complete: Vec<ItemId> = items
            .iter()
            .copied()
            .filter(|&id| grammar.item(id).is_complete())
            .collect();

        let reduction = match complete.as_slice() {
            [] => None,
            [only] => Some(grammar.item(*only).rule),
            _ => {
                return Err(GrammarError::ReduceReduceConflict {
                    items: complete
                        .iter()
                        .map(|&id| grammar.display_item(id).to_string())
                        .collect(),
                });
            }
        };

        Ok(Self {
            items,
            transitions: IndexMap::new(),
            reduction,
        })
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    /// Outgoing edges in discovery order.
    pub fn transitions(&self) -> &IndexMap<SymbolId, StateId> {
        &self.transitions
    }

    pub fn transition(&self, symbol: SymbolId) -> Option<StateId> {
        self.transitions.get(&symbol).copied()
    }

    /// The rule to reduce by when the lookahead cannot be shifted.
    pub fn reduction(&self) -> Option<RuleId> {
        self.reduction
    }
}

/// The deterministic automaton for one grammar. Immutable once built.
#[derive(Debug, Clone)]
pub struct Automaton {
    states: Vec<ParserState>,
    start: StateId,
    accept: StateId,
}

impl Automaton {
    /// Discovers every state reachable from the augmented start rule.
    pub fn build<V>(grammar: &Grammar<V>, trace: &Trace) -> Result<Self, GrammarError> {
        trace.emit(Channel::Grammar, || grammar.summary());

        let augmented = grammar.first_item(grammar.augmented_rule());
        let accepted = grammar.accept_item();

        let mut builder = Builder {
            grammar,
            trace,
            states: Vec::new(),
            index: HashMap::new(),
            queue: VecDeque::new(),
        };
        let accept = builder.insert(ParserState::new(closure([accepted], grammar), grammar)?);
        let start = builder.insert(ParserState::new(closure([augmented], grammar), grammar)?);
        builder.run()?;

        let automaton = Self {
            states: builder.states,
            start,
            accept,
        };

        trace.emit(Channel::Grammar, || "=== summary ===".into());
        trace.emit(Channel::Grammar, || {
            format!("Identified {} states:", automaton.state_count())
        });
        for (i, state) in automaton.states.iter().enumerate() {
            trace.emit(Channel::Grammar, || {
                format!(
                    "{}\n  ({} links)",
                    automaton.display_state(grammar, StateId(i as u32)),
                    state.transitions.len()
                )
            });
        }

        Ok(automaton)
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn accept(&self) -> StateId {
        self.accept
    }

    pub fn state(&self, id: StateId) -> &ParserState {
        &self.states[id.index()]
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &ParserState)> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, s)| (StateId(i as u32), s))
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Renders a state as an optional `REDUCE` line followed by its items.
    pub fn display_state<'a, V>(
        &'a self,
        grammar: &'a Grammar<V>,
        id: StateId,
    ) -> StateDisplay<'a, V> {
        StateDisplay {
            grammar,
            state: self.state(id),
        }
    }
}

struct Builder<'g, V> {
    grammar: &'g Grammar<V>,
    trace: &'g Trace,
    states: Vec<ParserState>,
    index: HashMap<ItemSet, StateId>,
    queue: VecDeque<StateId>,
}

impl<V> Builder<'_, V> {
    fn insert(&mut self, state: ParserState) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.index.insert(state.items.clone(), id);
        self.states.push(state);
        self.queue.push_back(id);
        id
    }

    fn run(&mut self) -> Result<(), GrammarError> {
        let grammar = self.grammar;
        while let Some(id) = self.queue.pop_front() {
            self.trace.emit(Channel::Grammar, || {
                format!(
                    "Adding new state:\n{}",
                    indent(StateDisplay {
                        grammar,
                        state: &self.states[id.index()],
                    })
                )
            });

            let mut by_symbol: IndexMap<SymbolId, Vec<ItemId>> = IndexMap::new();
            for &item in &self.states[id.index()].items {
                let item = grammar.item(item);
                if let (Some(next), Some(advance)) = (item.next, item.advance) {
                    by_symbol.entry(next).or_default().push(advance);
                }
            }

            self.trace.emit(Channel::Grammar, || {
                let names: Vec<&str> = by_symbol
                    .keys()
                    .map(|s| grammar.symbols().name(*s))
                    .collect();
                format!("There are {} tokens: {}", names.len(), names.join(", "))
            });

            for (symbol, advanced) in by_symbol {
                let items = closure(advanced, grammar);
                self.trace.emit(Channel::Grammar, || {
                    let lines: Vec<String> = items
                        .iter()
                        .map(|&i| grammar.display_item(i).to_string())
                        .collect();
                    format!("Creating state from rules:\n\t{}", lines.join("\n\t"))
                });

                let target = match self.index.get(&items) {
                    Some(&existing) => {
                        self.trace
                            .emit(Channel::Grammar, || "... Already had state".into());
                        existing
                    }
                    None => {
                        let state = ParserState::new(items, grammar)?;
                        self.insert(state)
                    }
                };
                self.states[id.index()].transitions.insert(symbol, target);
            }
        }
        Ok(())
    }
}

/// See [`Automaton::display_state`].
pub struct StateDisplay<'a, V> {
    grammar: &'a Grammar<V>,
    state: &'a ParserState,
}

impl<V> fmt::Display for StateDisplay<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rule) = self.state.reduction {
            writeln!(f, "REDUCE {}", self.grammar.display_rule(rule))?;
        }
        for (i, &item) in self.state.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", self.grammar.display_item(item))?;
        }
        Ok(())
    }
}
