//! Grammar rules and their dotted items.
//!
//! Callers author a grammar as an ordered list of [`GrammarRule`]s; the
//! subject of the first rule is the start symbol. [`Grammar::new`] interns
//! the symbols, prepends the augmented start rule `^ → Start $` and lays out
//! every rule's item chain in a single arena.
//! User rules may not have `^` or `$` as a subject, but `^` may appear in a
//! predicate, where it is an ordinary terminal.
//!
//! An [`Item`] is a rule paired with a cursor. For a rule with `n` predicate
//! symbols there are `n + 1` items, stored contiguously, so the item for
//! `(rule, cursor)` lives at `first_item(rule) + cursor`. The item with
//! `cursor == n` is the rule's only *complete* item.

use crate::error::{GrammarError, ReduceError};
use crate::symbol::{END, START, SymbolId, SymbolTable};
use indexmap::IndexMap;
use smartstring::alias::String;
use std::fmt;

/// A reduction function: receives the values of the matched predicate
/// symbols, left to right, and produces the subject's value.
pub type Reduction<V> = Box<dyn Fn(Vec<V>) -> Result<V, ReduceError> + Send + Sync>;

/// A production as authored by the caller: `subject → predicate...`.
///
/// # Example
/// ```rust
/// # use cellgram::GrammarRule;
/// let rule: GrammarRule<i64> =
///     GrammarRule::new("Sum", ["Sum", "+", "number"], |v: Vec<i64>| Ok(v[0] + v[2]));
/// assert_eq!(rule.to_string(), "Sum → Sum + number");
/// ```
pub struct GrammarRule<V> {
    subject: String,
    predicate: Vec<String>,
    reduce: Reduction<V>,
}

impl<V> GrammarRule<V> {
    pub fn new<P, S, F>(subject: &str, predicate: P, reduce: F) -> Self
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(Vec<V>) -> Result<V, ReduceError> + Send + Sync + 'static,
    {
        Self {
            subject: String::from(subject),
            predicate: predicate
                .into_iter()
                .map(|s| String::from(s.as_ref()))
                .collect(),
            reduce: Box::new(reduce),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn predicate(&self) -> impl Iterator<Item = &str> {
        self.predicate.iter().map(|s| s.as_str())
    }
}

impl<V> fmt::Display for GrammarRule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} →", self.subject)?;
        for sym in &self.predicate {
            write!(f, " {}", sym)?;
        }
        Ok(())
    }
}

impl<V> fmt::Debug for GrammarRule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarRule")
            .field("subject", &self.subject)
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

/// Index of a rule inside a [`Grammar`]. Rule 0 is the augmented start rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(u32);

impl RuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an item inside a [`Grammar`]'s item arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

impl ItemId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A cursor position inside one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub rule: RuleId,
    pub cursor: usize,
    /// `predicate[cursor]`, or `None` when the item is complete.
    pub next: Option<SymbolId>,
    /// The item for `cursor + 1`; `None` exactly when `next` is `None`.
    pub advance: Option<ItemId>,
}

impl Item {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.next.is_none()
    }
}

struct Rule<V> {
    subject: SymbolId,
    predicate: Vec<SymbolId>,
    first: ItemId,
    // `None` for the augmented start rule, which passes its first value on.
    reduce: Option<Reduction<V>>,
}

/// A compiled grammar: interned symbols, rules and the item arena.
pub struct Grammar<V> {
    symbols: SymbolTable,
    rules: Vec<Rule<V>>,
    items: Vec<Item>,
    by_subject: IndexMap<SymbolId, Vec<RuleId>>,
}

impl<V> Grammar<V> {
    /// Compiles `rules`; the first rule's subject becomes the start symbol.
    pub fn new(rules: Vec<GrammarRule<V>>) -> Result<Self, GrammarError> {
        let Some(first) = rules.first() else {
            return Err(GrammarError::EmptyGrammar);
        };

        let mut symbols = SymbolTable::new();
        let start = symbols.intern(&first.subject);
        let mut grammar = Self {
            symbols,
            rules: Vec::with_capacity(rules.len() + 1),
            items: Vec::new(),
            by_subject: IndexMap::new(),
        };
        grammar.push_rule(SymbolId::START, vec![start, SymbolId::END], None);

        for rule in rules {
            if rule.subject.as_str() == START || rule.subject.as_str() == END {
                return Err(GrammarError::ReservedSymbol {
                    rule: rule.to_string(),
                    symbol: rule.subject.to_string(),
                });
            }
            if rule.predicate.is_empty() {
                return Err(GrammarError::EmptyProduction {
                    rule: rule.to_string(),
                });
            }
            let subject = grammar.symbols.intern(&rule.subject);
            let predicate = rule
                .predicate
                .iter()
                .map(|s| grammar.symbols.intern(s))
                .collect();
            let id = grammar.push_rule(subject, predicate, Some(rule.reduce));
            grammar.by_subject.entry(subject).or_default().push(id);
        }

        Ok(grammar)
    }

    fn push_rule(
        &mut self,
        subject: SymbolId,
        predicate: Vec<SymbolId>,
        reduce: Option<Reduction<V>>,
    ) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        let first = self.items.len();
        for cursor in 0..=predicate.len() {
            let next = predicate.get(cursor).copied();
            self.items.push(Item {
                rule: id,
                cursor,
                next,
                advance: next.map(|_| ItemId((first + cursor + 1) as u32)),
            });
        }
        self.rules.push(Rule {
            subject,
            predicate,
            first: ItemId(first as u32),
            reduce,
        });
        id
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The synthetic rule `^ → Start $`.
    pub fn augmented_rule(&self) -> RuleId {
        RuleId(0)
    }

    /// The complete item `^ → Start $ ▲`.
    pub fn accept_item(&self) -> ItemId {
        let first = self.rules[0].first;
        ItemId(first.0 + 2)
    }

    /// Number of rules, including the augmented start rule.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_subject(&self, rule: RuleId) -> SymbolId {
        self.rules[rule.index()].subject
    }

    pub fn rule_len(&self, rule: RuleId) -> usize {
        self.rules[rule.index()].predicate.len()
    }

    /// The item at cursor 0 of `rule`.
    pub fn first_item(&self, rule: RuleId) -> ItemId {
        self.rules[rule.index()].first
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }

    /// Rules whose subject is `symbol`, in authoring order. Empty for
    /// terminals.
    pub fn rules_for(&self, symbol: SymbolId) -> &[RuleId] {
        self.by_subject
            .get(&symbol)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_nonterminal(&self, symbol: SymbolId) -> bool {
        self.by_subject.contains_key(&symbol)
    }

    /// Runs the reduction function of `rule` on the popped values.
    pub fn reduce(&self, rule: RuleId, values: Vec<V>) -> Result<V, ReduceError> {
        match &self.rules[rule.index()].reduce {
            Some(reduce) => reduce(values),
            None => values
                .into_iter()
                .next()
                .ok_or_else(|| ReduceError::new("start rule reduced without a value")),
        }
    }

    pub fn display_rule(&self, rule: RuleId) -> RuleDisplay<'_, V> {
        RuleDisplay {
            grammar: self,
            rule,
        }
    }

    pub fn display_item(&self, item: ItemId) -> ItemDisplay<'_, V> {
        ItemDisplay {
            grammar: self,
            item,
        }
    }

    /// One line per subject listing its alternatives.
    pub(crate) fn summary(&self) -> std::string::String {
        let mut out = std::string::String::new();
        for (subject, rules) in &self.by_subject {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("Rules for {}:", self.symbols.name(*subject)));
            for rule in rules {
                out.push_str("\n\t");
                let names: Vec<&str> = self.rules[rule.index()]
                    .predicate
                    .iter()
                    .map(|s| self.symbols.name(*s))
                    .collect();
                out.push_str(&names.join(" "));
            }
        }
        out
    }
}

impl<V> fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("symbols", &self.symbols.len())
            .field("rules", &self.rules.len())
            .field("items", &self.items.len())
            .finish()
    }
}

/// Renders a rule as `Subject → a b c`.
pub struct RuleDisplay<'a, V> {
    grammar: &'a Grammar<V>,
    rule: RuleId,
}

impl<V> fmt::Display for RuleDisplay<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.grammar;
        let rule = &g.rules[self.rule.index()];
        write!(f, "{} →", g.symbols.name(rule.subject))?;
        for sym in &rule.predicate {
            write!(f, " {}", g.symbols.name(*sym))?;
        }
        Ok(())
    }
}

/// Renders an item as `Subject → a ▲ b c`.
pub struct ItemDisplay<'a, V> {
    grammar: &'a Grammar<V>,
    item: ItemId,
}

impl<V> fmt::Display for ItemDisplay<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.grammar;
        let item = g.item(self.item);
        let rule = &g.rules[item.rule.index()];
        write!(f, "{} →", g.symbols.name(rule.subject))?;
        for (i, sym) in rule.predicate.iter().enumerate() {
            if i == item.cursor {
                write!(f, " ▲")?;
            }
            write!(f, " {}", g.symbols.name(*sym))?;
        }
        if item.is_complete() {
            write!(f, " ▲")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_grammar() -> Vec<GrammarRule<i64>> {
        vec![
            GrammarRule::new("Sum", ["Sum", "+", "Num"], |v: Vec<i64>| Ok(v[0] + v[2])),
            GrammarRule::new("Sum", ["Num"], |v: Vec<i64>| Ok(v[0])),
            GrammarRule::new("Num", ["number"], |v: Vec<i64>| Ok(v[0])),
        ]
    }

    #[test]
    fn item_chain_per_rule() {
        let g = Grammar::new(sum_grammar()).unwrap();
        // augmented rule + 3 user rules
        assert_eq!(g.rule_count(), 4);

        let rule = RuleId(1);
        let first = g.first_item(rule);
        let mut id = first;
        let mut seen = 0;
        loop {
            let item = g.item(id);
            assert_eq!(item.rule, rule);
            assert_eq!(item.cursor, seen);
            seen += 1;
            match item.advance {
                Some(next) => id = next,
                None => break,
            }
        }
        assert_eq!(seen, g.rule_len(rule) + 1);
        assert!(g.item(id).is_complete());
    }

    #[test]
    fn items_render_with_cursor() {
        let g = Grammar::new(sum_grammar()).unwrap();
        let first = g.first_item(RuleId(1));
        assert_eq!(g.display_item(first).to_string(), "Sum → ▲ Sum + Num");
        let second = g.item(first).advance.unwrap();
        assert_eq!(g.display_item(second).to_string(), "Sum → Sum ▲ + Num");
        let aug = g.first_item(g.augmented_rule());
        assert_eq!(g.display_item(aug).to_string(), "^ → ▲ Sum $");
        assert_eq!(g.display_rule(RuleId(3)).to_string(), "Num → number");
    }

    #[test]
    fn subjects_are_nonterminals() {
        let g = Grammar::new(sum_grammar()).unwrap();
        let sum = g.symbols().get("Sum").unwrap();
        let plus = g.symbols().get("+").unwrap();
        assert!(g.is_nonterminal(sum));
        assert!(!g.is_nonterminal(plus));
        assert_eq!(g.rules_for(sum), &[RuleId(1), RuleId(2)]);
        assert!(g.rules_for(plus).is_empty());
    }

    #[test]
    fn summary_lists_alternatives() {
        let g = Grammar::new(sum_grammar()).unwrap();
        assert_eq!(
            g.summary(),
            "Rules for Sum:\n\tSum + Num\n\tNum\nRules for Num:\n\tnumber"
        );
    }

    #[test]
    fn rejects_empty_grammar() {
        let err = Grammar::<i64>::new(Vec::new()).unwrap_err();
        assert_eq!(err, GrammarError::EmptyGrammar);
    }

    #[test]
    fn rejects_empty_production() {
        let rules: Vec<GrammarRule<i64>> = vec![GrammarRule::new("A", Vec::<&str>::new(), |_: Vec<i64>| Ok(0))];
        let err = Grammar::new(rules).unwrap_err();
        assert!(matches!(err, GrammarError::EmptyProduction { .. }));
    }

    #[test]
    fn rejects_reserved_subjects() {
        for subject in ["$", "^"] {
            let rules: Vec<GrammarRule<i64>> =
                vec![GrammarRule::new(subject, ["x"], |_: Vec<i64>| Ok(0))];
            assert!(matches!(
                Grammar::new(rules),
                Err(GrammarError::ReservedSymbol { ref symbol, .. }) if symbol == subject
            ));
        }
    }

    #[test]
    fn caret_is_an_ordinary_terminal_in_predicates() {
        let rules: Vec<GrammarRule<i64>> = vec![
            GrammarRule::new("Pow", ["Pow", "^", "n"], |v: Vec<i64>| Ok(v[0].pow(v[2] as u32))),
            GrammarRule::new("Pow", ["n"], |v: Vec<i64>| Ok(v[0])),
        ];
        let g = Grammar::new(rules).unwrap();
        let caret = g.symbols().get("^").unwrap();
        assert!(!g.is_nonterminal(caret));
        assert!(g.rules_for(caret).is_empty());
        let first = g.first_item(RuleId(1));
        let after_pow = g.item(first).advance.unwrap();
        assert_eq!(g.item(after_pow).next, Some(caret));
        assert_eq!(g.display_item(after_pow).to_string(), "Pow → Pow ▲ ^ n");
    }

    #[test]
    fn augmented_rule_passes_first_value() {
        let g = Grammar::new(sum_grammar()).unwrap();
        assert_eq!(g.reduce(g.augmented_rule(), vec![7, 0]), Ok(7));
        assert_eq!(g.reduce(RuleId(1), vec![2, 0, 3]), Ok(5));
    }
}
