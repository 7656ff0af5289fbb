//! Symbol interning for grammar terminals and nonterminals.
//!
//! Every symbol that appears in a grammar (rule subjects and predicate
//! entries) receives a stable [`SymbolId`] in insertion order. The two
//! symbols of the augmented start rule, [`START`] and [`END`], are always
//! registered first.

use indexmap::IndexSet;
use smartstring::alias::String;

/// Subject of the synthetic augmented start rule `^ → Start $`.
///
/// No user rule may have it as a subject, so a `^` in a predicate is always
/// a terminal.
pub const START: &str = "^";

/// Name of the end-of-input sentinel token.
pub const END: &str = "$";

/// Compact handle to an interned symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    /// The augmented start symbol `^`.
    pub const START: SymbolId = SymbolId(0);
    /// The end sentinel `$`.
    pub const END: SymbolId = SymbolId(1);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Maps symbol names to ids and back.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    names: IndexSet<String>,
}

impl SymbolTable {
    /// Creates a table holding only the reserved symbols.
    pub fn new() -> Self {
        let mut names = IndexSet::new();
        names.insert(String::from(START));
        names.insert(String::from(END));
        Self { names }
    }

    /// Returns the id of `name`, inserting it if it is new.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        let (index, _) = self.names.insert_full(String::from(name));
        SymbolId(index as u32)
    }

    /// Looks up an existing symbol without inserting.
    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.names.get_index_of(name).map(|i| SymbolId(i as u32))
    }

    /// The name of `id`. Ids are only ever handed out by this table.
    pub fn name(&self, id: SymbolId) -> &str {
        self.names
            .get_index(id.index())
            .map(|s| s.as_str())
            .unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
