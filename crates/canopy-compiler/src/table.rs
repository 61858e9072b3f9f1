//! The compiled grammar table consumed by the runtime.
//!
//! Symbol ids are dense: `0` is the end of input, then lexical tokens, then
//! external tokens, then non-terminals. Every row is sorted by symbol id so
//! lookups are a binary search.

use canopy_core::{FieldId, LexModeId, ProductionId, StateId, SymbolId, TokenSet};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarTable {
    pub name: String,
    pub symbols: Vec<SymbolInfo>,
    /// Lexical token `id` is described by `tokens[id - 1]`.
    pub tokens: Vec<TokenDef>,
    pub external_count: u16,
    /// Field `id` is named `fields[id - 1]`. Sorted by name.
    pub fields: Vec<String>,
    pub productions: Vec<Production>,
    pub states: Vec<ParseState>,
    pub lex_modes: Vec<LexMode>,
    /// Mode with every lexical token, used while recovering from errors.
    pub error_lex_mode: LexModeId,
    pub extras: Vec<SymbolId>,
    pub start_symbol: SymbolId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    End,
    Token,
    External,
    NonTerminal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Appears in the node API. Hidden symbols are transparent.
    pub visible: bool,
    pub named: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDef {
    /// Regex source accepted by `regex-syntax`.
    pub pattern: String,
    pub precedence: i32,
    /// Made only of string literals.
    pub is_literal: bool,
    /// Must follow the previous token without intervening extras.
    pub immediate: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub lhs: SymbolId,
    pub child_count: u16,
    pub dynamic_precedence: i32,
    /// One entry per child; empty when no child carries a field or alias.
    pub children: Vec<ChildInfo>,
}

impl Production {
    pub fn child(&self, index: usize) -> Option<&ChildInfo> {
        self.children.get(index)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildInfo {
    pub field: Option<FieldId>,
    pub alias: Option<AliasInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasInfo {
    pub name: String,
    pub named: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Shift(StateId),
    /// Shift an extra without changing state.
    ShiftExtra,
    Reduce(ProductionId),
    Accept,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseState {
    pub lex_mode: LexModeId,
    pub actions: Vec<(SymbolId, Action)>,
    pub gotos: Vec<(SymbolId, StateId)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LexMode {
    /// Valid lexical token ids.
    pub tokens: TokenSet,
    /// Valid external token indices, ascending.
    pub externals: Vec<u16>,
}

impl GrammarTable {
    pub fn symbol(&self, id: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(id as usize)
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        if id == canopy_core::ERROR_SYMBOL {
            return "ERROR";
        }
        self.symbols.get(id as usize).map_or("?", |info| info.name.as_str())
    }

    /// First id past the lexical tokens.
    pub fn external_base(&self) -> SymbolId {
        1 + self.tokens.len() as SymbolId
    }

    /// First non-terminal id.
    pub fn terminal_count(&self) -> SymbolId {
        self.external_base() + self.external_count
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        id < self.terminal_count()
    }

    pub fn is_external(&self, id: SymbolId) -> bool {
        (self.external_base()..self.terminal_count()).contains(&id)
    }

    pub fn token(&self, id: SymbolId) -> Option<&TokenDef> {
        (id as usize).checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    pub fn field_name(&self, id: FieldId) -> &str {
        self.fields
            .get(id.get() as usize - 1)
            .map_or("", String::as_str)
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        let index = self.fields.binary_search_by(|f| f.as_str().cmp(name)).ok()?;
        FieldId::new(index as u16 + 1)
    }

    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        self.symbols
            .iter()
            .position(|info| info.name == name && info.named == named)
            .map(|id| id as SymbolId)
    }

    pub fn action(&self, state: StateId, symbol: SymbolId) -> Option<Action> {
        let row = &self.states.get(state as usize)?.actions;
        row.binary_search_by_key(&symbol, |(s, _)| *s)
            .ok()
            .map(|i| row[i].1)
    }

    pub fn goto(&self, state: StateId, symbol: SymbolId) -> Option<StateId> {
        let row = &self.states.get(state as usize)?.gotos;
        row.binary_search_by_key(&symbol, |(s, _)| *s)
            .ok()
            .map(|i| row[i].1)
    }

    pub fn lex_mode(&self, state: StateId) -> LexModeId {
        self.states
            .get(state as usize)
            .map_or(self.error_lex_mode, |s| s.lex_mode)
    }

    /// Terminals with an action in `state`, ascending.
    pub fn expected(&self, state: StateId) -> impl Iterator<Item = SymbolId> + '_ {
        self.states
            .get(state as usize)
            .into_iter()
            .flat_map(|s| s.actions.iter())
            .filter(|(_, action)| !matches!(action, Action::ShiftExtra))
            .map(|(symbol, _)| *symbol)
    }

    pub fn is_extra(&self, symbol: SymbolId) -> bool {
        self.extras.contains(&symbol)
    }
}
