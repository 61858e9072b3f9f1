//! Loaded grammars.
//!
//! A [`Language`] is a compiled [`GrammarTable`] plus the lexer automaton
//! built from its token patterns. It is immutable and cheap to clone; every
//! parse of the same grammar shares one.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use canopy_compiler::{GrammarTable, compile, compile_json};
use canopy_core::{FieldId, Grammar, SymbolId};
use regex_automata::MatchKind;
use regex_automata::dfa::{StartKind, dense};

use crate::LoadError;
use crate::lexer::ExternalScanner;

type ScannerFactory = dyn Fn() -> Box<dyn ExternalScanner> + Send + Sync;

#[derive(Clone)]
pub struct Language {
    inner: Arc<LanguageInner>,
}

#[derive(Clone)]
struct LanguageInner {
    table: GrammarTable,
    /// One anchored pattern per lexical token, pattern `i` is symbol `i + 1`.
    /// `None` when the grammar has no lexical tokens.
    dfa: Option<dense::DFA<Vec<u32>>>,
    scanner: Option<Arc<ScannerFactory>>,
}

impl Language {
    pub fn from_table(table: GrammarTable) -> Result<Self, LoadError> {
        let dfa = build_dfa(&table)?;
        tracing::debug!(
            grammar = %table.name,
            symbols = table.symbols.len(),
            states = table.states.len(),
            lex_modes = table.lex_modes.len(),
            dfa_bytes = dfa.as_ref().map_or(0, |d| d.memory_usage()),
            "loaded language"
        );
        Ok(Self {
            inner: Arc::new(LanguageInner {
                table,
                dfa,
                scanner: None,
            }),
        })
    }

    pub fn from_grammar(grammar: &Grammar) -> Result<Self, LoadError> {
        Self::from_table(compile(grammar)?.table)
    }

    pub fn from_grammar_json(json: &str) -> Result<Self, LoadError> {
        Self::from_table(compile_json(json)?.table)
    }

    /// Load a table written by [`GrammarTable::to_artifact`].
    pub fn from_artifact(bytes: &[u8]) -> Result<Self, LoadError> {
        Self::from_table(GrammarTable::from_artifact(bytes)?)
    }

    /// Memory-map and load an artifact file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read once and dropped before returning;
        // the table is decoded into owned memory.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_artifact(&map)
    }

    /// Attach the external scanner for this grammar's `externals`. Each parse
    /// calls `factory` once for a fresh scanner.
    pub fn with_external_scanner<F>(self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ExternalScanner> + Send + Sync + 'static,
    {
        let mut inner = Arc::unwrap_or_clone(self.inner);
        inner.scanner = Some(Arc::new(factory));
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn table(&self) -> &GrammarTable {
        &self.inner.table
    }

    pub fn name(&self) -> &str {
        &self.inner.table.name
    }

    pub fn symbol_count(&self) -> usize {
        self.inner.table.symbols.len()
    }

    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        self.inner.table.symbol_name(symbol)
    }

    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<SymbolId> {
        self.inner.table.symbol_for_name(kind, named)
    }

    pub fn field_name(&self, field: FieldId) -> &str {
        self.inner.table.field_name(field)
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.inner.table.field_id(name)
    }

    /// Two handles to the same loaded language.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn dfa(&self) -> Option<&dense::DFA<Vec<u32>>> {
        self.inner.dfa.as_ref()
    }

    pub(crate) fn new_scanner(&self) -> Option<Box<dyn ExternalScanner>> {
        self.inner.scanner.as_ref().map(|factory| factory())
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("symbols", &self.symbol_count())
            .field("states", &self.table().states.len())
            .field("external_scanner", &self.inner.scanner.is_some())
            .finish()
    }
}

fn build_dfa(table: &GrammarTable) -> Result<Option<dense::DFA<Vec<u32>>>, LoadError> {
    if table.tokens.is_empty() {
        return Ok(None);
    }
    let patterns: Vec<&str> = table.tokens.iter().map(|t| t.pattern.as_str()).collect();
    let dfa = dense::Builder::new()
        .configure(
            dense::DFA::config()
                .match_kind(MatchKind::All)
                .start_kind(StartKind::Anchored),
        )
        .build_many(&patterns)
        .map_err(|e| LoadError::Lexer(e.to_string()))?;
    Ok(Some(dfa))
}
