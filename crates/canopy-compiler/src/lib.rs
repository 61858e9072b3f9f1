//! Canopy grammar compiler: `grammar.json` in, LALR(1) parse table out.
//!
//! The pipeline runs these passes in order:
//! - `intern` - resolve names, substitute inline rules, report unreachable rules
//! - `extract` - split lexical tokens from syntax rules
//! - `lexical` - lower tokens to validated regex patterns
//! - `flatten` - expand rules into flat productions
//! - `first` - nullable/FIRST sets, cyclic derivation check
//! - `lr` - LALR(1) item sets and lookaheads
//! - `conflicts` - action rows and the conflict decision table
//! - `build` - assemble the [`GrammarTable`]

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod artifact;
mod build;
mod conflicts;
mod error;
mod extract;
mod first;
mod flatten;
mod intern;
mod lexical;
mod lr;
mod precedence;
mod rules;
mod table;

#[cfg(test)]
mod artifact_tests;
#[cfg(test)]
mod conflicts_tests;
#[cfg(test)]
mod test_utils;

pub use artifact::{ArtifactError, HEADER_SIZE, MAGIC, VERSION};
pub use conflicts::{Conflict, Resolution};
pub use error::{CompileError, Warning};
pub use table::{
    Action, AliasInfo, ChildInfo, GrammarTable, LexMode, ParseState, Production, SymbolInfo,
    SymbolKind, TokenDef,
};

use canopy_core::Grammar;

use crate::error::Warnings;
use crate::first::FirstSets;
use crate::precedence::PrecedenceOrder;

/// Output of a successful compilation.
#[derive(Debug)]
pub struct Compilation {
    pub table: GrammarTable,
    pub warnings: Vec<Warning>,
    /// Every conflict met while building the table, with how it was settled.
    pub conflicts: Vec<Conflict>,
}

/// Compile a grammar into a parse table.
pub fn compile(grammar: &Grammar) -> Result<Compilation, CompileError> {
    let mut warnings = Warnings::default();

    let interned = intern::intern(grammar, &mut warnings)?;
    let extracted = extract::extract_tokens(interned)?;
    let tokens = lexical::build_tokens(&extracted.lexical_variables)?;
    let mut syntax = flatten::flatten(extracted);
    build::check_limit("symbols", syntax.symbol_count())?;

    precedence::apply_symbol_levels(&mut syntax);
    let order = PrecedenceOrder::new(&syntax, &mut warnings)?;
    let first = FirstSets::compute(&syntax);
    first::check_cycles(&syntax, &first)?;

    let automaton = lr::build(&syntax, &first);
    build::check_limit("parse states", automaton.states.len())?;
    build::check_limit("productions", automaton.productions.len())?;

    let (rows, conflicts) = conflicts::resolve(&syntax, &automaton, &order, &mut warnings)?;
    let table = build::build_table(&grammar.name, &syntax, tokens, &automaton, rows)?;

    tracing::debug!(
        grammar = %grammar.name,
        warnings = warnings.len(),
        "compiled grammar"
    );
    Ok(Compilation {
        table,
        warnings: warnings.into_vec(),
        conflicts,
    })
}

/// Parse `grammar.json` text and compile it.
pub fn compile_json(json: &str) -> Result<Compilation, CompileError> {
    compile(&Grammar::from_json(json)?)
}
