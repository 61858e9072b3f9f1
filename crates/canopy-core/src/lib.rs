#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by the Canopy compiler and runtime.
//!
//! - **Grammar source** (`grammar`): 1:1 model of tree-sitter's `grammar.json`,
//!   with JSON and compact binary encodings.
//! - **Identifiers**: the numeric ids that flow between the compiled table
//!   and the runtime (symbols, states, productions, fields).
//! - **Sets**: `TokenSet` bitsets over symbol ids.

use std::num::NonZeroU16;

pub mod grammar;
mod token_set;


pub use grammar::{Grammar, GrammarError, Precedence, PrecedenceEntry, Rule};
pub use token_set::TokenSet;

// ============================================================================
// Common Types
// ============================================================================

/// Grammar symbol id (terminals first, then non-terminals).
pub type SymbolId = u16;

/// Parse automaton state id.
pub type StateId = u16;

/// Index into the production list, in grammar declaration order.
pub type ProductionId = u16;

/// Index into the lex mode list.
pub type LexModeId = u16;

/// Field id. Zero is reserved for "no field", like tree-sitter.
pub type FieldId = NonZeroU16;

/// Symbol of the end-of-input token.
pub const END_SYMBOL: SymbolId = 0;

/// Symbol of `ERROR` nodes and unrecognized-byte tokens.
pub const ERROR_SYMBOL: SymbolId = u16::MAX;
