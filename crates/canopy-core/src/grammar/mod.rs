//! Grammar source model for tree-sitter style grammars.
//!
//! Represents `grammar.json` files, with JSON deserialization, a compact
//! binary encoding, and builder helpers that mirror the grammar DSL.

mod binary;
mod build;
mod json;
mod types;

#[cfg(test)]
mod binary_tests;
#[cfg(test)]
mod json_tests;

pub use json::GrammarError;
pub use types::{Grammar, Precedence, PrecedenceEntry, Rule};
