//! Canopy runtime: incremental, error-tolerant parsing with compiled
//! grammar tables.
//!
//! - [`Language`]: a loaded grammar (parse table plus lexer automaton)
//! - [`Parser`]: LR driver with error recovery, cancellation and subtree reuse
//! - [`Tree`], [`Node`], [`TreeCursor`]: immutable syntax trees
//!
//! Parsing never fails on bad input: unexpected text becomes `ERROR` nodes
//! and absent tokens become zero-width `MISSING` nodes.
//!
//! ```ignore
//! let language = Language::from_grammar_json(json)?;
//! let tree = canopy_runtime::parse(&language, "1+2")?;
//! let (edit, text) = InputEdit::splice(tree.source(), 2..3, b"20");
//! let tree = canopy_runtime::reparse(&language, &tree, &edit, text)?;
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod diagnostics;
mod edit;
mod error;
mod language;
pub mod lexer;
mod parser;
mod tree;

#[cfg(test)]
mod diagnostics_tests;
#[cfg(test)]
mod incremental_tests;
#[cfg(test)]
mod language_tests;
#[cfg(test)]
mod recovery_tests;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tree_tests;

pub use diagnostics::ErrorPrinter;
pub use edit::{InputEdit, Point};
pub use error::{Error, LoadError};
pub use language::Language;
pub use lexer::{ExternalScanner, ScanInput};
pub use parser::{CancellationFlag, DEFAULT_RECOVERY_DEPTH, Parser};
pub use tree::{Node, SyntaxError, SyntaxErrorKind, Tree, TreeCursor};

/// Parse `source` from scratch with default options.
pub fn parse(language: &Language, source: impl Into<Vec<u8>>) -> Result<Tree, Error> {
    Parser::new(language).parse(source)
}

/// Re-parse after `edit`, reusing what `old` has in common with the result.
pub fn reparse(
    language: &Language,
    old: &Tree,
    edit: &InputEdit,
    source: impl Into<Vec<u8>>,
) -> Result<Tree, Error> {
    Parser::new(language).reparse(old, edit, source)
}
