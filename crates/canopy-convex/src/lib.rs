//! The Convex Lisp grammar.
//!
//! The grammar ships as tree-sitter style JSON (`grammar.json`) and is
//! compiled once, on first use, into a [`Language`] for `canopy-runtime`.

use std::sync::LazyLock;

use canopy_core::Grammar;
use canopy_runtime::{Language, LoadError};

/// Grammar source in tree-sitter JSON form.
pub const GRAMMAR_JSON: &str = include_str!("../grammar.json");

/// File extensions Convex sources use.
pub const EXTENSIONS: &[&str] = &["cvx", "con"];

static LANGUAGE: LazyLock<Language> = LazyLock::new(|| {
    Language::from_grammar_json(GRAMMAR_JSON).expect("bundled Convex grammar compiles")
});

/// The compiled Convex language. Cloning is cheap; every call shares one table.
pub fn language() -> Language {
    LANGUAGE.clone()
}

/// Compile the bundled grammar without caching, surfacing any load error.
pub fn try_language() -> Result<Language, LoadError> {
    Language::from_grammar_json(GRAMMAR_JSON)
}

/// The declarative grammar, for tools that want to inspect or extend it.
pub fn grammar() -> Result<Grammar, canopy_core::GrammarError> {
    Grammar::from_json(GRAMMAR_JSON)
}

/// Whether a file extension (without the dot) names a Convex source.
pub fn is_convex_extension(ext: &str) -> bool {
    EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
