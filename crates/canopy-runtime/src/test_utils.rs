//! Grammar fixtures shared by the runtime tests.

use canopy_core::{Grammar, Rule};

use crate::lexer::{ExternalScanner, ScanInput};
use crate::{Language, Tree};

/// `expr := NUMBER ('+' NUMBER)*`
pub fn sum_grammar() -> Grammar {
    Grammar::new("sum")
        .rule(
            "expr",
            Rule::seq([
                Rule::symbol("number"),
                Rule::repeat(Rule::seq([Rule::string("+"), Rule::symbol("number")])),
            ]),
        )
        .rule("number", Rule::pattern(r"\d+"))
}

/// Binary `+` and `*` with the usual precedence, both left-associative.
pub fn arithmetic_grammar() -> Grammar {
    let binary = |op: &str| Rule::seq([Rule::symbol("expr"), Rule::string(op), Rule::symbol("expr")]);
    Grammar::new("arithmetic")
        .rule(
            "expr",
            Rule::choice([
                Rule::prec_left(1, binary("+")),
                Rule::prec_left(2, binary("*")),
                Rule::symbol("number"),
            ]),
        )
        .rule("number", Rule::pattern(r"\d+"))
}

/// Nested parenthesized lists of numbers and words, whitespace between.
pub fn list_grammar() -> Grammar {
    Grammar::new("list")
        .rule("document", Rule::repeat(Rule::symbol("_item")))
        .rule(
            "_item",
            Rule::choice([
                Rule::symbol("number"),
                Rule::symbol("word"),
                Rule::symbol("list"),
            ]),
        )
        .rule(
            "list",
            Rule::seq([
                Rule::string("("),
                Rule::repeat(Rule::symbol("_item")),
                Rule::string(")"),
            ]),
        )
        .rule("number", Rule::pattern(r"\d+"))
        .rule("word", Rule::pattern(r"[a-z]+"))
        .extra(Rule::pattern(r"\s"))
}

/// `name = value;` statements with fields and an alias.
pub fn assignment_grammar() -> Grammar {
    Grammar::new("assignment")
        .rule("program", Rule::repeat(Rule::symbol("assignment")))
        .rule(
            "assignment",
            Rule::seq([
                Rule::field("left", Rule::alias(Rule::symbol("identifier"), "name", true)),
                Rule::string("="),
                Rule::field("right", Rule::symbol("_value")),
                Rule::string(";"),
            ]),
        )
        .rule(
            "_value",
            Rule::choice([Rule::symbol("number"), Rule::symbol("identifier")]),
        )
        .rule("identifier", Rule::pattern(r"[a-z]+"))
        .rule("number", Rule::pattern(r"\d+"))
        .extra(Rule::pattern(r"\s"))
}

/// Words and `<<...>>` blocks, the blocks scanned by [`BlockScanner`].
pub fn block_grammar() -> Grammar {
    Grammar::new("blocks")
        .rule(
            "document",
            Rule::repeat(Rule::choice([Rule::symbol("word"), Rule::symbol("block")])),
        )
        .rule("word", Rule::pattern(r"[a-z]+"))
        .external(Rule::symbol("block"))
        .extra(Rule::pattern(r"\s"))
}

/// Scans `<<` up to the matching `>>`. Counts the blocks it produced, so
/// its state changes after every block.
#[derive(Default)]
pub struct BlockScanner {
    pub blocks: u8,
}

impl ExternalScanner for BlockScanner {
    fn scan(&mut self, input: &mut ScanInput<'_>, valid: &[bool]) -> bool {
        if !valid[0] {
            return false;
        }
        for _ in 0..2 {
            if input.lookahead() != Some(b'<') {
                return false;
            }
            input.advance();
        }
        let mut closing = 0;
        while let Some(byte) = input.lookahead() {
            input.advance();
            closing = if byte == b'>' { closing + 1 } else { 0 };
            if closing == 2 {
                input.mark_end();
                input.set_result(0);
                self.blocks = self.blocks.wrapping_add(1);
                return true;
            }
        }
        false
    }

    fn serialize(&self) -> Vec<u8> {
        vec![self.blocks]
    }

    fn deserialize(&mut self, state: &[u8]) {
        self.blocks = state.first().copied().unwrap_or(0);
    }
}

pub fn language(grammar: &Grammar) -> Language {
    match Language::from_grammar(grammar) {
        Ok(language) => language,
        Err(err) => panic!("grammar `{}` failed to load: {err}", grammar.name),
    }
}

pub fn block_language() -> Language {
    language(&block_grammar()).with_external_scanner(|| Box::new(BlockScanner::default()))
}

pub fn parse(language: &Language, source: &str) -> Tree {
    match crate::parse(language, source) {
        Ok(tree) => tree,
        Err(err) => panic!("parse of {source:?} failed: {err}"),
    }
}

/// Leaf texts concatenate to the source.
pub fn assert_covers_source(tree: &Tree) {
    let ranges = tree.leaf_ranges();
    let mut offset = 0;
    for range in &ranges {
        assert_eq!(range.start, offset, "gap or overlap in {ranges:?}");
        offset = range.end;
    }
    assert_eq!(offset, tree.source().len(), "leaves stop short in {ranges:?}");
}
