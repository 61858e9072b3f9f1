//! Grammar fixtures shared by the compiler tests.

use canopy_core::{Grammar, Rule};

use crate::{Compilation, compile};

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

pub fn compile_ok(grammar: &Grammar) -> Compilation {
    match compile(grammar) {
        Ok(compilation) => compilation,
        Err(err) => panic!("grammar `{}` failed to compile: {err}", grammar.name),
    }
}
