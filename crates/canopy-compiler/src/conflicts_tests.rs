use canopy_core::{Grammar, Rule};

use crate::test_utils::{arithmetic_grammar, compile_ok};
use crate::{Action, CompileError, Resolution, Warning, compile};

fn ambiguous_sum() -> Grammar {
    Grammar::new("ambiguous")
        .rule(
            "expr",
            Rule::choice([
                Rule::seq([Rule::symbol("expr"), Rule::string("+"), Rule::symbol("expr")]),
                Rule::symbol("number"),
            ]),
        )
        .rule("number", Rule::pattern(r"\d+"))
}

fn twin_rules(b: Rule) -> Grammar {
    Grammar::new("twins")
        .rule("start", Rule::choice([Rule::symbol("a"), Rule::symbol("b")]))
        .rule("a", Rule::seq([Rule::symbol("id")]))
        .rule("b", b)
        .rule("id", Rule::pattern("[a-z]+"))
}

#[test]
fn precedence_and_associativity_settle_arithmetic() {
    let compilation = compile_ok(&arithmetic_grammar());

    assert!(compilation.warnings.is_empty());
    assert!(!compilation.conflicts.is_empty());
    for conflict in &compilation.conflicts {
        assert!(conflict.shift);
        assert!(matches!(
            conflict.resolution,
            Resolution::Precedence | Resolution::Associativity
        ));
    }
}

#[test]
fn higher_precedence_operator_shifts() {
    let compilation = compile_ok(&arithmetic_grammar());
    let table = &compilation.table;
    let plus = table.symbol_for_name("+", false).unwrap();
    let times = table.symbol_for_name("*", false).unwrap();

    // After `expr + expr`: `*` binds tighter, `+` is left-associative.
    let after_sum = compilation
        .conflicts
        .iter()
        .find(|c| c.lookahead == times && c.reductions == [0])
        .unwrap();
    assert!(matches!(after_sum.chosen, Action::Shift(_)));
    assert_eq!(after_sum.resolution, Resolution::Precedence);

    let left_assoc = compilation
        .conflicts
        .iter()
        .find(|c| c.lookahead == plus && c.reductions == [0])
        .unwrap();
    assert_eq!(left_assoc.chosen, Action::Reduce(0));
    assert_eq!(left_assoc.resolution, Resolution::Associativity);
}

#[test]
fn unresolved_shift_reduce_shifts_and_warns() {
    let compilation = compile_ok(&ambiguous_sum());

    assert_eq!(compilation.conflicts.len(), 1);
    let conflict = &compilation.conflicts[0];
    assert!(matches!(conflict.chosen, Action::Shift(_)));
    assert_eq!(conflict.resolution, Resolution::Unresolved);
    assert!(!conflict.expected);
    assert!(matches!(
        compilation.warnings.as_slice(),
        [Warning::UnresolvedConflict { .. }]
    ));
}

#[test]
fn declared_conflict_is_silent() {
    let compilation = compile_ok(&ambiguous_sum().conflict(["expr"]));

    assert_eq!(compilation.conflicts.len(), 1);
    assert!(compilation.conflicts[0].expected);
    assert!(compilation.warnings.is_empty());
}

#[test]
fn reduce_reduce_prefers_earlier_rule() {
    let compilation = compile_ok(&twin_rules(Rule::seq([Rule::symbol("id")])));

    let conflict = &compilation.conflicts[0];
    assert!(!conflict.shift);
    assert_eq!(conflict.reductions, [2, 3]);
    assert_eq!(conflict.chosen, Action::Reduce(2));
    assert_eq!(conflict.resolution, Resolution::DeclarationOrder);
    assert_eq!(compilation.warnings.len(), 1);
}

#[test]
fn reduce_reduce_prefers_dynamic_precedence() {
    let b = Rule::prec_dynamic(1, Rule::seq([Rule::symbol("id")]));
    let compilation = compile_ok(&twin_rules(b));

    let conflict = &compilation.conflicts[0];
    assert_eq!(conflict.chosen, Action::Reduce(3));
    assert_eq!(conflict.resolution, Resolution::DynamicPrecedence);
    assert!(compilation.warnings.is_empty());
}

#[test]
fn reduce_reduce_prefers_static_precedence() {
    let b = Rule::prec(5, Rule::seq([Rule::symbol("id")]));
    let compilation = compile_ok(&twin_rules(b));

    let conflict = &compilation.conflicts[0];
    assert_eq!(conflict.chosen, Action::Reduce(3));
    assert_eq!(conflict.resolution, Resolution::Precedence);
}

#[test]
fn reduce_reduce_prefers_left_associative() {
    let b = Rule::prec_left(0, Rule::seq([Rule::symbol("id")]));
    let compilation = compile_ok(&twin_rules(b));

    let conflict = &compilation.conflicts[0];
    assert!(!conflict.shift);
    assert_eq!(conflict.chosen, Action::Reduce(3));
    assert_eq!(conflict.resolution, Resolution::Associativity);
}

#[test]
fn named_precedences_follow_declared_order() {
    let binary = |op: &str| Rule::seq([Rule::symbol("expr"), Rule::string(op), Rule::symbol("expr")]);
    let grammar = Grammar::new("named")
        .rule(
            "expr",
            Rule::choice([
                Rule::prec_left("sum", binary("+")),
                Rule::prec_left("product", binary("*")),
                Rule::symbol("number"),
            ]),
        )
        .rule("number", Rule::pattern(r"\d+"))
        .precedence(["product", "sum"]);

    let compilation = compile_ok(&grammar);
    assert!(compilation.warnings.is_empty());
    let times = compilation.table.symbol_for_name("*", false).unwrap();
    let after_sum = compilation
        .conflicts
        .iter()
        .find(|c| c.lookahead == times && c.reductions == [0])
        .unwrap();
    assert!(matches!(after_sum.chosen, Action::Shift(_)));
}

#[test]
fn undeclared_named_precedence() {
    let grammar = Grammar::new("named")
        .rule(
            "expr",
            Rule::choice([
                Rule::prec_left(
                    "sum",
                    Rule::seq([Rule::symbol("expr"), Rule::string("+"), Rule::symbol("expr")]),
                ),
                Rule::symbol("number"),
            ]),
        )
        .rule("number", Rule::pattern(r"\d+"));

    let err = compile(&grammar).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"ambiguous precedence: precedence `sum` in rule `expr` is not declared in `precedences`"
    );
}

#[test]
fn cyclic_precedence_order() {
    let grammar = arithmetic_grammar()
        .precedence(["a", "b"])
        .precedence(["b", "a"]);

    let err = compile(&grammar).unwrap_err();
    assert!(matches!(err, CompileError::AmbiguousPrecedence(_)));
}

#[test]
fn contradictory_associativity() {
    let binary = |op: &str| Rule::seq([Rule::symbol("expr"), Rule::string(op), Rule::symbol("expr")]);
    let grammar = Grammar::new("mixed")
        .rule(
            "expr",
            Rule::choice([
                Rule::prec_left(1, binary("+")),
                Rule::prec_right(1, binary("-")),
                Rule::symbol("number"),
            ]),
        )
        .rule("number", Rule::pattern(r"\d+"));

    let err = compile(&grammar).unwrap_err();
    assert!(matches!(err, CompileError::AmbiguousPrecedence(_)));
}

#[test]
fn unused_named_precedence_warns() {
    let grammar = arithmetic_grammar().precedence(["unused"]);

    let compilation = compile_ok(&grammar);
    assert_eq!(
        compilation.warnings,
        [Warning::UnusedPrecedence {
            name: "unused".into()
        }]
    );
}
