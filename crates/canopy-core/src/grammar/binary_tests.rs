use super::*;

#[test]
fn roundtrip() {
    let grammar = Grammar::new("sum")
        .rule(
            "expr",
            Rule::seq([Rule::symbol("number"), Rule::string("+")]),
        )
        .rule("number", Rule::pattern(r"\d+"))
        .extra(Rule::pattern(r"\s"));

    let binary = grammar.to_binary().unwrap();
    let decoded = Grammar::from_binary(&binary).unwrap();

    assert_eq!(decoded, grammar);
}

#[test]
fn truncated_input_is_an_error() {
    let grammar = Grammar::new("tiny").rule("root", Rule::string("x"));
    let binary = grammar.to_binary().unwrap();

    let err = Grammar::from_binary(&binary[..binary.len() / 2]).unwrap_err();
    assert!(matches!(err, GrammarError::Binary(_)));
}
