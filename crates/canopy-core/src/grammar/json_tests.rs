use super::*;

#[test]
fn parse_minimal_grammar() {
    let json = r#"{
        "name": "sum",
        "rules": {
            "expr": { "type": "SYMBOL", "name": "number" },
            "number": { "type": "PATTERN", "value": "\\d+" }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.name, "sum");
    assert_eq!(grammar.rules.len(), 2);
    assert_eq!(grammar.rules[1].1, Rule::pattern(r"\d+"));
}

#[test]
fn parse_nested_rules() {
    let json = r#"{
        "name": "sum",
        "rules": {
            "expr": {
                "type": "PREC_LEFT",
                "value": 1,
                "content": {
                    "type": "SEQ",
                    "members": [
                        { "type": "FIELD", "name": "left", "content": { "type": "SYMBOL", "name": "expr" } },
                        { "type": "STRING", "value": "+" },
                        { "type": "REPEAT1", "content": { "type": "BLANK" } },
                        { "type": "IMMEDIATE_TOKEN", "content": { "type": "STRING", "value": "!" } }
                    ]
                }
            }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    let expected = Rule::prec_left(
        1,
        Rule::seq([
            Rule::field("left", Rule::symbol("expr")),
            Rule::string("+"),
            Rule::repeat1(Rule::blank()),
            Rule::immediate_token(Rule::string("!")),
        ]),
    );
    assert_eq!(grammar.rules[0].1, expected);
}

#[test]
fn parse_named_precedences_and_aliases() {
    let json = r#"{
        "name": "ops",
        "precedences": [[
            { "type": "STRING", "value": "product" },
            { "type": "SYMBOL", "name": "sum" }
        ]],
        "rules": {
            "sum": {
                "type": "PREC",
                "value": "product",
                "content": {
                    "type": "ALIAS",
                    "value": "plus",
                    "named": true,
                    "content": { "type": "STRING", "value": "+" }
                }
            }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(
        grammar.precedences,
        vec![vec![
            PrecedenceEntry::Name("product".into()),
            PrecedenceEntry::Symbol("sum".into()),
        ]]
    );
    assert_eq!(
        grammar.rules[0].1,
        Rule::prec("product", Rule::alias(Rule::string("+"), "plus", true))
    );
}

#[test]
fn preserves_rule_order() {
    let json = r#"{
        "name": "order",
        "rules": {
            "program": { "type": "SYMBOL", "name": "statement" },
            "statement": { "type": "SYMBOL", "name": "expression" },
            "expression": { "type": "STRING", "value": "x" }
        }
    }"#;

    let grammar = Grammar::from_json(json).unwrap();

    // Start rule first, not alphabetical.
    assert_eq!(grammar.rules[0].0, "program");
    assert_eq!(grammar.rules[1].0, "statement");
    assert_eq!(grammar.rules[2].0, "expression");
}

#[test]
fn rejects_unknown_rule_type() {
    let json = r#"{
        "name": "bad",
        "rules": { "root": { "type": "LOOKAHEAD", "value": "x" } }
    }"#;

    let err = Grammar::from_json(json).unwrap_err();
    assert!(matches!(err, GrammarError::Json(_)));
    assert!(err.to_string().starts_with("invalid grammar.json"));
}
