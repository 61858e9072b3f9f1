use indoc::indoc;

use crate::test_utils::{
    arithmetic_grammar, assert_covers_source, language, list_grammar, parse, sum_grammar,
};
use crate::{DEFAULT_RECOVERY_DEPTH, Parser, SyntaxError, SyntaxErrorKind};

fn missing(kind: &str, at: usize) -> SyntaxError {
    SyntaxError {
        kind: SyntaxErrorKind::Missing(kind.to_string()),
        range: at..at,
    }
}

#[test]
fn missing_operand_at_end() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+");

    insta::assert_snapshot!(tree.to_sexp(), @"(expr (number) (MISSING number))");
    assert_eq!(tree.root_node().byte_range(), 0..2);
    assert!(tree.root_node().has_error());
    assert_eq!(tree.errors(), [missing("number", 2)]);
}

#[test]
fn empty_input_gets_a_missing_token() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "");

    insta::assert_snapshot!(tree.to_sexp(), @"(expr (MISSING number))");
    assert_eq!(tree.errors(), [missing("number", 0)]);
}

#[test]
fn missing_operand_between_operators() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1++2");

    insta::assert_snapshot!(tree.to_sexp(), @"(expr (number) (MISSING number) (number))");
    assert_eq!(tree.errors(), [missing("number", 2)]);
    assert_covers_source(&tree);
}

#[test]
fn unknown_byte_becomes_error_node() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+#2");

    insta::assert_snapshot!(tree.to_sexp(), @"(expr (number) (ERROR) (number))");
    assert_eq!(
        tree.dump(),
        indoc! {r##"
            expr 0..4
              number 0..1 "1"
              "+" 1..2
              ERROR 2..3 "#"
              number 3..4 "2"
        "##}
    );
    let errors = tree.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SyntaxErrorKind::Unexpected);
    assert_eq!(errors[0].range, 2..3);

    let error = tree.root_node().named_child(1).unwrap();
    assert!(error.is_error());
    assert!(error.is_extra());
}

#[test]
fn consecutive_garbage_merges_into_one_error() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+#$%2");

    let errors = tree.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].range, 2..5);
    assert_covers_source(&tree);
}

#[test]
fn missing_closing_paren() {
    let language = language(&list_grammar());
    let tree = parse(&language, "(a b");

    insta::assert_snapshot!(tree.to_sexp(), @r#"(document (list (word) (word) (MISSING ")")))"#);
    assert_eq!(tree.errors(), [missing(")", 4)]);
}

#[test]
fn trailing_operator_in_arithmetic() {
    let language = language(&arithmetic_grammar());
    let tree = parse(&language, "1*");

    insta::assert_snapshot!(tree.to_sexp(), @"(expr (expr (number)) (expr (MISSING number)))");
}

#[test]
fn leaves_always_cover_the_input() {
    let language = language(&list_grammar());
    let inputs = [
        "",
        ")",
        "((((",
        "))))",
        "(a ) ) (",
        "# $ %",
        "(1 # 2) ) ((",
        "a\u{e9}b",
        "\u{0}\u{1}(",
    ];
    for input in inputs {
        let tree = parse(&language, input);
        assert_covers_source(&tree);
        assert_eq!(tree.root_node().byte_range(), 0..input.len(), "{input:?}");
    }
}

#[test]
fn arbitrary_bytes_terminate() {
    let language = language(&sum_grammar());
    // deterministic pseudo-random inputs over the grammar's bytes and noise
    let alphabet = b"0123456789++  #\xff\n";
    let mut seed: u32 = 0x2545_f491;
    for len in 0..64 {
        let mut input = Vec::with_capacity(len);
        for _ in 0..len {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            input.push(alphabet[seed as usize % alphabet.len()]);
        }
        let tree = crate::parse(&language, input.clone()).unwrap();
        assert_covers_source(&tree);
        assert_eq!(tree.root_node().end_byte(), input.len());
    }
}

#[test]
fn shallow_recovery_depth_still_terminates() {
    let language = language(&list_grammar());
    let mut parser = Parser::new(&language);
    parser.set_recovery_depth(0);

    let tree = parser.parse("((a) ) ) b").unwrap();
    assert_covers_source(&tree);
    assert!(tree.root_node().has_error());
}

#[test]
fn stray_close_paren_gets_an_opening_partner() {
    let language = language(&list_grammar());
    let tree = parse(&language, "a ) b");

    insta::assert_snapshot!(
        tree.to_sexp(),
        @r#"(document (word) (list (MISSING "(")) (word))"#
    );
    assert_eq!(tree.errors(), [missing("(", 2)]);
    assert_covers_source(&tree);
}

#[test]
fn nesting_deeper_than_recovery_depth_is_reported() {
    let language = language(&list_grammar());
    let source = "(".repeat(DEFAULT_RECOVERY_DEPTH + 44);
    let tree = parse(&language, &source);

    assert!(tree.root_node().has_error());
    assert_eq!(
        tree.errors(),
        [SyntaxError {
            kind: SyntaxErrorKind::Unexpected,
            range: 0..source.len(),
        }]
    );
    assert!(tree.render_errors().starts_with("error: unexpected input"));
    assert_covers_source(&tree);
}
