use crate::test_utils::{language, parse, sum_grammar};

#[test]
fn no_errors_render_nothing() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+2");

    assert!(tree.render_errors().is_empty());
}

#[test]
fn unexpected_input() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+#2");

    let result = tree.error_printer().path("input.sum").render();
    assert!(result.starts_with("error: unexpected input"), "{result}");
    assert!(result.contains(" --> input.sum:1:3"), "{result}");
    assert!(result.contains("1 | 1+#2"), "{result}");
    assert!(result.contains('^'), "{result}");
}

#[test]
fn missing_token_at_end_of_input() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+");

    let result = tree.render_errors();
    assert!(result.starts_with("error: missing number"), "{result}");
    assert!(result.contains("1 | 1+"), "{result}");
}

#[test]
fn one_report_per_error() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+#2+");

    let result = tree.render_errors();
    assert_eq!(result.matches("error: ").count(), 2, "{result}");
    let unexpected = result.find("unexpected input").unwrap();
    let missing = result.find("missing number").unwrap();
    assert!(unexpected < missing);
}

#[test]
fn colored_output() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+#2");

    let result = tree.error_printer().colored(true).render();
    assert!(result.contains("unexpected input"));
    assert!(result.contains('\x1b'));
}

#[test]
fn non_utf8_source_falls_back_to_plain_lines() {
    let language = language(&sum_grammar());
    let tree = crate::parse(&language, b"1+\xff2".as_slice()).unwrap();

    insta::assert_snapshot!(tree.render_errors(), @"2..3: unexpected input");
}
