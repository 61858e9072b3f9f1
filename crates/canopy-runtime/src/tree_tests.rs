use crate::test_utils::{assignment_grammar, language, list_grammar, parse, sum_grammar};
use crate::{Point, Tree};

const PROGRAM: &str = "a = 1;\nb = a;";

#[test]
fn root_node() {
    let language = language(&assignment_grammar());
    let tree = parse(&language, PROGRAM);
    let root = tree.root_node();

    assert_eq!(root.kind(), "program");
    assert!(root.is_named());
    assert!(root.parent().is_none());
    assert_eq!(root.byte_range(), 0..PROGRAM.len());
    assert_eq!(root.start_position(), Point::new(0, 0));
    assert_eq!(root.end_position(), Point::new(1, 6));
    assert_eq!(root.end_position().to_string(), "1:6");
    assert_eq!(root.child_count(), 2);
    assert_eq!(root.named_child_count(), 2);
}

#[test]
fn anonymous_children_are_listed() {
    let language = language(&assignment_grammar());
    let tree = parse(&language, PROGRAM);
    let first = tree.root_node().child(0).unwrap();

    let kinds: Vec<&str> = first.children().iter().map(|n| n.kind()).collect();
    assert_eq!(kinds, ["name", "=", "number", ";"]);
    assert_eq!(first.named_child_count(), 2);
    assert_eq!(first.utf8_text().unwrap(), "a = 1;");
    assert!(!first.child(1).unwrap().is_named());
    assert!(first.child(4).is_none());
}

#[test]
fn siblings_and_parents() {
    let language = language(&assignment_grammar());
    let tree = parse(&language, PROGRAM);
    let first = tree.root_node().child(0).unwrap();
    let name = first.child(0).unwrap();

    assert_eq!(name.next_sibling().unwrap().kind(), "=");
    assert_eq!(name.next_named_sibling().unwrap().kind(), "number");
    assert!(name.prev_sibling().is_none());
    assert_eq!(name.parent(), Some(first));

    let semicolon = first.child(3).unwrap();
    assert_eq!(semicolon.prev_named_sibling(), first.named_child(1));
    assert!(semicolon.next_sibling().is_none());
    assert_eq!(first.next_sibling(), tree.root_node().child(1));
}

#[test]
fn missing_nodes_have_parents_and_siblings() {
    let language = language(&assignment_grammar());
    let tree = parse(&language, "a=b;=c;");
    let first = tree.root_node().child(0).unwrap();
    let second = tree.root_node().child(1).unwrap();
    let missing = second.child(0).unwrap();

    assert!(missing.is_missing());
    assert_eq!(missing.byte_range(), 4..4);
    assert_eq!(missing.field_name(), Some("left"));
    assert_eq!(missing.parent(), Some(second));
    assert!(missing.prev_sibling().is_none());
    assert_eq!(missing.next_sibling().unwrap().kind(), "=");
    assert_eq!(second.prev_sibling(), Some(first));
    assert!(first.child(3).unwrap().next_sibling().is_none());
}

#[test]
fn fields() {
    let language = language(&assignment_grammar());
    let tree = parse(&language, PROGRAM);
    let first = tree.root_node().child(0).unwrap();

    let right = first.child_by_field_name("right").unwrap();
    assert_eq!(right.field_name(), Some("right"));
    assert_eq!(right.utf8_text().unwrap(), "1");
    assert_eq!(first.children_by_field_name("left").len(), 1);
    assert!(first.child_by_field_name("middle").is_none());
    assert!(first.child(1).unwrap().field_name().is_none());
}

#[test]
fn cursor_walk() {
    let language = language(&assignment_grammar());
    let tree = parse(&language, PROGRAM);
    let mut cursor = tree.walk();

    assert_eq!(cursor.depth(), 0);
    assert!(!cursor.goto_next_sibling());
    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().kind(), "assignment");
    assert!(cursor.goto_first_child());
    assert_eq!(cursor.depth(), 2);
    assert_eq!(cursor.field_name(), Some("left"));
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.node().kind(), "=");
    assert!(cursor.goto_previous_sibling());
    assert!(!cursor.goto_previous_sibling());
    assert!(!cursor.goto_first_child());

    assert!(cursor.goto_parent());
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.node().byte_range(), 7..13);
    assert!(!cursor.goto_next_sibling());
    assert!(cursor.goto_parent());
    assert!(!cursor.goto_parent());
}

#[test]
fn cursor_seeks_by_byte() {
    let language = language(&assignment_grammar());
    let tree = parse(&language, PROGRAM);
    let mut cursor = tree.walk();

    assert_eq!(cursor.goto_first_child_for_byte(8), Some(1));
    assert_eq!(cursor.goto_first_child_for_byte(11), Some(2));
    assert_eq!(cursor.node().utf8_text().unwrap(), "a");

    cursor.reset(tree.root_node());
    assert_eq!(cursor.depth(), 0);
    assert_eq!(cursor.goto_first_child_for_byte(100), None);
}

#[test]
fn node_cursor_starts_at_the_node() {
    let language = language(&assignment_grammar());
    let tree = parse(&language, PROGRAM);
    let second = tree.root_node().child(1).unwrap();
    let mut cursor = second.walk();

    assert_eq!(cursor.node(), second);
    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().utf8_text().unwrap(), "b");
}

#[test]
fn structural_equality() {
    let language = language(&sum_grammar());
    let a = parse(&language, "1+2");
    let b = parse(&language, "1+2");
    let c = parse(&language, "1+3");
    let d = parse(&language, "1+23");

    assert_eq!(a, b);
    assert!(!Tree::ptr_eq(&a, &b));
    // equal shapes and lengths, different text
    assert_eq!(a, c);
    assert_ne!(a, d);
    assert_eq!(format!("{a:?}"), "(expr (number) (number))");
}

#[test]
fn changed_ranges_of_a_longer_token() {
    let language = language(&sum_grammar());
    let old = parse(&language, "1+2+3");
    let new = parse(&language, "1+20+3");

    assert_eq!(Tree::changed_ranges(&old, &new), [2..4]);
    assert!(Tree::changed_ranges(&old, &old.clone()).is_empty());
}

#[test]
fn changed_ranges_for_appended_operands() {
    let language = language(&sum_grammar());
    let old = parse(&language, "1");
    let new = parse(&language, "1+2");

    assert_eq!(Tree::changed_ranges(&old, &new), [1..3]);
}

#[test]
fn node_kind_ids() {
    let language = language(&sum_grammar());
    let tree = parse(&language, "1+2");
    let number = tree.root_node().child(0).unwrap();

    assert_eq!(number.kind_id(), 1);
    assert_eq!(language.symbol_name(number.kind_id()), "number");
    assert!(!number.is_extra());
    assert!(!number.is_missing());
    assert_eq!(number.to_sexp(), "(number)");
}

#[test]
fn deep_nesting_prints_iteratively() {
    let language = language(&list_grammar());
    let depth = 50_000;
    let source = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
    let tree = parse(&language, &source);

    let sexp = tree.to_sexp();
    assert!(sexp.starts_with("(document (list (list "));
    assert!(sexp.ends_with(&")".repeat(depth + 1)));
    assert_eq!(sexp.matches("(list").count(), depth);
    assert!(format!("{tree:?}") == sexp);
}
