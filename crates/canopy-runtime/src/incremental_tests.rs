use std::ops::Range;
use std::sync::Arc;

use canopy_core::SymbolId;

use crate::test_utils::{block_language, language, list_grammar, parse, sum_grammar};
use crate::tree::green::GreenNode;
use crate::{CancellationFlag, Error, InputEdit, Language, Parser, Point, Tree};

/// Apply the edit, re-parse, and check the result against a fresh parse.
fn reparse_matches_fresh(language: &Language, old: &Tree, range: Range<usize>, text: &str) -> Tree {
    let (edit, source) = InputEdit::splice(old.source(), range.clone(), text.as_bytes());
    let new = crate::reparse(language, old, &edit, source.clone()).unwrap();
    let fresh = crate::parse(language, source).unwrap();

    let context = format!(
        "{:?} with {range:?} replaced by {text:?}",
        String::from_utf8_lossy(old.source())
    );
    assert_eq!(new, fresh, "{context}");
    assert_eq!(new.dump(), fresh.dump(), "{context}");
    assert_eq!(new.leaf_ranges(), fresh.leaf_ranges(), "{context}");
    new
}

fn find_green<'t>(tree: &'t Tree, symbol: SymbolId, range: Range<usize>) -> Option<&'t Arc<GreenNode>> {
    let mut stack = vec![(tree.green(), 0usize)];
    while let Some((node, start)) = stack.pop() {
        if node.symbol == symbol && (start..start + node.len) == range {
            return Some(node);
        }
        let mut offset = start;
        for child in &node.children {
            stack.push((child, offset));
            offset += child.len;
        }
    }
    None
}

#[test]
fn splice_builds_the_edit() {
    let (edit, text) = InputEdit::splice(b"ab\ncd", 3..4, b"xy\nz");

    assert_eq!(text, b"ab\nxy\nzd");
    assert_eq!(edit.start_byte, 3);
    assert_eq!(edit.old_end_byte, 4);
    assert_eq!(edit.new_end_byte, 7);
    assert_eq!(edit.start_position, Point::new(1, 0));
    assert_eq!(edit.old_end_position, Point::new(1, 1));
    assert_eq!(edit.new_end_position, Point::new(2, 1));
}

#[test]
#[should_panic(expected = "splice range 2..5 is outside the text (3 bytes)")]
fn splice_range_past_the_text() {
    InputEdit::splice(b"1+2", 2..5, b"");
}

#[test]
fn unchanged_text_returns_the_old_tree() {
    let language = language(&sum_grammar());
    let old = parse(&language, "1+2");
    let (edit, text) = InputEdit::splice(old.source(), 2..3, b"2");

    let new = crate::reparse(&language, &old, &edit, text).unwrap();
    assert!(Tree::ptr_eq(&old, &new));
}

#[test]
fn sum_edits() {
    let language = language(&sum_grammar());
    let old = parse(&language, "1+2+3");

    reparse_matches_fresh(&language, &old, 2..3, "20");
    reparse_matches_fresh(&language, &old, 5..5, "+4");
    reparse_matches_fresh(&language, &old, 1..3, "");
    reparse_matches_fresh(&language, &old, 0..0, "9+");
    reparse_matches_fresh(&language, &old, 0..5, "7");
}

#[test]
fn edit_that_fixes_an_error() {
    let language = language(&list_grammar());
    let old = parse(&language, "(a b");
    assert!(old.root_node().has_error());

    let new = reparse_matches_fresh(&language, &old, 4..4, ")");
    assert!(!new.root_node().has_error());
}

#[test]
fn edit_that_introduces_an_error() {
    let language = language(&list_grammar());
    let old = parse(&language, "(a b) (c d)");

    let new = reparse_matches_fresh(&language, &old, 10..11, "");
    assert!(new.root_node().has_error());
}

#[test]
fn every_single_edit_matches_a_fresh_parse() {
    let language = language(&list_grammar());
    let old = parse(&language, "(a (1 b)) c");
    let len = old.source().len();

    for position in 0..=len {
        for text in ["(", ")", "x", " ", "1", "#"] {
            reparse_matches_fresh(&language, &old, position..position, text);
        }
        if position < len {
            reparse_matches_fresh(&language, &old, position..position + 1, "");
            reparse_matches_fresh(&language, &old, position..position + 1, "zz");
        }
    }
}

#[test]
fn chained_edits() {
    let language = language(&list_grammar());
    let mut tree = parse(&language, "(a b) (c d)");

    let edits: [(Range<usize>, &str); 6] = [
        (9..10, "e"),
        (0..0, "(x) "),
        (4..4, " (1 2)"),
        (1..2, ""),
        (20..20, " )"),
        (0..3, ""),
    ];
    for (range, text) in edits {
        let end = range.end.min(tree.source().len());
        let start = range.start.min(end);
        tree = reparse_matches_fresh(&language, &tree, start..end, text);
    }
}

#[test]
fn untouched_subtrees_are_shared() {
    let language = language(&list_grammar());
    let old = parse(&language, "(a b) (c d)");
    let new = reparse_matches_fresh(&language, &old, 9..10, "e");

    let list = language.id_for_node_kind("list", true).unwrap();
    let before = find_green(&old, list, 0..5).unwrap();
    let after = find_green(&new, list, 0..5).unwrap();
    assert!(Arc::ptr_eq(before, after));
}

#[test]
fn another_language_shares_nothing() {
    let old_language = language(&list_grammar());
    let new_language = language(&list_grammar());
    let old = parse(&old_language, "(a b) (c d)");
    let (edit, text) = InputEdit::splice(old.source(), 9..10, b"e");

    let new = crate::reparse(&new_language, &old, &edit, text).unwrap();
    let list = new_language.id_for_node_kind("list", true).unwrap();
    let before = find_green(&old, list, 0..5).unwrap();
    let after = find_green(&new, list, 0..5).unwrap();
    assert!(!Arc::ptr_eq(before, after));
    assert!(Language::ptr_eq(new.language(), &new_language));
}

#[test]
fn external_tokens_survive_edits() {
    let language = block_language();
    let old = parse(&language, "ab <<x y>> cd <<z>>");

    reparse_matches_fresh(&language, &old, 12..13, "e");
    reparse_matches_fresh(&language, &old, 6..6, "q");
    reparse_matches_fresh(&language, &old, 3..4, "");
    reparse_matches_fresh(&language, &old, 0..0, "<<w>> ");
}

#[test]
fn edit_lengths_must_agree_with_the_text() {
    let language = language(&sum_grammar());
    let old = parse(&language, "1+2");
    let (edit, _) = InputEdit::splice(old.source(), 2..3, b"20");

    let err = crate::reparse(&language, &old, &edit, "1+2").unwrap_err();
    assert!(matches!(err, Error::InvalidEdit(_)));
    insta::assert_snapshot!(err.to_string(), @"invalid edit: new text is 3 bytes, edit implies 4");
}

#[test]
fn edit_past_the_old_text() {
    let language = language(&sum_grammar());
    let old = parse(&language, "1+2");
    let edit = InputEdit {
        start_byte: 2,
        old_end_byte: 10,
        new_end_byte: 2,
        start_position: Point::new(0, 2),
        old_end_position: Point::new(0, 10),
        new_end_position: Point::new(0, 2),
    };

    let err = crate::reparse(&language, &old, &edit, "1+").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"invalid edit: old end 10 is past the old text (3 bytes)");
}

#[test]
fn cancelled_reparse() {
    let language = language(&sum_grammar());
    let old = parse(&language, "1+2");
    let (edit, text) = InputEdit::splice(old.source(), 2..3, b"5");

    let flag = CancellationFlag::new();
    flag.cancel();
    let mut parser = Parser::new(&language);
    parser.set_cancellation_flag(Some(flag));

    assert!(matches!(
        parser.reparse(&old, &edit, text),
        Err(Error::Cancelled)
    ));
}
