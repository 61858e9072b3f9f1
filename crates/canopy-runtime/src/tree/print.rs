//! Text renderings of trees: S-expressions and indented dumps.

use std::fmt::Write;

use super::Tree;
use super::node::Node;

/// Named and `MISSING` nodes, walked with a cursor so depth is bounded by
/// the heap rather than the call stack. The start node is always printed.
pub(super) fn write_sexp(out: &mut String, node: Node<'_>) {
    let mut cursor = node.walk();
    'walk: loop {
        let current = cursor.node();
        let depth = cursor.depth();
        if depth == 0 || current.is_named() || current.is_missing() {
            if depth > 0 {
                out.push(' ');
                if let Some(field) = current.field_name() {
                    out.push_str(field);
                    out.push_str(": ");
                }
            }
            if current.is_missing() {
                if current.is_named() {
                    write!(out, "(MISSING {})", current.kind()).expect("String write never fails");
                } else {
                    write!(out, "(MISSING {:?})", current.kind()).expect("String write never fails");
                }
            } else {
                out.push('(');
                out.push_str(current.kind());
                if cursor.goto_first_child() {
                    continue;
                }
                out.push(')');
            }
        }
        loop {
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
            out.push(')');
        }
    }
}

impl Tree {
    /// One visible node per line, indented by depth:
    ///
    /// ```text
    /// expr 0..3
    ///   number 0..1 "1"
    ///   "+" 1..2
    ///   number 2..3 "3"
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut cursor = self.walk();
        'walk: loop {
            write_line(&mut out, cursor.node(), cursor.depth());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    continue 'walk;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }
        out
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }
}

fn write_line(out: &mut String, node: Node<'_>, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    if let Some(field) = node.field_name() {
        write!(out, "{field}: ").expect("String write never fails");
    }
    if node.is_missing() {
        out.push_str("MISSING ");
    }
    if node.is_named() {
        out.push_str(node.kind());
    } else {
        write!(out, "{:?}", node.kind()).expect("String write never fails");
    }
    write!(out, " {}..{}", node.start_byte(), node.end_byte()).expect("String write never fails");
    if node.is_named() && node.child_count() == 0 && !node.is_missing() {
        let text = String::from_utf8_lossy(node.text());
        write!(out, " {text:?}").expect("String write never fails");
    }
    out.push('\n');
}
