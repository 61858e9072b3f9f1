use std::ops::Range;

use super::Tree;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// The parser inserted a zero-width token of this kind.
    Missing(String),
    /// Input the parser could not fit into the grammar.
    Unexpected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub range: Range<usize>,
}

impl SyntaxError {
    pub fn message(&self) -> String {
        match &self.kind {
            SyntaxErrorKind::Missing(kind) => format!("missing {kind}"),
            SyntaxErrorKind::Unexpected => "unexpected input".to_string(),
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}: {}", self.range.start, self.range.end, self.message())
    }
}

impl Tree {
    /// Every `ERROR` and `MISSING` node, in source order. Nested errors are
    /// reported once, by their outermost `ERROR` node.
    pub fn errors(&self) -> Vec<SyntaxError> {
        let mut errors = Vec::new();
        let mut cursor = self.walk();
        'walk: loop {
            let node = cursor.node();
            let descend = if node.is_missing() {
                errors.push(SyntaxError {
                    kind: SyntaxErrorKind::Missing(node.kind().to_string()),
                    range: node.byte_range(),
                });
                false
            } else if node.is_error() {
                errors.push(SyntaxError {
                    kind: SyntaxErrorKind::Unexpected,
                    range: node.byte_range(),
                });
                false
            } else {
                node.has_error()
            };

            if descend && cursor.goto_first_child() {
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
        errors
    }
}
