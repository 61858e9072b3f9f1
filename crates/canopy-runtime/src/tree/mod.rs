//! Persistent syntax trees.
//!
//! Storage is a tree of [`GreenNode`]s holding lengths only; [`Node`] adds
//! absolute positions, aliases and fields while walking from the root.
//! Hidden symbols (names starting with `_` and grammar helpers) stay in
//! storage but are transparent to [`Node`] and [`TreeCursor`].

mod cursor;
mod diff;
mod errors;
pub(crate) mod green;
mod node;
mod print;

use std::ops::Range;
use std::sync::Arc;

pub use cursor::TreeCursor;
pub use errors::{SyntaxError, SyntaxErrorKind};
pub use node::Node;

use crate::Language;
use crate::edit::{LineIndex, Point};
use green::GreenNode;

#[derive(Clone)]
pub struct Tree {
    inner: Arc<TreeInner>,
}

struct TreeInner {
    root: Arc<GreenNode>,
    source: Vec<u8>,
    language: Language,
    lines: LineIndex,
}

impl Tree {
    pub(crate) fn new(root: Arc<GreenNode>, source: Vec<u8>, language: Language) -> Self {
        let lines = LineIndex::new(&source);
        Self {
            inner: Arc::new(TreeInner {
                root,
                source,
                language,
                lines,
            }),
        }
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::root(self)
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        TreeCursor::new(self.root_node())
    }

    pub fn source(&self) -> &[u8] {
        &self.inner.source
    }

    pub fn language(&self) -> &Language {
        &self.inner.language
    }

    /// Both handles share one tree, as after a no-op re-parse.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Byte ranges of every token in the tree, hidden ones included, in
    /// source order. Their concatenation is the whole input.
    pub fn leaf_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut stack = vec![(&*self.inner.root, 0usize)];
        while let Some((node, start)) = stack.pop() {
            if node.children.is_empty() {
                if node.is_leaf() {
                    ranges.push(start..start + node.len);
                }
                continue;
            }
            let mut offset = start + node.len;
            for child in node.children.iter().rev() {
                offset -= child.len;
                stack.push((child, offset));
            }
        }
        ranges
    }

    /// Byte ranges of the new tree whose syntactic structure differs from
    /// the old tree, merged and in ascending order.
    pub fn changed_ranges(old: &Tree, new: &Tree) -> Vec<Range<usize>> {
        diff::changed_ranges(&old.inner.root, &new.inner.root)
    }

    pub(crate) fn green(&self) -> &Arc<GreenNode> {
        &self.inner.root
    }

    pub(crate) fn point(&self, offset: usize) -> Point {
        self.inner.lines.point(offset)
    }
}

/// Structural equality of the two syntax trees.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || *self.inner.root == *other.inner.root
    }
}

impl Eq for Tree {}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root_node().to_sexp())
    }
}
