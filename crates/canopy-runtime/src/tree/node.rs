use std::ops::Range;

use canopy_compiler::{AliasInfo, GrammarTable};
use canopy_core::{FieldId, SymbolId};

use super::Tree;
use super::cursor::TreeCursor;
use super::green::GreenNode;
use crate::edit::Point;

/// A visible node with its absolute position.
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    green: &'tree GreenNode,
    start: usize,
    alias: Option<&'tree AliasInfo>,
    field: Option<FieldId>,
}

impl<'tree> Node<'tree> {
    pub(crate) fn root(tree: &'tree Tree) -> Self {
        Self {
            tree,
            green: tree.green().as_ref(),
            start: 0,
            alias: None,
            field: None,
        }
    }

    fn table(&self) -> &'tree GrammarTable {
        self.tree.language().table()
    }

    pub fn kind(&self) -> &'tree str {
        match self.alias {
            Some(alias) => &alias.name,
            None => self.table().symbol_name(self.green.symbol),
        }
    }

    /// Grammar symbol, before aliasing.
    pub fn kind_id(&self) -> SymbolId {
        self.green.symbol
    }

    pub fn is_named(&self) -> bool {
        if let Some(alias) = self.alias {
            return alias.named;
        }
        self.green.is_error() || self.table().symbol(self.green.symbol).is_some_and(|s| s.named)
    }

    pub fn is_missing(&self) -> bool {
        self.green.is_missing()
    }

    pub fn is_extra(&self) -> bool {
        self.green.is_extra()
    }

    pub fn is_error(&self) -> bool {
        self.green.is_error()
    }

    pub fn has_error(&self) -> bool {
        self.green.is_erroneous()
    }

    pub fn start_byte(&self) -> usize {
        self.start
    }

    pub fn end_byte(&self) -> usize {
        self.start + self.green.len
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn start_position(&self) -> Point {
        self.tree.point(self.start_byte())
    }

    pub fn end_position(&self) -> Point {
        self.tree.point(self.end_byte())
    }

    pub fn text(&self) -> &'tree [u8] {
        &self.tree.source()[self.byte_range()]
    }

    pub fn utf8_text(&self) -> Result<&'tree str, std::str::Utf8Error> {
        std::str::from_utf8(self.text())
    }

    /// Field this node fills in its parent.
    pub fn field_name(&self) -> Option<&'tree str> {
        self.field.map(|f| self.table().field_name(f))
    }

    pub fn children(&self) -> Vec<Node<'tree>> {
        let mut out = Vec::new();
        self.collect_visible(&mut out);
        out
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'tree>> {
        self.children().into_iter().nth(index)
    }

    pub fn named_children(&self) -> Vec<Node<'tree>> {
        self.children().into_iter().filter(Node::is_named).collect()
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().len()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.named_children().into_iter().nth(index)
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
        self.children_by_field_name(name).into_iter().next()
    }

    pub fn children_by_field_name(&self, name: &str) -> Vec<Node<'tree>> {
        let Some(field) = self.table().field_id(name) else {
            return Vec::new();
        };
        self.children()
            .into_iter()
            .filter(|c| c.field == Some(field))
            .collect()
    }

    /// Searches down from the root, so each call costs a walk over the
    /// ancestors and their siblings. Prefer a [`TreeCursor`] for walks.
    pub fn parent(&self) -> Option<Node<'tree>> {
        let root = self.tree.root_node();
        if root == *self {
            return None;
        }
        // A zero-width node sits inside every neighbour that touches its
        // offset, so all containing candidates are searched.
        let mut pending = vec![root];
        while let Some(current) = pending.pop() {
            let children = current.children();
            if children.contains(self) {
                return Some(current);
            }
            pending.extend(children.into_iter().rev().filter(|child| {
                child.start_byte() <= self.start_byte() && self.end_byte() <= child.end_byte()
            }));
        }
        None
    }

    /// Goes through [`Node::parent`]; a [`TreeCursor`] is cheaper for
    /// walking a sibling list.
    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        self.sibling(1, false)
    }

    pub fn prev_sibling(&self) -> Option<Node<'tree>> {
        self.sibling(-1, false)
    }

    pub fn next_named_sibling(&self) -> Option<Node<'tree>> {
        self.sibling(1, true)
    }

    pub fn prev_named_sibling(&self) -> Option<Node<'tree>> {
        self.sibling(-1, true)
    }

    pub fn walk(&self) -> TreeCursor<'tree> {
        TreeCursor::new(*self)
    }

    /// S-expression of named nodes, with field labels and `MISSING` markers.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        super::print::write_sexp(&mut out, *self);
        out
    }

    fn sibling(&self, step: isize, named: bool) -> Option<Node<'tree>> {
        let siblings = self.parent()?.children();
        let mut index = siblings.iter().position(|n| n == self)? as isize;
        loop {
            index += step;
            let node = *siblings.get(usize::try_from(index).ok()?)?;
            if !named || node.is_named() {
                return Some(node);
            }
        }
    }

    /// Unrecognized bytes only appear inside an `ERROR` node, which stands
    /// for them.
    fn is_visible(&self) -> bool {
        self.alias.is_some()
            || (self.green.is_error() && !self.green.is_leaf())
            || self.green.is_missing()
            || self.table().symbol(self.green.symbol).is_some_and(|s| s.visible)
    }

    /// Visible children in order, looking through hidden nodes. A field on
    /// a hidden node is inherited by the visible nodes under it.
    fn collect_visible(&self, out: &mut Vec<Node<'tree>>) {
        let table = self.table();
        let mut stack = vec![Frame {
            green: self.green,
            field: None,
            child: 0,
            structural: 0,
            offset: self.start,
        }];
        while let Some(frame) = stack.last_mut() {
            let parent = frame.green;
            let Some(child) = parent.children.get(frame.child) else {
                stack.pop();
                continue;
            };
            frame.child += 1;
            let start = frame.offset;
            frame.offset += child.len;

            let info = if child.is_extra() {
                None
            } else {
                let index = frame.structural;
                frame.structural += 1;
                parent
                    .production
                    .and_then(|p| table.productions.get(p as usize))
                    .and_then(|p| p.child(index))
            };
            let field = frame.field.or(info.and_then(|i| i.field));
            let node = Node {
                tree: self.tree,
                green: child.as_ref(),
                start,
                alias: info.and_then(|i| i.alias.as_ref()),
                field,
            };

            if node.is_visible() {
                out.push(node);
            } else if !child.children.is_empty() {
                stack.push(Frame {
                    green: child.as_ref(),
                    field,
                    child: 0,
                    structural: 0,
                    offset: start,
                });
            }
        }
    }
}

struct Frame<'tree> {
    green: &'tree GreenNode,
    field: Option<FieldId>,
    child: usize,
    structural: usize,
    offset: usize,
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.green, other.green) && self.start == other.start
    }
}

impl Eq for Node<'_> {}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{Node {} {:?}}}", self.kind(), self.byte_range())
    }
}
