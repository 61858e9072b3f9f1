//! Stateful walk over visible nodes.

use super::node::Node;

pub struct TreeCursor<'tree> {
    /// Sibling lists from the start node down; the current node is
    /// `siblings[index]` of the last frame.
    frames: Vec<CursorFrame<'tree>>,
}

struct CursorFrame<'tree> {
    siblings: Vec<Node<'tree>>,
    index: usize,
}

impl<'tree> TreeCursor<'tree> {
    pub(crate) fn new(node: Node<'tree>) -> Self {
        Self {
            frames: vec![CursorFrame {
                siblings: vec![node],
                index: 0,
            }],
        }
    }

    pub fn node(&self) -> Node<'tree> {
        let frame = self.top();
        frame.siblings[frame.index]
    }

    pub fn field_name(&self) -> Option<&'tree str> {
        self.node().field_name()
    }

    /// Distance from the node the cursor started at.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn goto_first_child(&mut self) -> bool {
        let children = self.node().children();
        if children.is_empty() {
            return false;
        }
        self.frames.push(CursorFrame {
            siblings: children,
            index: 0,
        });
        true
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.frames.len() == 1 {
            return false;
        }
        let frame = self.top_mut();
        if frame.index + 1 >= frame.siblings.len() {
            return false;
        }
        frame.index += 1;
        true
    }

    pub fn goto_previous_sibling(&mut self) -> bool {
        if self.frames.len() == 1 {
            return false;
        }
        let frame = self.top_mut();
        if frame.index == 0 {
            return false;
        }
        frame.index -= 1;
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.frames.len() == 1 {
            return false;
        }
        self.frames.pop();
        true
    }

    /// Move to the first child that ends after `byte`. Returns its index.
    pub fn goto_first_child_for_byte(&mut self, byte: usize) -> Option<usize> {
        let children = self.node().children();
        let index = children.iter().position(|c| c.end_byte() > byte)?;
        self.frames.push(CursorFrame {
            siblings: children,
            index,
        });
        Some(index)
    }

    pub fn reset(&mut self, node: Node<'tree>) {
        *self = Self::new(node);
    }

    fn top(&self) -> &CursorFrame<'tree> {
        self.frames.last().unwrap_or_else(|| unreachable!("cursor keeps its start frame"))
    }

    fn top_mut(&mut self) -> &mut CursorFrame<'tree> {
        self.frames
            .last_mut()
            .unwrap_or_else(|| unreachable!("cursor keeps its start frame"))
    }
}
