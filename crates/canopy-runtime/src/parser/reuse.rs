//! Walking the old tree for reusable subtrees.
//!
//! The parser only moves forward, so the cursor does too: it keeps the path
//! from the old root to the subtree around the last requested position and
//! only ever pops or descends from there.

use std::sync::Arc;

use crate::edit::InputEdit;
use crate::tree::green::GreenNode;

pub(super) struct ReuseCursor<'a> {
    edit: InputEdit,
    path: Vec<PathFrame<'a>>,
}

struct PathFrame<'a> {
    node: &'a GreenNode,
    /// Old-text offset of `node`.
    start: usize,
    /// Next child that may still contain a requested position.
    child: usize,
    child_start: usize,
}

impl<'a> ReuseCursor<'a> {
    pub fn new(root: &'a Arc<GreenNode>, edit: InputEdit) -> Self {
        Self {
            edit,
            path: vec![PathFrame {
                node: root.as_ref(),
                start: 0,
                child: 0,
                child_start: 0,
            }],
        }
    }

    pub fn edit(&self) -> InputEdit {
        self.edit
    }

    /// Old subtrees starting where the new text's `position` came from,
    /// largest first. Empty when the position lies inside the edit.
    pub fn candidates(&mut self, position: usize) -> Vec<&'a Arc<GreenNode>> {
        let Some(old) = self.edit.to_old(position) else {
            return Vec::new();
        };

        while self.path.len() > 1 {
            let top = &self.path[self.path.len() - 1];
            if top.start + top.node.len > old {
                break;
            }
            self.path.pop();
        }

        loop {
            let Some(frame) = self.path.last_mut() else {
                return Vec::new();
            };
            let node = frame.node;
            while let Some(child) = node.children.get(frame.child) {
                if frame.child_start + child.len > old {
                    break;
                }
                frame.child_start += child.len;
                frame.child += 1;
            }
            let Some(child) = node.children.get(frame.child) else {
                return Vec::new();
            };

            if frame.child_start == old {
                let mut chain = vec![child];
                let mut current = child;
                while let Some(first) = current.children.first() {
                    chain.push(first);
                    current = first;
                }
                return chain;
            }
            if frame.child_start > old {
                return Vec::new();
            }

            let start = frame.child_start;
            self.path.push(PathFrame {
                node: child.as_ref(),
                start,
                child: 0,
                child_start: start,
            });
        }
    }
}
