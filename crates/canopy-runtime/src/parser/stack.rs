//! The LR parse stack.
//!
//! Every entry holds a subtree and the state reached after pushing it. The
//! start state sits below the first entry and is never popped. Extras keep
//! the state of the entry below them.

use std::sync::Arc;

use canopy_core::StateId;

use crate::tree::green::GreenNode;

pub(super) struct StackEntry {
    pub state: StateId,
    pub node: Arc<GreenNode>,
    pub start: usize,
}

impl StackEntry {
    pub fn end(&self) -> usize {
        self.start + self.node.len
    }
}

#[derive(Default)]
pub(super) struct Stack {
    entries: Vec<StackEntry>,
}

impl Stack {
    pub fn state(&self) -> StateId {
        self.entries.last().map_or(0, |e| e.state)
    }

    pub fn end(&self) -> usize {
        self.entries.last().map_or(0, StackEntry::end)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    pub fn push(&mut self, state: StateId, node: Arc<GreenNode>, start: usize) {
        self.entries.push(StackEntry { state, node, start });
    }

    /// Pop the right-hand side of a production: `child_count` structural
    /// entries and the extras between them. Extras above the last child are
    /// returned separately so the caller can put them back on top.
    pub fn pop_children(&mut self, child_count: usize) -> (Vec<StackEntry>, Vec<StackEntry>) {
        let mut trailing = Vec::new();
        while self.entries.last().is_some_and(|e| e.node.is_extra()) {
            if let Some(entry) = self.entries.pop() {
                trailing.push(entry);
            }
        }
        trailing.reverse();

        let mut children = Vec::with_capacity(child_count);
        let mut remaining = child_count;
        while remaining > 0 {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            if !entry.node.is_extra() {
                remaining -= 1;
            }
            children.push(entry);
        }
        children.reverse();
        (children, trailing)
    }

    pub fn split_off(&mut self, at: usize) -> Vec<StackEntry> {
        self.entries.split_off(at)
    }

    pub fn take_all(&mut self) -> Vec<StackEntry> {
        std::mem::take(&mut self.entries)
    }

    /// States of the start state and every structural entry, bottom first.
    /// This is the stack the table sees; extras are invisible to it.
    pub fn structural_states(&self) -> Vec<StateId> {
        let mut states = Vec::with_capacity(self.entries.len() + 1);
        states.push(0);
        states.extend(
            self.entries
                .iter()
                .filter(|e| !e.node.is_extra())
                .map(|e| e.state),
        );
        states
    }

    /// Index of an `ERROR` entry covered only by extras, if any.
    pub fn trailing_error(&self) -> Option<usize> {
        for (index, entry) in self.entries.iter().enumerate().rev() {
            if entry.node.is_error() {
                return Some(index);
            }
            if !entry.node.is_extra() {
                return None;
            }
        }
        None
    }
}
