//! The shift/reduce loop.

use std::sync::Arc;

use canopy_compiler::{Action, GrammarTable};
use canopy_core::{ProductionId, StateId};

use super::CancellationFlag;
use super::reuse::ReuseCursor;
use super::stack::Stack;
use crate::lexer::{Lexer, Token};
use crate::tree::green::{Flags, GreenNode};
use crate::{Error, Language};

/// The current lookahead with the external scanner state around it.
#[derive(Clone, Debug)]
pub(super) struct Lookahead {
    pub token: Token,
    /// Zero-width token inserted by recovery.
    pub missing: bool,
    pub scanner_before: Option<Arc<[u8]>>,
    pub scanner_after: Option<Arc<[u8]>>,
}

/// How often recovery ran at the same position. Past the limit the parser
/// stops inserting and popping and only skips.
#[derive(Default)]
pub(super) struct RecoveryBudget {
    pub position: usize,
    pub attempts: usize,
}

pub(super) struct ParseRun<'a> {
    pub(super) table: &'a GrammarTable,
    pub(super) lexer: Lexer<'a>,
    pub(super) stack: Stack,
    pub(super) lookahead: Lookahead,
    /// Real lookahead set aside while a `MISSING` token is shifted.
    pub(super) pending: Option<Lookahead>,
    pub(super) after_extra: bool,
    pub(super) reuse: Option<ReuseCursor<'a>>,
    pub(super) cancellation: Option<&'a CancellationFlag>,
    pub(super) recovery_depth: usize,
    pub(super) budget: RecoveryBudget,
    pub(super) reused: usize,
    pub(super) recoveries: usize,
}

impl<'a> ParseRun<'a> {
    pub fn new(
        language: &'a Language,
        source: &'a [u8],
        reuse: Option<ReuseCursor<'a>>,
        cancellation: Option<&'a CancellationFlag>,
        recovery_depth: usize,
    ) -> Self {
        let placeholder = Token {
            symbol: canopy_core::END_SYMBOL,
            start: 0,
            end: 0,
            lookahead_end: 0,
            lex_mode: 0,
        };
        Self {
            table: language.table(),
            lexer: Lexer::new(language, source),
            stack: Stack::default(),
            lookahead: Lookahead {
                token: placeholder,
                missing: false,
                scanner_before: None,
                scanner_after: None,
            },
            pending: None,
            after_extra: false,
            reuse,
            cancellation,
            recovery_depth,
            budget: RecoveryBudget::default(),
            reused: 0,
            recoveries: 0,
        }
    }

    pub fn run(mut self) -> Result<Arc<GreenNode>, Error> {
        self.lookahead = self.lex(0)?;
        loop {
            let state = self.stack.state();
            self.relex_if_needed(state)?;

            match self.table.action(state, self.lookahead.token.symbol) {
                Some(Action::Shift(next)) => {
                    if !self.try_reuse(state)? {
                        self.shift(state, next, false)?;
                    }
                }
                Some(Action::ShiftExtra) => self.shift(state, state, true)?,
                Some(Action::Reduce(production)) => self.reduce(production),
                Some(Action::Accept) => return Ok(self.accept()),
                None => {
                    if let Some(root) = self.recover()? {
                        return Ok(root);
                    }
                }
            }
        }
    }

    /// Lex at `position` in the mode of the current state.
    pub(super) fn lex(&mut self, position: usize) -> Result<Lookahead, Error> {
        if self.cancellation.is_some_and(CancellationFlag::is_cancelled) {
            return Err(Error::Cancelled);
        }
        let mode = self.table.lex_mode(self.stack.state());
        let scanner_before = self.lexer.scanner_state().map(Arc::from);
        let token = self.lexer.next_token(position, mode, self.after_extra);
        let scanner_after = self.lexer.scanner_state().map(Arc::from);
        Ok(Lookahead {
            token,
            missing: false,
            scanner_before,
            scanner_after,
        })
    }

    /// A lookahead lexed under another state's mode is lexed again at the
    /// same position, so the token only depends on the current state.
    fn relex_if_needed(&mut self, state: StateId) -> Result<(), Error> {
        let la = &self.lookahead;
        if la.missing || la.token.lex_mode == self.table.lex_mode(state) {
            return Ok(());
        }
        let start = la.token.start;
        if let Some(before) = la.scanner_before.clone() {
            self.lexer.restore_scanner(&before);
        }
        self.lookahead = self.lex(start)?;
        Ok(())
    }

    /// Move past the current lookahead.
    pub(super) fn advance(&mut self, position: usize) -> Result<(), Error> {
        self.lookahead = match self.pending.take() {
            Some(la) => la,
            None => self.lex(position)?,
        };
        Ok(())
    }

    fn shift(&mut self, state: StateId, next: StateId, extra: bool) -> Result<(), Error> {
        let la = self.lookahead.clone();
        let mut flags = Flags::default();
        if extra {
            flags = flags.with(Flags::EXTRA);
        }
        if la.missing {
            flags = flags.with(Flags::MISSING);
        }

        let mut leaf = GreenNode::leaf(la.token.symbol, la.token.len(), flags, state);
        leaf.lookahead = la.token.lookahead_end.saturating_sub(la.token.end);
        leaf.scanner_before = la.scanner_before;
        leaf.scanner_after = la.scanner_after;
        self.stack.push(next, Arc::new(leaf), la.token.start);

        if !la.missing {
            self.after_extra = extra;
        }
        self.advance(la.token.end)
    }

    fn reduce(&mut self, production: ProductionId) {
        let info = self.ensure_production(production);
        let (children, trailing) = self.stack.pop_children(info.child_count as usize);
        let below = self.stack.state();
        let start = children.first().map_or(self.stack.end(), |e| e.start);

        let examined = children
            .iter()
            .map(|e| e.end() + e.node.lookahead)
            .fold(self.lookahead.token.lookahead_end, usize::max);
        let mut node = GreenNode::branch(
            info.lhs,
            Some(production),
            Flags::default(),
            below,
            children.into_iter().map(|e| e.node).collect(),
        );
        node.lookahead = examined.saturating_sub(start + node.len);
        node.fragile = self.lookahead.missing;

        let next = self.ensure_goto(below, info.lhs);
        self.stack.push(next, Arc::new(node), start);
        for entry in trailing {
            self.stack.push(next, entry.node, entry.start);
        }
    }

    /// Fold leading and trailing extras into the start symbol's node.
    fn accept(&mut self) -> Arc<GreenNode> {
        let entries = self.stack.take_all();
        let Some(index) = entries.iter().position(|e| !e.node.is_extra()) else {
            self.invariant_violated("accept without a start symbol on the stack")
        };
        let start = &entries[index].node;
        let (symbol, production, parse_state) = (start.symbol, start.production, start.parse_state);

        let mut children = Vec::with_capacity(entries.len() + start.children.len());
        for (i, entry) in entries.iter().enumerate() {
            if i == index {
                children.extend(entry.node.children.iter().cloned());
            } else {
                children.push(entry.node.clone());
            }
        }

        let root = GreenNode::branch(symbol, production, Flags::default(), parse_state, children);
        tracing::debug!(
            len = root.len,
            reused = self.reused,
            recoveries = self.recoveries,
            "parse accepted"
        );
        Arc::new(root)
    }

    fn try_reuse(&mut self, state: StateId) -> Result<bool, Error> {
        if self.lookahead.missing {
            return Ok(false);
        }
        let Some(cursor) = self.reuse.as_mut() else {
            return Ok(false);
        };
        let position = self.lookahead.token.start;
        let edit = cursor.edit();
        let Some(old_start) = edit.to_old(position) else {
            return Ok(false);
        };

        for node in cursor.candidates(position) {
            if node.len == 0
                || node.production.is_none()
                || node.fragile
                || node.is_extra()
                || node.is_erroneous()
            {
                continue;
            }
            let untouched = old_start >= edit.old_end_byte
                || old_start + node.len + node.lookahead <= edit.start_byte;
            if !untouched || node.parse_state != state {
                continue;
            }
            let first = node.first_token;
            let token = self.lookahead.token;
            if first.is_none_or(|t| t.symbol != token.symbol || t.len != token.len()) {
                continue;
            }
            if node.scanner_before.as_deref() != self.lookahead.scanner_before.as_deref() {
                continue;
            }
            let Some(next) = self.table.goto(state, node.symbol) else {
                continue;
            };

            let node = Arc::clone(node);
            let end = position + node.len;
            if let Some(after) = &node.scanner_after {
                self.lexer.restore_scanner(after);
            }
            tracing::trace!(
                symbol = self.table.symbol_name(node.symbol),
                start = position,
                end,
                "reused subtree"
            );
            self.stack.push(next, node, position);
            self.after_extra = false;
            self.reused += 1;
            self.lookahead = self.lex(end)?;
            return Ok(true);
        }
        Ok(false)
    }
}
