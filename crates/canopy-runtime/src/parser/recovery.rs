//! Error recovery.
//!
//! When the lookahead has no action, the parser tries in order:
//! 1. insert one zero-width `MISSING` token that lets the lookahead proceed;
//! 2. pop entries until a state accepts the lookahead, wrapping them in an
//!    `ERROR` node;
//! 3. skip the lookahead into an `ERROR` node.
//!
//! At the end of input with nothing left to try, the whole stack becomes
//! one `ERROR` node under the root. Every attempt is checked by simulating the table on a copy of
//! the state stack, so the chosen repair always makes progress.

use std::sync::Arc;

use canopy_compiler::Action;
use canopy_core::{END_SYMBOL, ERROR_SYMBOL, StateId, SymbolId};

use super::driver::{Lookahead, ParseRun};
use crate::Error;
use crate::lexer::Token;
use crate::tree::green::{Flags, GreenNode};

/// Recovery attempts at one position before falling back to skipping.
const MAX_ATTEMPTS: usize = 4;

/// Upper bound on reductions in one simulation.
const SIMULATION_STEPS: usize = 4096;

impl ParseRun<'_> {
    /// Repair the parse so it can continue. Returns the root once the end of
    /// input cannot be repaired any further.
    pub(super) fn recover(&mut self) -> Result<Option<Arc<GreenNode>>, Error> {
        self.recoveries += 1;
        let position = self.lookahead.token.start;
        if self.budget.position == position && self.recoveries > 1 {
            self.budget.attempts += 1;
        } else {
            self.budget.position = position;
            self.budget.attempts = 1;
        }

        if self.budget.attempts <= MAX_ATTEMPTS && !self.lookahead.missing {
            if let Some(symbol) = self.missing_candidate() {
                self.insert_missing(symbol);
                return Ok(None);
            }
            if self.pop_until_viable() {
                return Ok(None);
            }
        }

        if self.lookahead.token.symbol == END_SYMBOL {
            return Ok(Some(self.wrap_stack()));
        }
        self.skip_lookahead()?;
        Ok(None)
    }

    /// First expected terminal whose insertion lets the lookahead proceed.
    fn missing_candidate(&self) -> Option<SymbolId> {
        let states = self.stack.structural_states();
        let state = *states.last()?;
        let token = self.lookahead.token;

        self.table
            .expected(state)
            .filter(|&symbol| symbol != END_SYMBOL && !self.table.is_extra(symbol))
            .find(|&symbol| {
                let mut sim = states.clone();
                let inserted = Token {
                    symbol,
                    start: token.start,
                    end: token.start,
                    lookahead_end: token.lookahead_end,
                    lex_mode: token.lex_mode,
                };
                self.simulate(&mut sim, inserted, false) && self.simulate(&mut sim, token, true)
            })
    }

    fn insert_missing(&mut self, symbol: SymbolId) {
        let real = self.lookahead.clone();
        tracing::trace!(
            symbol = self.table.symbol_name(symbol),
            position = real.token.start,
            "inserting missing token"
        );
        self.lookahead = Lookahead {
            token: Token {
                symbol,
                start: real.token.start,
                end: real.token.start,
                lookahead_end: real.token.lookahead_end,
                lex_mode: real.token.lex_mode,
            },
            missing: true,
            scanner_before: real.scanner_before.clone(),
            scanner_after: real.scanner_before.clone(),
        };
        self.pending = Some(real);
    }

    /// Pop at most `recovery_depth` entries looking for a state where the
    /// lookahead can be shifted.
    fn pop_until_viable(&mut self) -> bool {
        let entries = self.stack.len();
        let limit = self.recovery_depth.min(entries);
        let mut states = self.stack.structural_states();
        let token = self.lookahead.token;

        for depth in 1..=limit {
            let keep = entries - depth;
            if !self.stack.entries()[keep].node.is_extra() {
                states.pop();
            }
            if !self.simulate(&mut states.clone(), token, true) {
                continue;
            }

            let popped = self.stack.split_off(keep);
            let start = popped[0].start;
            let state = self.stack.state();
            let mut children = Vec::with_capacity(popped.len());
            for entry in popped {
                if entry.node.is_error() && entry.node.is_extra() {
                    children.extend(entry.node.children.iter().cloned());
                } else {
                    children.push(entry.node);
                }
            }
            tracing::trace!(depth, position = token.start, "popped into error");
            self.stack
                .push(state, Arc::new(GreenNode::error(children, state)), start);
            return true;
        }
        false
    }

    /// Wrap the lookahead in an `ERROR` node, merging it into an `ERROR`
    /// node that is already on top.
    fn skip_lookahead(&mut self) -> Result<(), Error> {
        let la = self.lookahead.clone();
        let mut flags = Flags::default();
        if la.token.symbol == ERROR_SYMBOL {
            flags = flags.with(Flags::ERROR);
        }
        if la.missing {
            flags = flags.with(Flags::MISSING);
        }
        let state = self.stack.state();
        let mut leaf = GreenNode::leaf(la.token.symbol, la.token.len(), flags, state);
        leaf.lookahead = la.token.lookahead_end.saturating_sub(la.token.end);
        leaf.scanner_before = la.scanner_before;
        leaf.scanner_after = la.scanner_after;
        let leaf = Arc::new(leaf);

        let (children, start, state) = match self.stack.trailing_error() {
            Some(index) => {
                let tail = self.stack.split_off(index);
                let start = tail[0].start;
                let state = tail[0].state;
                let mut children: Vec<Arc<GreenNode>> = tail[0].node.children.clone();
                children.extend(tail[1..].iter().map(|e| e.node.clone()));
                children.push(leaf);
                (children, start, state)
            }
            None => (vec![leaf], la.token.start, state),
        };
        tracing::trace!(
            symbol = self.table.symbol_name(la.token.symbol),
            position = la.token.start,
            "skipped token"
        );
        self.stack
            .push(state, Arc::new(GreenNode::error(children, state)), start);
        self.after_extra = false;
        self.advance(la.token.end)
    }

    /// Root of the start symbol over one `ERROR` node holding whatever is
    /// on the stack, so the unfinished input is reported.
    fn wrap_stack(&mut self) -> Arc<GreenNode> {
        let mut unfinished = Vec::new();
        for entry in self.stack.take_all() {
            if entry.node.is_error() && entry.node.is_extra() {
                unfinished.extend(entry.node.children.iter().cloned());
            } else {
                unfinished.push(entry.node);
            }
        }
        let children = if unfinished.is_empty() {
            Vec::new()
        } else {
            vec![Arc::new(GreenNode::error(unfinished, 0))]
        };
        let root = GreenNode::branch(
            self.table.start_symbol,
            None,
            Flags::HAS_ERROR,
            0,
            children,
        );
        tracing::debug!(
            len = root.len,
            reused = self.reused,
            recoveries = self.recoveries,
            "parse ended with unrecoverable errors"
        );
        Arc::new(root)
    }

    /// Run the table on `states` with `token` until it is shifted or
    /// accepted. With `relex`, the token is lexed again whenever a reduction
    /// changes the lex mode, like the real parser does.
    fn simulate(&self, states: &mut Vec<StateId>, mut token: Token, relex: bool) -> bool {
        for _ in 0..SIMULATION_STEPS {
            let Some(&state) = states.last() else {
                return false;
            };
            if relex {
                let mode = self.table.lex_mode(state);
                if token.lex_mode != mode {
                    token = self.lexer.peek_token(token.start, mode, self.after_extra);
                }
            }
            match self.table.action(state, token.symbol) {
                Some(Action::Shift(next)) => {
                    states.push(next);
                    return true;
                }
                Some(Action::ShiftExtra | Action::Accept) => return true,
                Some(Action::Reduce(production)) => {
                    let info = self.ensure_production(production);
                    let keep = states.len().saturating_sub(info.child_count as usize);
                    if keep == 0 {
                        return false;
                    }
                    states.truncate(keep);
                    let below = states[keep - 1];
                    match self.table.goto(below, info.lhs) {
                        Some(next) => states.push(next),
                        None => return false,
                    }
                }
                None => return false,
            }
        }
        false
    }
}
