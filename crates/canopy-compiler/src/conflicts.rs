//! Action rows and the conflict decision table.
//!
//! Reduce/reduce: higher precedence, then higher dynamic precedence, then a
//! left-associative production, then the earlier production.
//! Shift/reduce: the reduced production's precedence against the precedence
//! of every item that would shift; equal precedence falls back to
//! associativity. Anything left over shifts.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use canopy_core::{END_SYMBOL, ProductionId, StateId, SymbolId};

use crate::error::{CompileError, Warning, Warnings};
use crate::flatten::{ProductionStep, SyntaxGrammar};
use crate::lr::{Automaton, LrState};
use crate::precedence::PrecedenceOrder;
use crate::rules::{Assoc, Prec, SymbolRef};
use crate::table::Action;

/// A state/lookahead pair with more than one candidate action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub lookahead: SymbolId,
    /// A shift was among the candidates.
    pub shift: bool,
    pub reductions: Vec<ProductionId>,
    pub chosen: Action,
    pub resolution: Resolution,
    /// Listed in the grammar's `conflicts`.
    pub expected: bool,
}

/// What settled a conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Precedence,
    DynamicPrecedence,
    Associativity,
    /// Earlier production won a reduce/reduce tie.
    DeclarationOrder,
    /// Nothing applied; the shift was kept.
    Unresolved,
}

pub(crate) struct StateRow {
    /// Sorted by symbol.
    pub actions: Vec<(SymbolId, Action)>,
    pub gotos: Vec<(SymbolId, StateId)>,
}

pub(crate) fn resolve(
    grammar: &SyntaxGrammar,
    automaton: &Automaton,
    order: &PrecedenceOrder,
    warnings: &mut Warnings,
) -> Result<(Vec<StateRow>, Vec<Conflict>), CompileError> {
    let resolver = Resolver {
        grammar,
        automaton,
        order,
    };
    let extras: Vec<SymbolId> = grammar
        .extras
        .iter()
        .map(|&symbol| grammar.symbol_id(symbol) as SymbolId)
        .collect();

    let mut rows = Vec::with_capacity(automaton.states.len());
    let mut conflicts = Vec::new();
    for (id, state) in automaton.states.iter().enumerate() {
        let mut row = resolver.state_row(id as StateId, state, &mut conflicts)?;
        for &extra in &extras {
            if let Err(position) = row.actions.binary_search_by_key(&extra, |(s, _)| *s) {
                row.actions.insert(position, (extra, Action::ShiftExtra));
            }
        }
        rows.push(row);
    }

    for conflict in &conflicts {
        if conflict.expected {
            continue;
        }
        if matches!(
            conflict.resolution,
            Resolution::Unresolved | Resolution::DeclarationOrder
        ) {
            warnings.push(Warning::UnresolvedConflict {
                description: resolver.describe(conflict),
            });
        }
    }
    tracing::debug!(conflicts = conflicts.len(), "resolved parse actions");
    Ok((rows, conflicts))
}

struct Resolver<'a> {
    grammar: &'a SyntaxGrammar,
    automaton: &'a Automaton,
    order: &'a PrecedenceOrder,
}

impl Resolver<'_> {
    fn state_row(
        &self,
        id: StateId,
        state: &LrState,
        conflicts: &mut Vec<Conflict>,
    ) -> Result<StateRow, CompileError> {
        let terminal_count = self.grammar.terminal_count();
        let mut shifts: BTreeMap<usize, usize> = BTreeMap::new();
        let mut gotos = Vec::new();
        for &(symbol, target) in &state.transitions {
            if symbol < terminal_count {
                shifts.insert(symbol, target);
            } else {
                gotos.push((symbol as SymbolId, target as StateId));
            }
        }

        let mut accept = false;
        let mut reductions: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (item, lookahead) in &state.items {
            if !self.automaton.is_complete(*item) {
                continue;
            }
            if item.production == 0 {
                accept |= lookahead.contains(END_SYMBOL);
                continue;
            }
            for terminal in lookahead.iter() {
                let candidates = reductions.entry(terminal as usize).or_default();
                if !candidates.contains(&item.production) {
                    candidates.push(item.production);
                }
            }
        }

        let mut symbols: Vec<usize> = shifts.keys().chain(reductions.keys()).copied().collect();
        symbols.sort_unstable();
        symbols.dedup();

        let mut actions = Vec::with_capacity(symbols.len() + 1);
        if accept {
            actions.push((END_SYMBOL, Action::Accept));
        }
        for symbol in symbols {
            if accept && symbol == END_SYMBOL as usize {
                continue;
            }
            let mut candidates = reductions.remove(&symbol).unwrap_or_default();
            candidates.sort_unstable();
            let shift = shifts.get(&symbol).copied();

            let action = match (shift, candidates.as_slice()) {
                (Some(target), []) => Action::Shift(target as StateId),
                (None, [production]) => Action::Reduce(table_production(*production)),
                _ => self.decide(id, state, symbol, shift, &candidates, conflicts)?,
            };
            actions.push((symbol as SymbolId, action));
        }

        Ok(StateRow { actions, gotos })
    }

    fn decide(
        &self,
        id: StateId,
        state: &LrState,
        symbol: usize,
        shift: Option<usize>,
        candidates: &[usize],
        conflicts: &mut Vec<Conflict>,
    ) -> Result<Action, CompileError> {
        let (mut reduce, mut resolution) = (candidates[0], Resolution::Precedence);
        let mut tie = false;
        for &challenger in &candidates[1..] {
            let (winner, reason) = self.reduce_reduce(reduce, challenger);
            tie |= reason == Resolution::DeclarationOrder;
            reduce = winner;
            resolution = reason;
        }
        if tie {
            resolution = Resolution::DeclarationOrder;
        }

        let chosen = match shift {
            None => Action::Reduce(table_production(reduce)),
            Some(target) => {
                let (reduce_wins, reason) = self.shift_reduce(state, symbol, reduce)?;
                resolution = reason;
                if reduce_wins {
                    Action::Reduce(table_production(reduce))
                } else {
                    Action::Shift(target as StateId)
                }
            }
        };

        conflicts.push(Conflict {
            state: id,
            lookahead: symbol as SymbolId,
            shift: shift.is_some(),
            reductions: candidates.iter().map(|&p| table_production(p)).collect(),
            chosen,
            resolution,
            expected: self.is_expected(state, symbol, candidates),
        });
        Ok(chosen)
    }

    /// `a` precedes `b` in declaration order.
    fn reduce_reduce(&self, a: usize, b: usize) -> (usize, Resolution) {
        let pa = &self.automaton.productions[a];
        let pb = &self.automaton.productions[b];
        let (prec_a, assoc_a) = last_step(&pa.steps);
        let (prec_b, assoc_b) = last_step(&pb.steps);

        match self.order.compare(prec_a, prec_b) {
            Some(Ordering::Greater) => return (a, Resolution::Precedence),
            Some(Ordering::Less) => return (b, Resolution::Precedence),
            _ => {}
        }
        match pa.dynamic_precedence.cmp(&pb.dynamic_precedence) {
            Ordering::Greater => return (a, Resolution::DynamicPrecedence),
            Ordering::Less => return (b, Resolution::DynamicPrecedence),
            Ordering::Equal => {}
        }
        match (assoc_a, assoc_b) {
            (Some(Assoc::Left), other) if other != Some(Assoc::Left) => (a, Resolution::Associativity),
            (other, Some(Assoc::Left)) if other != Some(Assoc::Left) => (b, Resolution::Associativity),
            _ => (a, Resolution::DeclarationOrder),
        }
    }

    /// Returns whether the reduction wins.
    fn shift_reduce(
        &self,
        state: &LrState,
        symbol: usize,
        reduce: usize,
    ) -> Result<(bool, Resolution), CompileError> {
        let (reduce_prec, reduce_assoc) = last_step(&self.automaton.productions[reduce].steps);

        let mut shifting: Vec<(&Prec, Option<Assoc>)> = state
            .items
            .iter()
            .filter(|(item, _)| item.dot > 0 && self.next_symbol_id(item.production, item.dot) == Some(symbol))
            .map(|(item, _)| {
                let step = &self.automaton.productions[item.production].steps[item.dot - 1];
                (&step.precedence, step.associativity)
            })
            .collect();
        if shifting.is_empty() {
            shifting.push((&Prec::None, None));
        }

        let (mut greater, mut less, mut equal, mut incomparable) = (0, 0, 0, 0);
        for (prec, _) in &shifting {
            match self.order.compare(reduce_prec, prec) {
                Some(Ordering::Greater) => greater += 1,
                Some(Ordering::Less) => less += 1,
                Some(Ordering::Equal) => equal += 1,
                None => incomparable += 1,
            }
        }

        if incomparable > 0 {
            return Ok((false, Resolution::Unresolved));
        }
        if less == 0 && equal == 0 {
            return Ok((true, Resolution::Precedence));
        }
        if greater == 0 && equal == 0 {
            return Ok((false, Resolution::Precedence));
        }
        if greater > 0 || less > 0 {
            return Ok((false, Resolution::Unresolved));
        }

        if let Some(expected) = reduce_assoc
            && let Some((_, Some(other))) = shifting.iter().find(|(_, assoc)| assoc.is_some_and(|a| a != expected))
        {
            return Err(CompileError::AmbiguousPrecedence(format!(
                "`{}` is both {expected:?}- and {other:?}-associative at the same precedence",
                self.grammar.variables[self.automaton.productions[reduce].lhs.unwrap_or(0)].name,
            )));
        }
        Ok(match reduce_assoc {
            Some(Assoc::Left) => (true, Resolution::Associativity),
            Some(Assoc::Right) => (false, Resolution::Associativity),
            None => (false, Resolution::Unresolved),
        })
    }

    fn next_symbol_id(&self, production: usize, dot: usize) -> Option<usize> {
        self.automaton.productions[production]
            .steps
            .get(dot)
            .map(|step| self.grammar.symbol_id(step.symbol))
    }

    /// Every rule taking part is listed together in one `conflicts` entry.
    fn is_expected(&self, state: &LrState, symbol: usize, candidates: &[usize]) -> bool {
        let mut involved: Vec<usize> = candidates
            .iter()
            .filter_map(|&p| self.automaton.productions[p].lhs)
            .collect();
        for (item, _) in &state.items {
            if item.dot > 0 && self.next_symbol_id(item.production, item.dot) == Some(symbol) {
                involved.extend(self.automaton.productions[item.production].lhs);
            }
        }
        involved.sort_unstable();
        involved.dedup();

        self.grammar.expected_conflicts.iter().any(|declared| {
            involved
                .iter()
                .all(|var| declared.contains(&SymbolRef::NonTerminal(*var)))
        })
    }

    fn describe(&self, conflict: &Conflict) -> String {
        let lookahead = self.symbol_name(conflict.lookahead as usize);
        let rules: Vec<&str> = conflict
            .reductions
            .iter()
            .filter_map(|&p| self.automaton.productions[p as usize + 1].lhs)
            .map(|var| self.grammar.variables[var].name.as_str())
            .collect();
        let kind = if conflict.shift { "shift/reduce" } else { "reduce/reduce" };
        format!(
            "{kind} in state {} on `{lookahead}` between {}; chose {:?}",
            conflict.state,
            rules.join(", "),
            conflict.chosen
        )
    }

    fn symbol_name(&self, id: usize) -> &str {
        let lexical = self.grammar.lexical_variables.len();
        match id {
            0 => "end",
            id if id <= lexical => &self.grammar.lexical_variables[id - 1].name,
            id if id < self.grammar.terminal_count() => {
                &self.grammar.externals[id - 1 - lexical].name
            }
            id => self
                .grammar
                .non_terminal_index(id)
                .map_or("?", |var| self.grammar.variables[var].name.as_str()),
        }
    }
}

/// Precedence and associativity that govern reducing a production.
fn last_step(steps: &[ProductionStep]) -> (&Prec, Option<Assoc>) {
    match steps.last() {
        Some(step) => (&step.precedence, step.associativity),
        None => (&Prec::None, None),
    }
}

/// LR production index to table production id (the augmented production is
/// not part of the table).
fn table_production(production: usize) -> ProductionId {
    (production - 1) as ProductionId
}
