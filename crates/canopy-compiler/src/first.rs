//! Nullable and FIRST sets over the flattened grammar.

use canopy_core::{SymbolId, TokenSet};

use crate::error::CompileError;
use crate::flatten::{ProductionStep, SyntaxGrammar};
use crate::rules::SymbolRef;

pub(crate) struct FirstSets {
    nullable: Vec<bool>,
    first: Vec<TokenSet>,
}

impl FirstSets {
    /// Fixpoint over all productions. Sets hold terminal ids only.
    pub fn compute(grammar: &SyntaxGrammar) -> Self {
        let count = grammar.variables.len();
        let mut sets = FirstSets {
            nullable: vec![false; count],
            first: vec![TokenSet::with_capacity(grammar.terminal_count()); count],
        };

        let mut changed = true;
        while changed {
            changed = false;
            for (index, variable) in grammar.variables.iter().enumerate() {
                for production in &variable.productions {
                    let mut first = TokenSet::new();
                    let nullable = sets.sequence_into(grammar, &production.steps, &mut first);
                    changed |= sets.first[index].union_with(&first);
                    if nullable && !sets.nullable[index] {
                        sets.nullable[index] = true;
                        changed = true;
                    }
                }
            }
        }
        sets
    }

    pub fn is_nullable(&self, symbol: SymbolRef) -> bool {
        match symbol {
            SymbolRef::NonTerminal(index) => self.nullable[index],
            _ => false,
        }
    }

    /// FIRST of `steps` followed by `lookahead`.
    pub fn first_of(&self, grammar: &SyntaxGrammar, steps: &[ProductionStep], lookahead: &TokenSet) -> TokenSet {
        let mut result = TokenSet::new();
        if self.sequence_into(grammar, steps, &mut result) {
            result.union_with(lookahead);
        }
        result
    }

    /// Adds FIRST(`steps`) to `out`; returns whether `steps` is nullable.
    fn sequence_into(&self, grammar: &SyntaxGrammar, steps: &[ProductionStep], out: &mut TokenSet) -> bool {
        for step in steps {
            match step.symbol {
                SymbolRef::NonTerminal(index) => {
                    out.union_with(&self.first[index]);
                    if !self.nullable[index] {
                        return false;
                    }
                }
                terminal => {
                    out.insert(grammar.symbol_id(terminal) as SymbolId);
                    return false;
                }
            }
        }
        true
    }
}

/// Reject rules that derive themselves without consuming input
/// (`a -> b -> a` through unit or nullable steps). Ordinary left recursion
/// like `a -> a "+" b` is fine.
pub(crate) fn check_cycles(grammar: &SyntaxGrammar, sets: &FirstSets) -> Result<(), CompileError> {
    let count = grammar.variables.len();
    let mut edges = vec![Vec::new(); count];
    for (index, variable) in grammar.variables.iter().enumerate() {
        for production in &variable.productions {
            for (i, step) in production.steps.iter().enumerate() {
                let SymbolRef::NonTerminal(target) = step.symbol else {
                    continue;
                };
                let rest_nullable = production
                    .steps
                    .iter()
                    .enumerate()
                    .all(|(j, other)| j == i || sets.is_nullable(other.symbol));
                if rest_nullable && !edges[index].contains(&target) {
                    edges[index].push(target);
                }
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; count];
    for root in 0..count {
        if marks[root] != Mark::New {
            continue;
        }
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::Active;
        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            let Some(&target) = edges[node].get(*next) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            *next += 1;
            match marks[target] {
                Mark::Active => {
                    return Err(CompileError::LeftRecursionUnsupported {
                        rule: grammar.variables[target].name.clone(),
                    });
                }
                Mark::New => {
                    marks[target] = Mark::Active;
                    stack.push((target, 0));
                }
                Mark::Done => {}
            }
        }
    }
    Ok(())
}
