//! LALR(1) automaton.
//!
//! States are LR(0) item-set cores. Lookaheads are found by the classic
//! spontaneous/propagated scheme: each kernel item is closed under a dummy
//! lookahead `#`; a concrete lookahead reaching a successor kernel item is
//! spontaneous, `#` reaching it means "whatever the source item has".

use std::collections::{BTreeMap, HashMap, VecDeque};

use canopy_core::{SymbolId, TokenSet};

use crate::first::FirstSets;
use crate::flatten::{ProductionStep, SyntaxGrammar};
use crate::rules::{Prec, SymbolRef};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Item {
    pub production: usize,
    pub dot: usize,
}

#[derive(Debug)]
pub(crate) struct LrProduction {
    /// `None` for the augmented start production.
    pub lhs: Option<usize>,
    pub steps: Vec<ProductionStep>,
    pub dynamic_precedence: i32,
}

#[derive(Debug)]
pub(crate) struct LrState {
    pub kernel: Vec<Item>,
    /// Closure of the kernel with LALR(1) lookaheads.
    pub items: Vec<(Item, TokenSet)>,
    /// Sorted by symbol id.
    pub transitions: Vec<(usize, usize)>,
}

impl LrState {
    pub fn transition(&self, symbol: usize) -> Option<usize> {
        self.transitions
            .binary_search_by_key(&symbol, |(s, _)| *s)
            .ok()
            .map(|i| self.transitions[i].1)
    }
}

#[derive(Debug)]
pub(crate) struct Automaton {
    /// Index 0 is the augmented production; table production `n` is index `n + 1`.
    pub productions: Vec<LrProduction>,
    pub states: Vec<LrState>,
}

impl Automaton {
    pub fn is_complete(&self, item: Item) -> bool {
        item.dot == self.productions[item.production].steps.len()
    }
}

pub(crate) fn build(grammar: &SyntaxGrammar, first: &FirstSets) -> Automaton {
    let mut builder = Builder::new(grammar, first);
    builder.build_cores();
    builder.compute_lookaheads();
    tracing::debug!(
        states = builder.states.len(),
        productions = builder.productions.len() - 1,
        "built LALR(1) automaton"
    );
    Automaton {
        productions: builder.productions,
        states: builder.states,
    }
}

struct Builder<'a> {
    grammar: &'a SyntaxGrammar,
    first: &'a FirstSets,
    productions: Vec<LrProduction>,
    by_lhs: Vec<Vec<usize>>,
    states: Vec<LrState>,
    /// Pseudo-terminal used during lookahead discovery.
    probe: SymbolId,
}

impl<'a> Builder<'a> {
    fn new(grammar: &'a SyntaxGrammar, first: &'a FirstSets) -> Self {
        let mut productions = vec![LrProduction {
            lhs: None,
            steps: vec![ProductionStep {
                symbol: SymbolRef::NonTerminal(0),
                precedence: Prec::None,
                associativity: None,
                field: None,
                alias: None,
            }],
            dynamic_precedence: 0,
        }];
        let mut by_lhs = vec![Vec::new(); grammar.variables.len()];
        for (index, variable) in grammar.variables.iter().enumerate() {
            for production in &variable.productions {
                by_lhs[index].push(productions.len());
                productions.push(LrProduction {
                    lhs: Some(index),
                    steps: production.steps.clone(),
                    dynamic_precedence: production.dynamic_precedence,
                });
            }
        }

        Self {
            grammar,
            first,
            productions,
            by_lhs,
            states: Vec::new(),
            probe: grammar.terminal_count() as SymbolId,
        }
    }

    fn next_symbol(&self, item: Item) -> Option<SymbolRef> {
        self.productions[item.production]
            .steps
            .get(item.dot)
            .map(|step| step.symbol)
    }

    fn closure(&self, kernel: &[Item]) -> Vec<Item> {
        let mut items = kernel.to_vec();
        let mut expanded = vec![false; self.grammar.variables.len()];
        let mut i = 0;
        while i < items.len() {
            if let Some(SymbolRef::NonTerminal(var)) = self.next_symbol(items[i])
                && !expanded[var]
            {
                expanded[var] = true;
                items.extend(self.by_lhs[var].iter().map(|&production| Item { production, dot: 0 }));
            }
            i += 1;
        }
        items
    }

    fn build_cores(&mut self) {
        let start = vec![Item {
            production: 0,
            dot: 0,
        }];
        let mut index: HashMap<Vec<Item>, usize> = HashMap::from([(start.clone(), 0)]);
        let mut kernels = vec![start];
        let mut transitions = Vec::new();

        let mut next = 0;
        while next < kernels.len() {
            let mut successors: BTreeMap<usize, Vec<Item>> = BTreeMap::new();
            for item in self.closure(&kernels[next]) {
                if let Some(symbol) = self.next_symbol(item) {
                    successors
                        .entry(self.grammar.symbol_id(symbol))
                        .or_default()
                        .push(Item {
                            production: item.production,
                            dot: item.dot + 1,
                        });
                }
            }

            let mut row = Vec::with_capacity(successors.len());
            for (symbol, mut kernel) in successors {
                kernel.sort_unstable();
                kernel.dedup();
                let target = match index.get(&kernel) {
                    Some(&target) => target,
                    None => {
                        let target = kernels.len();
                        index.insert(kernel.clone(), target);
                        kernels.push(kernel);
                        target
                    }
                };
                row.push((symbol, target));
            }
            transitions.push(row);
            next += 1;
        }

        self.states = kernels
            .into_iter()
            .zip(transitions)
            .map(|(kernel, transitions)| LrState {
                kernel,
                items: Vec::new(),
                transitions,
            })
            .collect();
    }

    /// LR(1) closure: lookaheads flow from `A -> a . B b, L` to every
    /// `B -> . g` as FIRST(b L).
    fn closure_with_lookaheads(&self, seed: Vec<(Item, TokenSet)>) -> Vec<(Item, TokenSet)> {
        let mut positions: HashMap<Item, usize> = HashMap::new();
        let mut items: Vec<(Item, TokenSet)> = Vec::with_capacity(seed.len());
        for (item, lookahead) in seed {
            match positions.get(&item) {
                Some(&i) => {
                    items[i].1.union_with(&lookahead);
                }
                None => {
                    positions.insert(item, items.len());
                    items.push((item, lookahead));
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..items.len()).collect();
        while let Some(i) = queue.pop_front() {
            let (item, lookahead) = &items[i];
            let Some(SymbolRef::NonTerminal(var)) = self.next_symbol(*item) else {
                continue;
            };
            let rest = &self.productions[item.production].steps[item.dot + 1..];
            let follow = self.first.first_of(self.grammar, rest, lookahead);

            for &production in &self.by_lhs[var] {
                let child = Item { production, dot: 0 };
                match positions.get(&child) {
                    Some(&j) => {
                        if items[j].1.union_with(&follow) {
                            queue.push_back(j);
                        }
                    }
                    None => {
                        positions.insert(child, items.len());
                        queue.push_back(items.len());
                        items.push((child, follow.clone()));
                    }
                }
            }
        }
        items
    }

    fn compute_lookaheads(&mut self) {
        let mut lookaheads: Vec<Vec<TokenSet>> = self
            .states
            .iter()
            .map(|state| vec![TokenSet::new(); state.kernel.len()])
            .collect();
        lookaheads[0][0].insert(canopy_core::END_SYMBOL);

        let mut propagate: Vec<((usize, usize), (usize, usize))> = Vec::new();
        let probe: TokenSet = [self.probe].into_iter().collect();

        for (state_id, state) in self.states.iter().enumerate() {
            for (k, &kernel_item) in state.kernel.iter().enumerate() {
                for (item, lookahead) in self.closure_with_lookaheads(vec![(kernel_item, probe.clone())]) {
                    let Some(symbol) = self.next_symbol(item) else {
                        continue;
                    };
                    let Some(target) = state.transition(self.grammar.symbol_id(symbol)) else {
                        continue;
                    };
                    let advanced = Item {
                        production: item.production,
                        dot: item.dot + 1,
                    };
                    let Ok(position) = self.states[target].kernel.binary_search(&advanced) else {
                        continue;
                    };
                    for terminal in lookahead.iter() {
                        if terminal == self.probe {
                            propagate.push(((state_id, k), (target, position)));
                        } else {
                            lookaheads[target][position].insert(terminal);
                        }
                    }
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for &((from_state, from_item), (to_state, to_item)) in &propagate {
                if (from_state, from_item) == (to_state, to_item) {
                    continue;
                }
                let source = lookaheads[from_state][from_item].clone();
                changed |= lookaheads[to_state][to_item].union_with(&source);
            }
        }

        for (state_id, lookaheads) in lookaheads.into_iter().enumerate() {
            let seed = self.states[state_id]
                .kernel
                .iter()
                .copied()
                .zip(lookaheads)
                .collect();
            self.states[state_id].items = self.closure_with_lookaheads(seed);
        }
    }
}
