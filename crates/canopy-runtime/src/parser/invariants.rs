//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use canopy_compiler::Production;
use canopy_core::{ProductionId, StateId, SymbolId};

use super::driver::ParseRun;

impl<'a> ParseRun<'a> {
    pub(super) fn ensure_production(&self, production: ProductionId) -> &'a Production {
        self.table
            .productions
            .get(production as usize)
            .unwrap_or_else(|| {
                panic!(
                    "parse table reduces by production {production}, which does not exist \
                     (table is corrupt)"
                )
            })
    }

    pub(super) fn ensure_goto(&self, state: StateId, symbol: SymbolId) -> StateId {
        self.table.goto(state, symbol).unwrap_or_else(|| {
            panic!(
                "parse table has no goto from state {state} on `{}` \
                 (reduction reached a state the automaton never built)",
                self.table.symbol_name(symbol)
            )
        })
    }

    pub(super) fn invariant_violated(&self, what: &str) -> ! {
        panic!("broken parser invariant: {what}")
    }
}
