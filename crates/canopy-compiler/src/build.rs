//! Assemble the runtime table from the compiled pieces.

use canopy_core::{FieldId, LexModeId, SymbolId, TokenSet};
use indexmap::IndexSet;

use crate::conflicts::StateRow;
use crate::error::CompileError;
use crate::flatten::SyntaxGrammar;
use crate::lr::Automaton;
use crate::rules::Variable;
use crate::table::{
    AliasInfo, ChildInfo, GrammarTable, LexMode, ParseState, Production, SymbolInfo, SymbolKind,
    TokenDef,
};

/// Ids must stay below `ERROR_SYMBOL`, which the runtime reserves.
pub(crate) fn check_limit(what: &'static str, count: usize) -> Result<(), CompileError> {
    if count >= u16::MAX as usize {
        return Err(CompileError::TooManySymbols { what, count });
    }
    Ok(())
}

pub(crate) fn build_table(
    name: &str,
    grammar: &SyntaxGrammar,
    tokens: Vec<TokenDef>,
    automaton: &Automaton,
    rows: Vec<StateRow>,
) -> Result<GrammarTable, CompileError> {
    let mut symbols = Vec::with_capacity(grammar.symbol_count());
    symbols.push(SymbolInfo {
        name: "end".into(),
        kind: SymbolKind::End,
        visible: false,
        named: false,
    });
    symbols.extend(grammar.lexical_variables.iter().map(|v| symbol_info(v, SymbolKind::Token)));
    symbols.extend(grammar.externals.iter().map(|v| symbol_info(v, SymbolKind::External)));
    symbols.extend(grammar.variables.iter().map(|v| SymbolInfo {
        name: v.name.clone(),
        kind: SymbolKind::NonTerminal,
        visible: v.kind.is_visible(),
        named: v.kind.is_named(),
    }));

    let mut fields: Vec<String> = automaton
        .productions
        .iter()
        .flat_map(|p| &p.steps)
        .filter_map(|step| step.field.clone())
        .collect();
    fields.sort();
    fields.dedup();
    check_limit("fields", fields.len())?;
    let field_id = |name: &str| {
        fields
            .binary_search_by(|f| f.as_str().cmp(name))
            .ok()
            .and_then(|i| FieldId::new(i as u16 + 1))
    };

    let productions = automaton.productions[1..]
        .iter()
        .map(|p| {
            let annotated = p.steps.iter().any(|s| s.field.is_some() || s.alias.is_some());
            let children = if annotated {
                p.steps
                    .iter()
                    .map(|step| ChildInfo {
                        field: step.field.as_deref().and_then(field_id),
                        alias: step.alias.as_ref().map(|alias| AliasInfo {
                            name: alias.value.clone(),
                            named: alias.named,
                        }),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            Production {
                lhs: grammar.non_terminal_id(p.lhs.unwrap_or(0)) as SymbolId,
                child_count: p.steps.len() as u16,
                dynamic_precedence: p.dynamic_precedence,
                children,
            }
        })
        .collect();

    let lexical_count = grammar.lexical_variables.len();
    let external_base = 1 + lexical_count;
    let mut lex_modes: IndexSet<LexMode> = IndexSet::new();
    let mut states = Vec::with_capacity(rows.len());
    for row in rows {
        let mut valid = TokenSet::with_capacity(external_base);
        let mut externals = Vec::new();
        for &(symbol, _) in &row.actions {
            let symbol = symbol as usize;
            if (1..external_base).contains(&symbol) {
                valid.insert(symbol as SymbolId);
            } else if (external_base..grammar.terminal_count()).contains(&symbol) {
                externals.push((symbol - external_base) as u16);
            }
        }
        let (lex_mode, _) = lex_modes.insert_full(LexMode {
            tokens: valid,
            externals,
        });
        states.push(ParseState {
            lex_mode: lex_mode as LexModeId,
            actions: row.actions,
            gotos: row.gotos,
        });
    }
    let (error_lex_mode, _) = lex_modes.insert_full(LexMode {
        tokens: (1..external_base).map(|id| id as SymbolId).collect(),
        externals: (0..grammar.externals.len()).map(|i| i as u16).collect(),
    });

    let extras = grammar
        .extras
        .iter()
        .map(|&symbol| grammar.symbol_id(symbol) as SymbolId)
        .collect();

    tracing::debug!(
        symbols = symbols.len(),
        states = states.len(),
        lex_modes = lex_modes.len(),
        "assembled grammar table"
    );

    Ok(GrammarTable {
        name: name.to_owned(),
        symbols,
        tokens,
        external_count: grammar.externals.len() as u16,
        fields,
        productions,
        states,
        lex_modes: lex_modes.into_iter().collect(),
        error_lex_mode: error_lex_mode as LexModeId,
        extras,
        start_symbol: grammar.non_terminal_id(0) as SymbolId,
    })
}

fn symbol_info(variable: &Variable, kind: SymbolKind) -> SymbolInfo {
    SymbolInfo {
        name: variable.name.clone(),
        kind,
        visible: variable.kind.is_visible(),
        named: variable.kind.is_named(),
    }
}
