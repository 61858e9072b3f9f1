//! Split the grammar into lexical and syntactic halves.
//!
//! Rules whose whole body is a token become named terminals. String and
//! pattern leaves used inside other rules become anonymous terminals,
//! deduplicated by content so `"+"` used twice is a single symbol.

use std::collections::HashMap;

use canopy_core::PrecedenceEntry;

use crate::error::CompileError;
use crate::intern::InternedGrammar;
use crate::rules::{Rule, SymbolRef, Variable, VariableKind};

#[derive(Debug)]
pub(crate) struct ExtractedGrammar {
    pub syntax_variables: Vec<Variable>,
    pub lexical_variables: Vec<Variable>,
    /// Always `Terminal` or `External`.
    pub extras: Vec<SymbolRef>,
    pub externals: Vec<Variable>,
    pub expected_conflicts: Vec<Vec<SymbolRef>>,
    pub precedence_orderings: Vec<Vec<PrecedenceEntry>>,
}

pub(crate) fn extract_tokens(grammar: InternedGrammar) -> Result<ExtractedGrammar, CompileError> {
    let mut extractor = TokenExtractor::default();
    let mut remap = Vec::with_capacity(grammar.variables.len());
    let mut syntax_variables = Vec::new();

    for (index, variable) in grammar.variables.into_iter().enumerate() {
        if index > 0 && variable.rule.is_token() {
            ensure_no_symbols(&variable.rule, &variable.name)?;
            let id = extractor.lexical.len();
            extractor.seen.entry(variable.rule.clone()).or_insert(id);
            extractor.lexical.push(variable);
            remap.push(SymbolRef::Terminal(id));
        } else {
            remap.push(SymbolRef::NonTerminal(syntax_variables.len()));
            syntax_variables.push(variable);
        }
    }

    let relocate = |symbol: SymbolRef| match symbol {
        SymbolRef::NonTerminal(index) => remap[index],
        other => other,
    };

    for variable in &mut syntax_variables {
        let mut rule = std::mem::replace(&mut variable.rule, Rule::Blank);
        rule.map_symbols(&mut |symbol| relocate(symbol));
        let mut counter = 0;
        variable.rule = extractor.extract(rule, &variable.name, &mut counter)?;
    }

    let mut extras = Vec::with_capacity(grammar.extras.len());
    let mut extra_counter = 0;
    for rule in grammar.extras {
        let symbol = match rule {
            Rule::Symbol(symbol) => relocate(symbol),
            rule if is_token_leaf(&rule) || rule.is_token() => {
                match extractor.extract(rule, "extra", &mut extra_counter)? {
                    Rule::Symbol(symbol) => symbol,
                    // Precedence around an extra is meaningless for the parser.
                    Rule::Metadata { rule, .. } => match *rule {
                        Rule::Symbol(symbol) => symbol,
                        other => return Err(non_terminal_extra(&other)),
                    },
                    other => return Err(non_terminal_extra(&other)),
                }
            }
            other => return Err(non_terminal_extra(&other)),
        };
        if let SymbolRef::NonTerminal(index) = symbol {
            return Err(CompileError::NonTerminalExtra {
                name: syntax_variables[index].name.clone(),
            });
        }
        if !extras.contains(&symbol) {
            extras.push(symbol);
        }
    }

    let expected_conflicts = grammar
        .expected_conflicts
        .into_iter()
        .map(|symbols| {
            symbols
                .into_iter()
                .map(relocate)
                .filter(|symbol| matches!(symbol, SymbolRef::NonTerminal(_)))
                .collect::<Vec<_>>()
        })
        .filter(|symbols| !symbols.is_empty())
        .collect();

    Ok(ExtractedGrammar {
        syntax_variables,
        lexical_variables: extractor.lexical,
        extras,
        externals: grammar.externals,
        expected_conflicts,
        precedence_orderings: grammar.precedence_orderings,
    })
}

#[derive(Default)]
struct TokenExtractor {
    lexical: Vec<Variable>,
    seen: HashMap<Rule, usize>,
}

impl TokenExtractor {
    fn extract(&mut self, rule: Rule, owner: &str, counter: &mut usize) -> Result<Rule, CompileError> {
        if is_token_leaf(&rule) {
            ensure_no_symbols(&rule, owner)?;
            return Ok(Rule::Symbol(SymbolRef::Terminal(self.intern(rule, owner, counter))));
        }

        Ok(match rule {
            Rule::Seq(members) => Rule::Seq(self.extract_all(members, owner, counter)?),
            Rule::Choice(members) => Rule::Choice(self.extract_all(members, owner, counter)?),
            Rule::Repeat(content) => Rule::Repeat(Box::new(self.extract(*content, owner, counter)?)),
            Rule::Metadata { params, rule } => {
                Rule::metadata(params, self.extract(*rule, owner, counter)?)
            }
            other => other,
        })
    }

    fn extract_all(
        &mut self,
        members: Vec<Rule>,
        owner: &str,
        counter: &mut usize,
    ) -> Result<Vec<Rule>, CompileError> {
        members
            .into_iter()
            .map(|member| self.extract(member, owner, counter))
            .collect()
    }

    fn intern(&mut self, rule: Rule, owner: &str, counter: &mut usize) -> usize {
        if let Some(&id) = self.seen.get(&rule) {
            return id;
        }

        let (name, kind) = match &rule {
            Rule::String(value) => (value.clone(), VariableKind::Anonymous),
            _ => {
                *counter += 1;
                (format!("{owner}_token{counter}"), VariableKind::Auxiliary)
            }
        };
        let id = self.lexical.len();
        self.seen.insert(rule.clone(), id);
        self.lexical.push(Variable { name, kind, rule });
        id
    }
}

fn is_token_leaf(rule: &Rule) -> bool {
    match rule {
        Rule::String(_) | Rule::Pattern { .. } => true,
        Rule::Metadata { params, .. } => params.is_token,
        _ => false,
    }
}

fn ensure_no_symbols(rule: &Rule, owner: &str) -> Result<(), CompileError> {
    let mut found = false;
    rule.for_each_symbol(&mut |_| found = true);
    if found {
        return Err(CompileError::SymbolInToken {
            rule: owner.to_owned(),
        });
    }
    Ok(())
}

fn non_terminal_extra(rule: &Rule) -> CompileError {
    CompileError::NonTerminalExtra {
        name: format!("{rule:?}"),
    }
}
