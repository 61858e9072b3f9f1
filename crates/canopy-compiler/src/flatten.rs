//! Turn rule trees into flat productions.
//!
//! Repetitions become hidden left-recursive helper variables, aliased
//! sequences become helper variables named by the alias, and every
//! remaining choice is expanded into separate productions.

use std::collections::HashMap;

use canopy_core::PrecedenceEntry;

use crate::extract::ExtractedGrammar;
use crate::rules::{Alias, Assoc, MetadataParams, Prec, Rule, SymbolRef, Variable, VariableKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ProductionStep {
    pub symbol: SymbolRef,
    pub precedence: Prec,
    pub associativity: Option<Assoc>,
    pub field: Option<String>,
    pub alias: Option<Alias>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct Production {
    pub steps: Vec<ProductionStep>,
    pub dynamic_precedence: i32,
}

#[derive(Clone, Debug)]
pub(crate) struct SyntaxVariable {
    pub name: String,
    pub kind: VariableKind,
    pub productions: Vec<Production>,
}

#[derive(Debug)]
pub(crate) struct SyntaxGrammar {
    pub variables: Vec<SyntaxVariable>,
    pub lexical_variables: Vec<Variable>,
    pub extras: Vec<SymbolRef>,
    pub externals: Vec<Variable>,
    pub expected_conflicts: Vec<Vec<SymbolRef>>,
    pub precedence_orderings: Vec<Vec<PrecedenceEntry>>,
}

/// Dense symbol numbering used from here on: `end`, lexical tokens,
/// externals, then non-terminals.
impl SyntaxGrammar {
    pub fn terminal_count(&self) -> usize {
        1 + self.lexical_variables.len() + self.externals.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.terminal_count() + self.variables.len()
    }

    pub fn symbol_id(&self, symbol: SymbolRef) -> usize {
        match symbol {
            SymbolRef::Terminal(index) => 1 + index,
            SymbolRef::External(index) => 1 + self.lexical_variables.len() + index,
            SymbolRef::NonTerminal(index) => self.terminal_count() + index,
        }
    }

    pub fn non_terminal_id(&self, index: usize) -> usize {
        self.terminal_count() + index
    }

    /// Inverse of `non_terminal_id` for non-terminal ids.
    pub fn non_terminal_index(&self, id: usize) -> Option<usize> {
        id.checked_sub(self.terminal_count())
            .filter(|index| *index < self.variables.len())
    }
}

pub(crate) fn flatten(grammar: ExtractedGrammar) -> SyntaxGrammar {
    let mut helpers = HelperVariables {
        base: grammar.syntax_variables.len(),
        variables: Vec::new(),
        repeats: HashMap::new(),
        aliases: HashMap::new(),
    };

    let mut variables: Vec<Variable> = grammar.syntax_variables;
    for variable in &mut variables {
        let rule = std::mem::replace(&mut variable.rule, Rule::Blank);
        let mut counter = 0;
        variable.rule = helpers.expand(rule, &variable.name, &mut counter);
    }
    variables.extend(helpers.variables);

    let variables = variables
        .into_iter()
        .map(|variable| SyntaxVariable {
            productions: flatten_rule(&variable.rule),
            name: variable.name,
            kind: variable.kind,
        })
        .collect();

    SyntaxGrammar {
        variables,
        lexical_variables: grammar.lexical_variables,
        extras: grammar.extras,
        externals: grammar.externals,
        expected_conflicts: grammar.expected_conflicts,
        precedence_orderings: grammar.precedence_orderings,
    }
}

struct HelperVariables {
    base: usize,
    variables: Vec<Variable>,
    repeats: HashMap<Rule, usize>,
    aliases: HashMap<(Rule, Alias), usize>,
}

impl HelperVariables {
    fn expand(&mut self, rule: Rule, owner: &str, counter: &mut usize) -> Rule {
        match rule {
            Rule::Seq(members) => Rule::Seq(self.expand_all(members, owner, counter)),
            Rule::Choice(members) => Rule::Choice(self.expand_all(members, owner, counter)),
            Rule::Repeat(content) => {
                let content = self.expand(*content, owner, counter);
                if let Some(&index) = self.repeats.get(&content) {
                    return Rule::Symbol(SymbolRef::NonTerminal(index));
                }
                *counter += 1;
                let index = self.base + self.variables.len();
                let symbol = Rule::Symbol(SymbolRef::NonTerminal(index));
                self.repeats.insert(content.clone(), index);
                self.variables.push(Variable {
                    name: format!("{owner}_repeat{counter}"),
                    kind: VariableKind::Auxiliary,
                    rule: Rule::Choice(vec![Rule::Seq(vec![symbol.clone(), content.clone()]), content]),
                });
                symbol
            }
            Rule::Metadata { params, rule } => {
                let rule = self.expand(*rule, owner, counter);
                match (&params.alias, &rule) {
                    (Some(alias), inner) if !matches!(inner, Rule::Symbol(_)) => {
                        let index = self.alias_helper(alias.clone(), inner.clone());
                        Rule::metadata(params, Rule::Symbol(SymbolRef::NonTerminal(index)))
                    }
                    _ => Rule::metadata(params, rule),
                }
            }
            other => other,
        }
    }

    fn expand_all(&mut self, members: Vec<Rule>, owner: &str, counter: &mut usize) -> Vec<Rule> {
        members
            .into_iter()
            .map(|member| self.expand(member, owner, counter))
            .collect()
    }

    fn alias_helper(&mut self, alias: Alias, rule: Rule) -> usize {
        let key = (rule, alias);
        if let Some(&index) = self.aliases.get(&key) {
            return index;
        }
        let index = self.base + self.variables.len();
        let (rule, alias) = key.clone();
        self.variables.push(Variable {
            name: alias.value,
            kind: VariableKind::Auxiliary,
            rule,
        });
        self.aliases.insert(key, index);
        index
    }
}

#[derive(Clone, Default)]
struct StepContext {
    precedence: Prec,
    associativity: Option<Assoc>,
    field: Option<String>,
    alias: Option<Alias>,
}

impl StepContext {
    fn enter(&self, params: &MetadataParams) -> StepContext {
        let mut next = self.clone();
        if !params.precedence.is_none() {
            next.precedence = params.precedence.clone();
            next.associativity = params.associativity;
        } else if params.associativity.is_some() {
            next.associativity = params.associativity;
        }
        if let Some(field) = &params.field_name {
            next.field = Some(field.clone());
        }
        if let Some(alias) = &params.alias {
            next.alias = Some(alias.clone());
        }
        next
    }
}

fn flatten_rule(rule: &Rule) -> Vec<Production> {
    let mut productions = Vec::new();
    for production in expand(rule, &StepContext::default(), true) {
        if !productions.contains(&production) {
            productions.push(production);
        }
    }
    productions
}

fn expand(rule: &Rule, context: &StepContext, at_end: bool) -> Vec<Production> {
    match rule {
        Rule::Symbol(symbol) => vec![Production {
            steps: vec![ProductionStep {
                symbol: *symbol,
                precedence: context.precedence.clone(),
                associativity: context.associativity,
                field: context.field.clone(),
                alias: context.alias.clone(),
            }],
            dynamic_precedence: 0,
        }],
        Rule::Seq(members) => {
            let mut result = vec![Production::default()];
            let last = members.len().saturating_sub(1);
            for (i, member) in members.iter().enumerate() {
                let tails = expand(member, context, at_end && i == last);
                let mut next = Vec::with_capacity(result.len() * tails.len());
                for head in &result {
                    for tail in &tails {
                        let mut steps = head.steps.clone();
                        steps.extend(tail.steps.iter().cloned());
                        next.push(Production {
                            steps,
                            dynamic_precedence: stronger(head.dynamic_precedence, tail.dynamic_precedence),
                        });
                    }
                }
                result = next;
            }
            result
        }
        Rule::Choice(members) => members
            .iter()
            .flat_map(|member| expand(member, context, at_end))
            .collect(),
        Rule::Metadata { params, rule } => {
            let inner = context.enter(params);
            let mut productions = expand(rule, &inner, at_end);
            let scoped = !params.precedence.is_none() || params.associativity.is_some();
            for production in &mut productions {
                // Precedence is scoped: once the last inner step is consumed,
                // shifting past it falls back to the enclosing precedence.
                if scoped
                    && !at_end
                    && let Some(step) = production.steps.last_mut()
                {
                    step.precedence = context.precedence.clone();
                    step.associativity = context.associativity;
                }
                production.dynamic_precedence =
                    stronger(production.dynamic_precedence, params.dynamic_precedence);
            }
            productions
        }
        // Repetitions were lowered to helpers and leaves to terminals.
        Rule::Repeat(content) => expand(content, context, at_end),
        Rule::Blank | Rule::String(_) | Rule::Pattern { .. } => vec![Production::default()],
    }
}

fn stronger(a: i32, b: i32) -> i32 {
    if b.abs() > a.abs() { b } else { a }
}
