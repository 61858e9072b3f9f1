//! Symbol resolution: names become indices, inline rules are substituted.
//!
//! Every `SYMBOL` reference in rules, extras, conflicts and precedence lists
//! must resolve to a rule or an external token, otherwise compilation stops
//! with `UndefinedSymbol`.

use std::collections::{HashMap, HashSet, VecDeque};

use canopy_core::{Grammar, Precedence, PrecedenceEntry, Rule as SourceRule};

use crate::error::{CompileError, Warning, Warnings};
use crate::rules::{Alias, Assoc, MetadataParams, Prec, Rule, SymbolRef, Variable, VariableKind};

#[derive(Debug)]
pub(crate) struct InternedGrammar {
    pub variables: Vec<Variable>,
    pub extras: Vec<Rule>,
    pub externals: Vec<Variable>,
    pub expected_conflicts: Vec<Vec<SymbolRef>>,
    pub precedence_orderings: Vec<Vec<PrecedenceEntry>>,
}

pub(crate) fn intern(
    grammar: &Grammar,
    warnings: &mut Warnings,
) -> Result<InternedGrammar, CompileError> {
    if grammar.rules.is_empty() {
        return Err(CompileError::EmptyGrammar(grammar.name.clone()));
    }

    let resolver = Resolver::new(grammar)?;

    let mut variables = Vec::with_capacity(grammar.rules.len());
    for (name, rule) in &grammar.rules {
        let kind = if grammar.supertypes.contains(name) {
            VariableKind::Hidden
        } else {
            VariableKind::for_name(name)
        };
        variables.push(Variable {
            name: name.clone(),
            kind,
            rule: resolver.resolve(rule, &format!("rule `{name}`"))?,
        });
    }

    let mut extras = grammar
        .extras
        .iter()
        .map(|rule| resolver.resolve(rule, "extras"))
        .collect::<Result<Vec<_>, _>>()?;

    let mut expected_conflicts = Vec::with_capacity(grammar.conflicts.len());
    for names in &grammar.conflicts {
        let symbols = names
            .iter()
            .map(|name| resolver.lookup(name, "conflicts"))
            .collect::<Result<Vec<_>, _>>()?;
        expected_conflicts.push(symbols);
    }

    for ordering in &grammar.precedences {
        for entry in ordering {
            if let PrecedenceEntry::Symbol(name) = entry {
                resolver.lookup(name, "precedences")?;
            }
        }
    }
    for name in &grammar.supertypes {
        resolver.lookup(name, "supertypes")?;
    }
    if let Some(word) = &grammar.word {
        resolver.lookup(word, "word")?;
    }

    let mut inline = Vec::new();
    for name in &grammar.inline {
        match resolver.lookup(name, "inline")? {
            // The start rule always produces the root node.
            SymbolRef::NonTerminal(0) => {}
            SymbolRef::NonTerminal(index) => inline.push(index),
            _ => {}
        }
    }

    let variables = expand_inline(variables, &mut extras, &mut expected_conflicts, &inline)?;
    report_unreachable(&variables, &extras, warnings);

    Ok(InternedGrammar {
        variables,
        extras,
        externals: resolver.externals,
        expected_conflicts,
        precedence_orderings: grammar.precedences.clone(),
    })
}

struct Resolver {
    rules: HashMap<String, usize>,
    external_names: HashMap<String, usize>,
    externals: Vec<Variable>,
}

impl Resolver {
    fn new(grammar: &Grammar) -> Result<Self, CompileError> {
        let mut rules = HashMap::with_capacity(grammar.rules.len());
        for (index, (name, _)) in grammar.rules.iter().enumerate() {
            rules.entry(name.clone()).or_insert(index);
        }

        let mut external_names = HashMap::new();
        let mut externals = Vec::with_capacity(grammar.externals.len());
        for rule in &grammar.externals {
            let (name, kind) = match rule {
                SourceRule::Symbol(name) => (name.clone(), VariableKind::for_name(name)),
                SourceRule::String(value) => (value.clone(), VariableKind::Anonymous),
                other => {
                    return Err(CompileError::UndefinedSymbol {
                        name: format!("{other:?}"),
                        context: "externals".into(),
                    });
                }
            };
            external_names.insert(name.clone(), externals.len());
            externals.push(Variable {
                name,
                kind,
                rule: Rule::Blank,
            });
        }

        Ok(Self {
            rules,
            external_names,
            externals,
        })
    }

    /// Externals shadow rules of the same name.
    fn lookup(&self, name: &str, context: &str) -> Result<SymbolRef, CompileError> {
        if let Some(&index) = self.external_names.get(name) {
            return Ok(SymbolRef::External(index));
        }
        if let Some(&index) = self.rules.get(name) {
            return Ok(SymbolRef::NonTerminal(index));
        }
        Err(CompileError::UndefinedSymbol {
            name: name.to_owned(),
            context: context.to_owned(),
        })
    }

    fn resolve(&self, rule: &SourceRule, context: &str) -> Result<Rule, CompileError> {
        let wrap = |params: MetadataParams, content: &SourceRule| -> Result<Rule, CompileError> {
            Ok(Rule::metadata(params, self.resolve(content, context)?))
        };

        Ok(match rule {
            SourceRule::Blank => Rule::Blank,
            SourceRule::String(value) => Rule::String(value.clone()),
            SourceRule::Pattern { value, flags } => Rule::Pattern {
                value: value.clone(),
                flags: flags.clone(),
            },
            SourceRule::Symbol(name) => Rule::Symbol(self.lookup(name, context)?),
            SourceRule::Seq(members) => Rule::Seq(self.resolve_all(members, context)?),
            SourceRule::Choice(members) => Rule::Choice(self.resolve_all(members, context)?),
            SourceRule::Repeat(content) => Rule::repeat0(self.resolve(content, context)?),
            SourceRule::Repeat1(content) => Rule::Repeat(Box::new(self.resolve(content, context)?)),
            SourceRule::Field { name, content } => wrap(
                MetadataParams {
                    field_name: Some(name.clone()),
                    ..Default::default()
                },
                content,
            )?,
            SourceRule::Alias {
                content,
                value,
                named,
            } => wrap(
                MetadataParams {
                    alias: Some(Alias {
                        value: value.clone(),
                        named: *named,
                    }),
                    ..Default::default()
                },
                content,
            )?,
            SourceRule::Token(content) => wrap(
                MetadataParams {
                    is_token: true,
                    ..Default::default()
                },
                content,
            )?,
            SourceRule::ImmediateToken(content) => wrap(
                MetadataParams {
                    is_token: true,
                    is_immediate: true,
                    ..Default::default()
                },
                content,
            )?,
            SourceRule::Prec { value, content } => {
                wrap(precedence_params(value, None), content)?
            }
            SourceRule::PrecLeft { value, content } => {
                wrap(precedence_params(value, Some(Assoc::Left)), content)?
            }
            SourceRule::PrecRight { value, content } => {
                wrap(precedence_params(value, Some(Assoc::Right)), content)?
            }
            SourceRule::PrecDynamic { value, content } => wrap(
                MetadataParams {
                    dynamic_precedence: *value,
                    ..Default::default()
                },
                content,
            )?,
            // Reserved-word contexts only restrict keyword extraction.
            SourceRule::Reserved { content, .. } => self.resolve(content, context)?,
        })
    }

    fn resolve_all(&self, members: &[SourceRule], context: &str) -> Result<Vec<Rule>, CompileError> {
        members
            .iter()
            .map(|member| self.resolve(member, context))
            .collect()
    }
}

fn precedence_params(value: &Precedence, associativity: Option<Assoc>) -> MetadataParams {
    MetadataParams {
        precedence: match value {
            Precedence::Integer(n) => Prec::Integer(*n),
            Precedence::Name(name) => Prec::Name(name.clone()),
        },
        associativity,
        ..Default::default()
    }
}

/// Substitute inline rules at their use sites and drop them from the list.
fn expand_inline(
    variables: Vec<Variable>,
    extras: &mut [Rule],
    expected_conflicts: &mut Vec<Vec<SymbolRef>>,
    inline: &[usize],
) -> Result<Vec<Variable>, CompileError> {
    if inline.is_empty() {
        return Ok(variables);
    }

    let inline: HashSet<usize> = inline.iter().copied().collect();
    let mut expander = InlineExpander {
        variables: &variables,
        inline: &inline,
        expanded: HashMap::new(),
        visiting: HashSet::new(),
    };

    let mut kept = Vec::with_capacity(variables.len() - inline.len());
    let mut remap = vec![None; variables.len()];
    for (index, variable) in variables.iter().enumerate() {
        if inline.contains(&index) {
            continue;
        }
        remap[index] = Some(kept.len());
        kept.push(Variable {
            name: variable.name.clone(),
            kind: variable.kind,
            rule: expander.substitute(&variable.rule)?,
        });
    }
    for extra in extras.iter_mut() {
        *extra = expander.substitute(extra)?;
    }

    let mut relocate = |symbol: SymbolRef| match symbol {
        SymbolRef::NonTerminal(index) => SymbolRef::NonTerminal(remap[index].unwrap_or(index)),
        other => other,
    };
    for variable in &mut kept {
        variable.rule.map_symbols(&mut relocate);
    }
    for extra in extras.iter_mut() {
        extra.map_symbols(&mut relocate);
    }

    expected_conflicts.retain_mut(|symbols| {
        symbols.retain(|symbol| !matches!(symbol, SymbolRef::NonTerminal(i) if inline.contains(i)));
        for symbol in symbols.iter_mut() {
            *symbol = relocate(*symbol);
        }
        !symbols.is_empty()
    });

    Ok(kept)
}

struct InlineExpander<'a> {
    variables: &'a [Variable],
    inline: &'a HashSet<usize>,
    expanded: HashMap<usize, Rule>,
    visiting: HashSet<usize>,
}

impl InlineExpander<'_> {
    fn substitute(&mut self, rule: &Rule) -> Result<Rule, CompileError> {
        Ok(match rule {
            Rule::Symbol(SymbolRef::NonTerminal(index)) if self.inline.contains(index) => {
                self.expand(*index)?
            }
            Rule::Seq(members) => Rule::Seq(self.substitute_all(members)?),
            Rule::Choice(members) => Rule::Choice(self.substitute_all(members)?),
            Rule::Repeat(content) => Rule::Repeat(Box::new(self.substitute(content)?)),
            Rule::Metadata { params, rule } => {
                Rule::metadata(params.clone(), self.substitute(rule)?)
            }
            other => other.clone(),
        })
    }

    fn substitute_all(&mut self, members: &[Rule]) -> Result<Vec<Rule>, CompileError> {
        members.iter().map(|member| self.substitute(member)).collect()
    }

    fn expand(&mut self, index: usize) -> Result<Rule, CompileError> {
        if let Some(rule) = self.expanded.get(&index) {
            return Ok(rule.clone());
        }
        if !self.visiting.insert(index) {
            return Err(CompileError::InlineCycle {
                rule: self.variables[index].name.clone(),
            });
        }
        let rule = self.substitute(&self.variables[index].rule)?;
        self.visiting.remove(&index);
        self.expanded.insert(index, rule.clone());
        Ok(rule)
    }
}

fn report_unreachable(variables: &[Variable], extras: &[Rule], warnings: &mut Warnings) {
    let mut reached = vec![false; variables.len()];
    let mut queue = VecDeque::from([0]);
    reached[0] = true;

    let mut visit = |symbol: SymbolRef, queue: &mut VecDeque<usize>| {
        if let SymbolRef::NonTerminal(index) = symbol
            && !reached[index]
        {
            reached[index] = true;
            queue.push_back(index);
        }
    };

    for extra in extras {
        extra.for_each_symbol(&mut |symbol| visit(symbol, &mut queue));
    }
    while let Some(index) = queue.pop_front() {
        variables[index]
            .rule
            .for_each_symbol(&mut |symbol| visit(symbol, &mut queue));
    }

    for (variable, reached) in variables.iter().zip(&reached) {
        if !reached {
            warnings.push(Warning::UnreachableRule {
                rule: variable.name.clone(),
            });
        }
    }
}
