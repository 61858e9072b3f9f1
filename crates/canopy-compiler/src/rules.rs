//! Resolved rule representation used between compilation passes.
//!
//! Unlike the source model, symbol references here are indices, repetition
//! is always one-or-more, and every wrapper (`FIELD`, `ALIAS`, `TOKEN`,
//! `PREC*`) is folded into a single `Metadata` node.

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Rule {
    Blank,
    String(String),
    Pattern {
        value: String,
        flags: Option<String>,
    },
    Symbol(SymbolRef),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    /// One or more repetitions.
    Repeat(Box<Rule>),
    Metadata {
        params: MetadataParams,
        rule: Box<Rule>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum SymbolRef {
    NonTerminal(usize),
    Terminal(usize),
    External(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct MetadataParams {
    pub precedence: Prec,
    pub associativity: Option<Assoc>,
    pub dynamic_precedence: i32,
    pub is_token: bool,
    pub is_immediate: bool,
    pub field_name: Option<String>,
    pub alias: Option<Alias>,
}

impl MetadataParams {
    /// True when the params only carry precedence information.
    pub fn is_precedence_only(&self) -> bool {
        !self.is_token && !self.is_immediate && self.field_name.is_none() && self.alias.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) enum Prec {
    #[default]
    None,
    Integer(i32),
    Name(String),
}

impl Prec {
    pub fn is_none(&self) -> bool {
        matches!(self, Prec::None)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Assoc {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Alias {
    pub value: String,
    pub named: bool,
}

/// How a variable shows up in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum VariableKind {
    /// Visible, named (`number`).
    Named,
    /// Kept in storage, skipped by the node API (`_expression`).
    Hidden,
    /// Visible, unnamed (`"+"`).
    Anonymous,
    /// Generated by the compiler (repeat helpers, inline patterns).
    Auxiliary,
}

impl VariableKind {
    pub fn for_name(name: &str) -> Self {
        if name.starts_with('_') {
            VariableKind::Hidden
        } else {
            VariableKind::Named
        }
    }

    pub fn is_visible(self) -> bool {
        matches!(self, VariableKind::Named | VariableKind::Anonymous)
    }

    pub fn is_named(self) -> bool {
        matches!(self, VariableKind::Named | VariableKind::Hidden)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub rule: Rule,
}

impl Rule {
    pub fn metadata(params: MetadataParams, rule: Rule) -> Rule {
        Rule::Metadata {
            params,
            rule: Box::new(rule),
        }
    }

    /// `repeat(x)` in the source grammar: zero or more.
    pub fn repeat0(rule: Rule) -> Rule {
        Rule::Choice(vec![Rule::Repeat(Box::new(rule)), Rule::Blank])
    }

    /// Visit every symbol reference, allowing it to be rewritten.
    pub fn map_symbols(&mut self, f: &mut impl FnMut(SymbolRef) -> SymbolRef) {
        match self {
            Rule::Symbol(symbol) => *symbol = f(*symbol),
            Rule::Seq(members) | Rule::Choice(members) => {
                for member in members {
                    member.map_symbols(f);
                }
            }
            Rule::Repeat(rule) | Rule::Metadata { rule, .. } => rule.map_symbols(f),
            Rule::Blank | Rule::String(_) | Rule::Pattern { .. } => {}
        }
    }

    pub fn for_each_symbol(&self, f: &mut impl FnMut(SymbolRef)) {
        match self {
            Rule::Symbol(symbol) => f(*symbol),
            Rule::Seq(members) | Rule::Choice(members) => {
                for member in members {
                    member.for_each_symbol(f);
                }
            }
            Rule::Repeat(rule) | Rule::Metadata { rule, .. } => rule.for_each_symbol(f),
            Rule::Blank | Rule::String(_) | Rule::Pattern { .. } => {}
        }
    }

    /// A rule the lexer handles as a whole: a string, a pattern, or an
    /// explicit `token(...)`, optionally under precedence wrappers.
    pub fn is_token(&self) -> bool {
        match self {
            Rule::String(_) | Rule::Pattern { .. } => true,
            Rule::Metadata { params, rule } => {
                params.is_token || (params.is_precedence_only() && rule.is_token())
            }
            _ => false,
        }
    }
}
