//! Builder helpers mirroring the grammar DSL (`seq`, `choice`, `prec.left`, ...).
//!
//! ```
//! use canopy_core::{Grammar, Rule};
//!
//! let grammar = Grammar::new("sum")
//!     .rule(
//!         "expr",
//!         Rule::seq([
//!             Rule::symbol("number"),
//!             Rule::repeat(Rule::seq([Rule::string("+"), Rule::symbol("number")])),
//!         ]),
//!     )
//!     .rule("number", Rule::pattern(r"\d+"));
//!
//! assert_eq!(grammar.rules.len(), 2);
//! ```

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

impl Rule {
    pub fn blank() -> Self {
        Rule::Blank
    }

    pub fn string(value: impl Into<String>) -> Self {
        Rule::String(value.into())
    }

    pub fn pattern(value: impl Into<String>) -> Self {
        Rule::Pattern {
            value: value.into(),
            flags: None,
        }
    }

    pub fn pattern_with_flags(value: impl Into<String>, flags: impl Into<String>) -> Self {
        Rule::Pattern {
            value: value.into(),
            flags: Some(flags.into()),
        }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Rule::Symbol(name.into())
    }

    pub fn seq(members: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Seq(members.into_iter().collect())
    }

    pub fn choice(members: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Choice(members.into_iter().collect())
    }

    /// `choice(rule, blank)`, as the DSL's `optional` expands.
    pub fn optional(rule: Rule) -> Self {
        Rule::Choice(vec![rule, Rule::Blank])
    }

    pub fn repeat(rule: Rule) -> Self {
        Rule::Repeat(Box::new(rule))
    }

    pub fn repeat1(rule: Rule) -> Self {
        Rule::Repeat1(Box::new(rule))
    }

    pub fn field(name: impl Into<String>, rule: Rule) -> Self {
        Rule::Field {
            name: name.into(),
            content: Box::new(rule),
        }
    }

    pub fn alias(rule: Rule, value: impl Into<String>, named: bool) -> Self {
        Rule::Alias {
            content: Box::new(rule),
            value: value.into(),
            named,
        }
    }

    pub fn token(rule: Rule) -> Self {
        Rule::Token(Box::new(rule))
    }

    pub fn immediate_token(rule: Rule) -> Self {
        Rule::ImmediateToken(Box::new(rule))
    }

    pub fn prec(value: impl Into<Precedence>, rule: Rule) -> Self {
        Rule::Prec {
            value: value.into(),
            content: Box::new(rule),
        }
    }

    pub fn prec_left(value: impl Into<Precedence>, rule: Rule) -> Self {
        Rule::PrecLeft {
            value: value.into(),
            content: Box::new(rule),
        }
    }

    pub fn prec_right(value: impl Into<Precedence>, rule: Rule) -> Self {
        Rule::PrecRight {
            value: value.into(),
            content: Box::new(rule),
        }
    }

    pub fn prec_dynamic(value: i32, rule: Rule) -> Self {
        Rule::PrecDynamic {
            value,
            content: Box::new(rule),
        }
    }
}

impl Grammar {
    /// Empty grammar with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            extras: Vec::new(),
            precedences: Vec::new(),
            conflicts: Vec::new(),
            externals: Vec::new(),
            inline: Vec::new(),
            supertypes: Vec::new(),
            word: None,
            reserved: Vec::new(),
            inherits: None,
        }
    }

    /// Append a rule. The first rule added is the start rule.
    pub fn rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    pub fn extra(mut self, rule: Rule) -> Self {
        self.extras.push(rule);
        self
    }

    pub fn external(mut self, rule: Rule) -> Self {
        self.externals.push(rule);
        self
    }

    pub fn inline(mut self, name: impl Into<String>) -> Self {
        self.inline.push(name.into());
        self
    }

    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    pub fn conflict<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.conflicts
            .push(names.into_iter().map(Into::into).collect());
        self
    }

    /// Append an ordering of named precedence levels, highest first.
    pub fn precedence<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.precedences.push(
            names
                .into_iter()
                .map(|name| PrecedenceEntry::Name(name.into()))
                .collect(),
        );
        self
    }

    /// Look up a rule by name.
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|(rule_name, _)| rule_name == name)
            .map(|(_, rule)| rule)
    }
}
